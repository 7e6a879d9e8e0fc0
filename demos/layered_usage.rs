// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered resolution example.
//!
//! This example demonstrates:
//! - Building a vendor and an administrator tier with a drop-in fragment
//! - Resolving the merged configuration
//! - Inspecting the unmerged history with per-file provenance
//! - Typed access with default values
//!
//! To run this example:
//! ```bash
//! RUST_LOG=tiercfg=debug cargo run --example layered_usage
//! ```

use std::fs;
use tiercfg::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== tiercfg: Layered Usage ===\n");

    let root = tempfile::tempdir()?;
    let vendor = root.path().join("usr/etc");
    let admin = root.path().join("etc");
    fs::create_dir_all(vendor.join("example.conf.d"))?;
    fs::create_dir_all(&admin)?;

    fs::write(
        vendor.join("example.conf"),
        "[Server]\nport = 8080\nworkers = 4\n\n[Log]\nlevel = info\n",
    )?;
    fs::write(
        vendor.join("example.conf.d/50-tls.conf"),
        "[Server]\ntls = yes\n",
    )?;
    fs::write(admin.join("example.conf"), "[Server]\nport = 0x1F91\n")?;

    let resolver = DirectoryResolver::builder("example")
        .with_layers(LayerList::new().with_layer(vendor.as_path()).with_layer(admin.as_path()))
        .build()?;

    println!("--- Candidates, lowest precedence first ---");
    for candidate in resolver.candidates()? {
        println!("  {:?} {}", candidate.kind, candidate.path.display());
    }

    println!("\n--- Merged ---");
    let config = resolver.resolve()?;
    print!("{}", config);

    println!("\n--- Typed access ---");
    println!("port    = {}", config.get_uint(Some("Server"), "port")?);
    println!("workers = {}", config.get_int(Some("Server"), "workers")?);
    println!("tls     = {}", config.get_bool(Some("Server"), "tls")?);
    println!(
        "backlog = {} (default)",
        config.get_int_or(Some("Server"), "backlog", 128)?
    );

    println!("\n--- History ---");
    for file in resolver.resolve_history()? {
        let path = file.path().map(|p| p.display().to_string()).unwrap_or_default();
        println!("{}: {} key(s)", path, file.len());
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
