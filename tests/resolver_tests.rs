// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for directory layering and drop-in resolution.

mod common;

use common::TierTree;
use std::path::Path;
use tiercfg::prelude::*;
use tiercfg::service::CandidateKind;

fn resolver(tree: &TierTree) -> tiercfg::service::ResolverBuilder {
    DirectoryResolver::builder("example")
        .with_layers(tree.layers())
        .with_dropin_variants([".conf.d"])
}

#[test]
fn test_two_tier_merge() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "example.conf", "[Group]\nBla = 1\n");
    tree.write("etc", "example.conf", "[Group]\nBla = 2\nExtra = 3\n");

    let config = resolver(&tree).build().unwrap().resolve().unwrap();

    assert_eq!(config.get_int(Some("Group"), "Bla").unwrap(), 2);
    assert_eq!(config.get_int(Some("Group"), "Extra").unwrap(), 3);
    assert_eq!(config.keys(Some("Group")).unwrap(), vec!["Bla", "Extra"]);
    assert!(config.path().is_none());
}

#[test]
fn test_two_tier_history() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    let vendor = tree.write("usr/etc", "example.conf", "[Group]\nBla = 1\n");
    let admin = tree.write("etc", "example.conf", "[Group]\nBla = 2\nExtra = 3\n");

    let history = resolver(&tree).build().unwrap().resolve_history().unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].path(), Some(vendor.as_path()));
    assert_eq!(history[1].path(), Some(admin.as_path()));
    assert_eq!(history[0].get_int(Some("Group"), "Bla").unwrap(), 1);
    assert!(!history[0].contains_key(Some("Group"), "Extra"));
    assert_eq!(history[1].get_int(Some("Group"), "Bla").unwrap(), 2);

    // folding the history by hand gives the merged result
    let merged = resolver(&tree).build().unwrap().resolve().unwrap();
    assert_eq!(fold(&history).triples(), merged.triples());
}

#[test]
fn test_dropins_override_in_name_order() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "example.conf", "[Main]\nA = vendor\nB = vendor\nC = vendor\n");
    tree.write("usr/etc", "example.conf.d/50-b.conf", "[Main]\nB = dropin50\n");
    tree.write("usr/etc", "example.conf.d/10-a.conf", "[Main]\nA = dropin10\nB = dropin10\n");
    tree.write("etc", "example.conf.d/90-c.conf", "[Main]\nC = admin\n[New]\nD = 4\n");

    let config = resolver(&tree).build().unwrap().resolve().unwrap();

    assert_eq!(config.get_string(Some("Main"), "A").unwrap(), "dropin10");
    assert_eq!(config.get_string(Some("Main"), "B").unwrap(), "dropin50");
    assert_eq!(config.get_string(Some("Main"), "C").unwrap(), "admin");
    assert_eq!(config.get_int(Some("New"), "D").unwrap(), 4);

    let entry = config.entry(Some("Main"), "B").unwrap();
    assert!(entry.source().unwrap().ends_with("50-b.conf"));
}

#[test]
fn test_admin_main_file_overrides_vendor_dropins() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "example.conf.d/10-a.conf", "k = dropin\n");
    tree.write("etc", "example.conf", "k = admin\n");

    let layered = resolver(&tree).build().unwrap().resolve().unwrap();
    assert_eq!(layered.get_string(None, "k").unwrap(), "admin");

    let uapi = resolver(&tree)
        .with_main_file_policy(MainFilePolicy::HighestOnly)
        .build()
        .unwrap()
        .resolve()
        .unwrap();
    assert_eq!(uapi.get_string(None, "k").unwrap(), "dropin");
}

#[test]
fn test_highest_only_ignores_lower_main_files() {
    let tree = TierTree::new(&["usr/etc", "run", "etc"]);
    tree.write("usr/etc", "example.conf", "vendor_only = 1\nk = vendor\n");
    tree.write("run", "example.conf", "k = run\n");

    let config = resolver(&tree)
        .with_main_file_policy(MainFilePolicy::HighestOnly)
        .build()
        .unwrap()
        .resolve()
        .unwrap();
    assert_eq!(config.get_string(None, "k").unwrap(), "run");
    assert!(!config.contains_key(None, "vendor_only"));
}

#[test]
fn test_missing_tiers_are_skipped() {
    let tree = TierTree::new(&["usr/etc"]);
    tree.write("usr/etc", "example.conf", "k = v\n");
    let layers = tree.layers().with_layer(tree.path().join("does-not-exist"));

    let config = DirectoryResolver::builder("example")
        .with_layers(layers)
        .build()
        .unwrap()
        .resolve()
        .unwrap();
    assert_eq!(config.get_string(None, "k").unwrap(), "v");
}

#[test]
fn test_nothing_found() {
    let tree = TierTree::new(&["usr/etc", "etc"]);

    let err = resolver(&tree).build().unwrap().resolve().unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFile);
    assert!(last_error_location().is_some());

    let config = resolver(&tree)
        .require_source(false)
        .build()
        .unwrap()
        .resolve()
        .unwrap();
    assert!(config.is_empty());
}

#[test]
fn test_empty_dropin_directory() {
    let tree = TierTree::new(&["etc"]);
    std::fs::create_dir_all(tree.root("etc").join("example.conf.d")).unwrap();
    tree.write("etc", "example.conf", "k = v\n");

    let resolver = resolver(&tree).build().unwrap();
    assert_eq!(resolver.candidates().unwrap().len(), 1);
    assert_eq!(
        resolver.resolve().unwrap().get_string(None, "k").unwrap(),
        "v"
    );
}

#[test]
fn test_parse_error_in_dropin_is_located() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "example.conf", "[Group]\nBla = 1\n");
    let broken = tree.write("etc", "example.conf.d/20-broken.conf", "# header\n\n[Group\n");

    clear_error_location();
    let err = resolver(&tree).build().unwrap().resolve().unwrap_err();

    assert_eq!(err.code(), ErrorCode::MissingBracket);
    let location = err.location().unwrap();
    assert_eq!(location.path.as_deref(), Some(broken.as_path()));
    assert_eq!(location.line, 3);
    assert_eq!(last_error_location(), Some(location));
}

#[test]
fn test_history_aborts_on_error() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "example.conf", "[Group]\nBla = 1\n");
    tree.write("etc", "example.conf", "[Group]\nnovalue\n");

    let err = resolver(&tree).build().unwrap().resolve_history().unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingDelimiter);
}

#[test]
fn test_validator_sees_every_candidate() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "example.conf", "a = 1\n");
    tree.write("etc", "example.conf.d/10-x.conf", "b = 2\n");

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorder = {
        let seen = seen.clone();
        move |path: &Path| {
            seen.lock().unwrap().push(path.to_path_buf());
            true
        }
    };
    let config = resolver(&tree)
        .with_validator(recorder)
        .build()
        .unwrap()
        .resolve()
        .unwrap();
    assert_eq!(config.len(), 2);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn test_validator_rejection_aborts_everything() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "example.conf", "a = 1\n");
    tree.write("etc", "example.conf.d/10-untrusted.conf", "b = 2\n");

    let err = resolver(&tree)
        .with_validator(|path: &Path| !path.to_string_lossy().contains("untrusted"))
        .build()
        .unwrap()
        .resolve()
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParsingCallbackFailed);
    assert!(err
        .location()
        .unwrap()
        .path
        .unwrap()
        .ends_with("10-untrusted.conf"));
}

#[cfg(unix)]
#[test]
fn test_security_policy_as_validator() {
    let tree = TierTree::new(&["etc"]);
    tree.write("etc", "example.conf", "k = v\n");
    let link_target = tree.root("etc").join("example.conf");
    std::fs::create_dir_all(tree.root("etc").join("example.conf.d")).unwrap();
    std::os::unix::fs::symlink(
        &link_target,
        tree.root("etc").join("example.conf.d/10-link.conf"),
    )
    .unwrap();

    let err = resolver(&tree)
        .with_validator(SecurityPolicy::new().deny_symlinks())
        .build()
        .unwrap()
        .resolve()
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FileIsSymlink);
}

#[test]
fn test_custom_tags_and_project() {
    let tree = TierTree::new(&["usr/etc", "etc"]);
    tree.write("usr/etc", "myapp/example.conf", "; vendor\n[G]\nk: 1\n");
    tree.write("etc", "myapp/example.conf", "[G]\nk: 2\n");

    let config = resolver(&tree)
        .with_project("myapp")
        .with_parse_options(ParseOptions::new(':', ';').unwrap())
        .build()
        .unwrap()
        .resolve()
        .unwrap();
    assert_eq!(config.get_int(Some("G"), "k").unwrap(), 2);
    assert_eq!(config.delimiter(), ':');
    assert_eq!(config.comment(), ';');
}

#[test]
fn test_candidate_kinds() {
    let tree = TierTree::new(&["etc"]);
    tree.write("etc", "example.conf", "a = 1\n");
    tree.write("etc", "example.conf.d/a.conf", "a = 2\n");

    let candidates = resolver(&tree).build().unwrap().candidates().unwrap();
    let kinds: Vec<CandidateKind> = candidates.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CandidateKind::Main, CandidateKind::DropIn]);
}
