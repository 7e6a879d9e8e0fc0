// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for inspecting layered configuration.

use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tiercfg::adapters::ParseOptions;
use tiercfg::domain::{ConfigError, ConfigFile, ConfigValue};
use tiercfg::service::{DirectoryResolver, LayerList, MainFilePolicy};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tiercfg", version, about = "Inspect layered configuration files")]
struct Cli {
    /// Log resolution steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the merged configuration
    Show(Target),
    /// Print every contributing file, lowest precedence first
    Cat(Target),
    /// Print a single value of the merged configuration
    Get {
        #[command(flatten)]
        target: Target,
        /// Group name, empty for the root group
        group: String,
        /// Key name
        key: String,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Configuration base name, e.g. `example` for `example.conf`
    name: String,

    /// Project subdirectory below each root
    #[arg(long)]
    project: Option<String>,

    /// File suffix
    #[arg(long, default_value = "conf")]
    suffix: String,

    /// Root directory, lowest precedence first; defaults to /usr/etc, /run, /etc
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Append the user's configuration directory as the highest tier
    #[arg(long)]
    user: bool,

    /// Use only the highest main file (drop-ins of all tiers still apply)
    #[arg(long)]
    highest_only: bool,

    /// Key/value delimiter
    #[arg(long, default_value_t = '=')]
    delimiter: char,

    /// Comment character
    #[arg(long, default_value_t = '#')]
    comment: char,

    /// Print JSON instead of key-file text
    #[arg(long)]
    json: bool,
}

impl Target {
    fn resolver(&self) -> Result<DirectoryResolver, ConfigError> {
        let mut layers = if self.roots.is_empty() {
            LayerList::system()
        } else {
            self.roots.iter().map(PathBuf::as_path).collect()
        };
        if self.user {
            layers = layers.with_user_config();
        }
        let policy = if self.highest_only {
            MainFilePolicy::HighestOnly
        } else {
            MainFilePolicy::Layered
        };
        let mut builder = DirectoryResolver::builder(self.name.as_str())
            .with_layers(layers)
            .with_suffix(self.suffix.as_str())
            .with_parse_options(ParseOptions::new(self.delimiter, self.comment)?)
            .with_main_file_policy(policy);
        if let Some(project) = &self.project {
            builder = builder.with_project(project.as_str());
        }
        builder.build()
    }
}

fn to_json(config: &ConfigFile) -> serde_json::Value {
    let mut groups: IndexMap<&str, IndexMap<&str, &ConfigValue>> = IndexMap::new();
    for (group, key, value) in config.iter() {
        groups.entry(group).or_default().insert(key, value);
    }
    serde_json::json!({
        "path": config.path(),
        "groups": groups,
    })
}

fn print_json(value: &serde_json::Value) -> Result<(), ConfigError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ConfigError::InvalidArgument {
        message: format!("Failed to encode JSON: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}

fn run(cli: Cli) -> Result<(), ConfigError> {
    match cli.command {
        Command::Show(target) => {
            let config = target.resolver()?.resolve()?;
            if target.json {
                print_json(&to_json(&config))?;
            } else {
                print!("{}", config);
            }
        }
        Command::Cat(target) => {
            let history = target.resolver()?.resolve_history()?;
            if target.json {
                let files: Vec<_> = history.iter().map(to_json).collect();
                print_json(&serde_json::Value::Array(files))?;
            } else {
                for file in &history {
                    let path = file
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    println!("{} {}", file.comment(), path);
                    print!("{}", file);
                    println!();
                }
            }
        }
        Command::Get { target, group, key } => {
            let config = target.resolver()?.resolve()?;
            let value = config.value(Some(group.as_str()), &key)?;
            if target.json {
                print_json(&serde_json::json!(value))?;
            } else {
                println!("{}", value);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("tiercfg=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tiercfg: {}", e);
            if let Some(location) = tiercfg::last_error_location() {
                eprintln!("tiercfg: at {}", location);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_keeps_raw_text() {
        let mut config = ConfigFile::ini();
        config.set(None, "top", "level").unwrap();
        config.set(Some("Server"), "port", 8080).unwrap();
        config.set(Some("Server"), "tls", "yes").unwrap();

        let json = to_json(&config);
        assert_eq!(json["path"], serde_json::Value::Null);
        assert_eq!(json["groups"][""]["top"], "level");
        assert_eq!(json["groups"]["Server"]["port"], "8080");
        assert_eq!(json["groups"]["Server"]["tls"], "yes");
    }
}
