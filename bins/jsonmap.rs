use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use serde_json::Value;
use store::PersistentMap;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "jsonmap", about = "Print a JSON-backed map and optionally merge an object into it", version)]
struct Args {
    #[arg(value_name = "FILE", help = "Backing file; defaults to store.path from the config")]
    path: Option<PathBuf>,

    #[arg(short, long, value_name = "JSON", help = "JSON object to merge into the map and persist")]
    merge: Option<String>,
}

/// `key: value`, with strings printed bare.
fn render_entry(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) => format!("{key}: {s}"),
        other => format!("{key}: {other}"),
    }
}

fn init_logging(cfg: &configs::LoggingConfig) {
    if cfg.is_json() {
        common::utils::logging::init_logging_json(&cfg.filter);
    } else {
        common::utils::logging::init_logging_compact(&cfg.filter);
    }
    info!(service = "jsonmap", event = "logger_init", "tracing subscriber initialized");
}

fn run(cfg: configs::AppConfig, args: Args) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from(&cfg.store.path));
    let mut map = PersistentMap::open_with(&path, cfg.store.options.clone())
        .with_context(|| format!("opening {}", path.display()))?;
    info!(service = "jsonmap", event = "opened", path = %path.display(), entries = map.len());

    for (key, value) in map.iter() {
        println!("{}", render_entry(key, value));
    }

    if let Some(raw) = args.merge {
        let other: Value = serde_json::from_str(&raw).context("parsing --merge argument")?;
        map.update_from_value(other).context("merging into map")?;
        info!(service = "jsonmap", event = "merged", path = %path.display(), entries = map.len());
        println!("{map}");
    }
    Ok(())
}

fn main() -> ExitCode {
    // .env first so RUST_LOG, CONFIG_PATH and JSONMAP_PATH from it are honored
    dotenv().ok();
    let args = Args::parse();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "jsonmap", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&cfg.logging);

    match run(cfg, args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "jsonmap", event = "failed", error = %format!("{e:#}"), "jsonmap failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("jsonmap").chain(list.iter().copied()))
    }

    #[test]
    fn parses_path_and_merge() {
        let parsed = args(&["data.json", "--merge", r#"{"x":1}"#]).unwrap();
        assert_eq!(parsed.path, Some(PathBuf::from("data.json")));
        assert_eq!(parsed.merge.as_deref(), Some(r#"{"x":1}"#));

        let parsed = args(&[]).unwrap();
        assert!(parsed.path.is_none());
        assert!(parsed.merge.is_none());
    }

    #[test]
    fn accepts_equals_and_short_forms() {
        let parsed = args(&[r#"--merge={"x":1}"#]).unwrap();
        assert_eq!(parsed.merge.as_deref(), Some(r#"{"x":1}"#));
        let parsed = args(&["-m", "{}", "cfg.json"]).unwrap();
        assert_eq!(parsed.merge.as_deref(), Some("{}"));
        assert_eq!(parsed.path, Some(PathBuf::from("cfg.json")));
    }

    #[test]
    fn help_is_a_display_request_not_a_failure() {
        let err = args(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&["--merge"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.json", "b.json"]).is_err());
    }

    #[test]
    fn renders_strings_bare_and_other_values_as_json() {
        assert_eq!(render_entry("name", &json!("proxy")), "name: proxy");
        assert_eq!(render_entry("d", &json!({"one": 2})), r#"d: {"one":2}"#);
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
