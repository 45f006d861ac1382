use std::fs;

use anyhow::{Context, Result};
use pictscan_engine::ScanConfig;
use pictscan_logging::scan_info;

use crate::cli::Cli;

/// Builds the scan config: defaults, then the RON file, then CLI flags.
pub fn load_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config {}", path.display()))?;
            scan_info!("Loaded config from {:?}", path);
            config
        }
        None => ScanConfig::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(groups) = cli.groups {
        config.group_count = groups;
    }
    config.validate()?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<ScanConfig> {
    Ok(ron::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use clap::Parser;

    use super::{load_config, parse_config};
    use crate::cli::Cli;

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = parse_config(
            r#"(group_count: 4, fetch: (request_timeout: 12.5), output: (dir: "out"))"#,
        )
        .unwrap();
        assert_eq!(config.group_count, 4);
        assert_eq!(config.fetch.request_timeout, Duration::from_millis(12_500));
        assert_eq!(config.fetch.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.found_filename, "pass-1-found.json");
    }

    #[test]
    fn cli_flags_override_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("scan.ron");
        std::fs::write(&path, "(group_count: 4)").unwrap();

        let cli = Cli::parse_from([
            "pictscan",
            "--config",
            path.to_str().unwrap(),
            "--groups",
            "7",
            "--output-dir",
            "results",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.group_count, 7);
        assert_eq!(config.output.dir, PathBuf::from("results"));
    }

    #[test]
    fn zero_groups_rejected() {
        let cli = Cli::parse_from(["pictscan", "--groups", "0"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn defaults_without_file() {
        let cli = Cli::parse_from(["pictscan"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.group_count, 10);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(30));
        assert_eq!(cli.input, PathBuf::from("pages.json"));
    }
}
