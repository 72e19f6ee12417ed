use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::{ChannelList, ExporterConfig},
};

/// Standard config file names, checked in order. The `discord-exporter.*`
/// names are what existing deployments of the exporter already ship.
const CONFIG_FILENAMES: &[&str] = &[
    "guildwatch.toml",
    "guildwatch.yaml",
    "guildwatch.yml",
    "guildwatch.json",
    "discord-exporter.toml",
    "discord-exporter.yaml",
    "discord-exporter.yml",
    "discord-exporter.json",
];

pub const ENV_TOKEN: &str = "GUILDWATCH_TOKEN";
pub const ENV_SERVER_ID: &str = "GUILDWATCH_SERVER_ID";
pub const ENV_EXCLUDE_CHANNELS: &str = "GUILDWATCH_EXCLUDE_CHANNELS";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ExporterConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::external(format!("failed to read {}", path.display()), e)
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Resolve, load, override and validate the exporter config.
///
/// An explicit path must exist. Without one, the standard locations are
/// searched and a missing file falls back to defaults, leaving validation to
/// reject a config without credentials.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<ExporterConfig> {
    let mut config = match explicit.map(Path::to_path_buf).or_else(find_config_file) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            let config = load_config(&path)?;
            info!(path = %path.display(), "configuration loaded");
            config
        },
        None => {
            debug!("no config file found, using defaults");
            ExporterConfig::default()
        },
    };

    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| {
            let dirs = directories::ProjectDirs::from("", "", "guildwatch")?;
            CONFIG_FILENAMES
                .iter()
                .map(|name| dirs.config_dir().join(name))
                .find(|p| p.exists())
        })
}

/// Apply `GUILDWATCH_*` environment variables on top of the file config.
pub fn apply_env_overrides(config: &mut ExporterConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut ExporterConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
        config.token = Secret::new(token);
    }
    if let Some(server_id) = lookup(ENV_SERVER_ID).filter(|v| !v.is_empty()) {
        config.server_id = server_id;
    }
    if let Some(excluded) = lookup(ENV_EXCLUDE_CHANNELS) {
        config.exclude_channels = ChannelList::Csv(excluded);
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<ExporterConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::io::Write};

    fn write_config(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_yaml() {
        let (_dir, path) = write_config(
            "guildwatch.yaml",
            "token: abc\nserverID: \"99\"\nexcludeChannels: general-archive\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.token.expose_secret(), "abc");
        assert_eq!(cfg.server_id, "99");
        assert!(cfg.exclusion_set().contains("general-archive"));
    }

    #[test]
    fn loads_toml_with_sections() {
        let (_dir, path) = write_config(
            "guildwatch.toml",
            r#"
token = "abc"
serverID = "99"

[metrics]
port = 9100

[collector]
updateIntervalSecs = 60
maxConcurrentChannels = 3
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.metrics.port, 9100);
        assert_eq!(cfg.metrics.bind, "0.0.0.0");
        assert_eq!(cfg.collector.update_interval_secs, 60);
        assert_eq!(cfg.collector.max_concurrent_channels, 3);
    }

    #[test]
    fn legacy_file_names_are_searched() {
        assert!(CONFIG_FILENAMES.contains(&"discord-exporter.yaml"));
        let (_dir, path) = write_config(
            "discord-exporter.yaml",
            "token: abc\nserverID: 123456789012345678\nexcludeChannels: general-archive\n",
        );
        let cfg = discover_and_load(Some(&path)).unwrap();
        assert_eq!(cfg.server_id, "123456789012345678");
    }

    #[rstest::rstest]
    #[case("guildwatch.toml", "token = \"abc\"\nserverID = 123456789012345678\n")]
    #[case("guildwatch.json", r#"{"token":"abc","serverID":123456789012345678}"#)]
    #[case("guildwatch.yaml", "token: abc\nserverID: 123456789012345678\n")]
    fn numeric_server_id_is_accepted(#[case] name: &str, #[case] contents: &str) {
        let (_dir, path) = write_config(name, contents);
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server_id, "123456789012345678");
    }

    #[test]
    fn rejects_unknown_extension() {
        let (_dir, path) = write_config("guildwatch.ini", "token=abc");
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(discover_and_load(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_file_without_server_id_is_invalid() {
        let (_dir, path) = write_config("guildwatch.json", r#"{"token":"abc"}"#);
        let err = discover_and_load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = ExporterConfig::default();
        apply_overrides_with(&mut cfg, |name| match name {
            ENV_TOKEN => Some("from-env".into()),
            ENV_SERVER_ID => Some("77".into()),
            ENV_EXCLUDE_CHANNELS => Some("a, b".into()),
            _ => None,
        });
        assert_eq!(cfg.token.expose_secret(), "from-env");
        assert_eq!(cfg.server_id, "77");
        assert_eq!(cfg.exclusion_set().len(), 2);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = ExporterConfig {
            server_id: "1".into(),
            ..Default::default()
        };
        apply_overrides_with(&mut cfg, |name| match name {
            ENV_SERVER_ID => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg.server_id, "1");
    }
}
