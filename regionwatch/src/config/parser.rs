//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = non_empty(section.get("data_file")) {
            config.store.data_file = expand_tilde(v);
        }
    }

    // [regions] section
    if let Some(section) = ini.section(Some("regions")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.regions.file = expand_tilde(v);
        }
    }

    // [ingest] section
    if let Some(section) = ini.section(Some("ingest")) {
        if let Some(v) = section.get("retry_attempts") {
            let attempts: u32 = parse_value("ingest", "retry_attempts", v, "a positive integer")?;
            if attempts == 0 {
                return Err(invalid("ingest", "retry_attempts", v, "must be at least 1"));
            }
            config.ingest.retry_attempts = attempts;
        }
        if let Some(v) = section.get("retry_delay_ms") {
            config.ingest.retry_delay_ms =
                parse_value("ingest", "retry_delay_ms", v, "a non-negative integer (milliseconds)")?;
        }
        if let Some(v) = section.get("bbox_prefilter") {
            config.ingest.bbox_prefilter = parse_bool("ingest", "bbox_prefilter", v)?;
        }
    }

    // [query] section
    if let Some(section) = ini.section(Some("query")) {
        if let Some(v) = section.get("max_limit") {
            let max: usize = parse_value("query", "max_limit", v, "a positive integer")?;
            if max == 0 {
                return Err(invalid("query", "max_limit", v, "must be at least 1"));
            }
            config.query.max_limit = max;
        }
        if let Some(v) = section.get("default_limit") {
            config.query.default_limit =
                parse_value("query", "default_limit", v, "a positive integer")?;
        }
        if config.query.default_limit == 0 || config.query.default_limit > config.query.max_limit
        {
            return Err(invalid(
                "query",
                "default_limit",
                &config.query.default_limit.to_string(),
                &format!("must be between 1 and max_limit ({})", config.query.max_limit),
            ));
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    expected: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, &format!("must be {}", expected)))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` against the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(contents: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, contents).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_partial_config() {
        let config = load(
            r#"
[ingest]
retry_attempts = 7
bbox_prefilter = yes
"#,
        )
        .unwrap();

        assert_eq!(config.ingest.retry_attempts, 7);
        assert!(config.ingest.bbox_prefilter);
        // Untouched keys keep defaults
        assert_eq!(config.ingest.retry_delay_ms, 100);
        assert_eq!(config.query, ConfigFile::default().query);
    }

    #[test]
    fn test_paths_expand_tilde() {
        let config = load(
            r#"
[store]
data_file = /var/lib/regionwatch/tracks.json

[regions]
file = ~/zones.geojson
"#,
        )
        .unwrap();

        assert_eq!(
            config.store.data_file,
            PathBuf::from("/var/lib/regionwatch/tracks.json")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.regions.file, home.join("zones.geojson"));
        }
    }

    #[test]
    fn test_invalid_retry_attempts() {
        let err = load("[ingest]\nretry_attempts = many\n").unwrap_err();
        assert!(err.to_string().contains("retry_attempts"));

        let err = load("[ingest]\nretry_attempts = 0\n").unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_invalid_bool() {
        let err = load("[ingest]\nbbox_prefilter = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { .. }));
    }

    #[test]
    fn test_default_limit_above_max() {
        let err = load("[query]\ndefault_limit = 500\nmax_limit = 200\n").unwrap_err();
        assert!(err.to_string().contains("default_limit"));
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("test/path"));
        }

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
