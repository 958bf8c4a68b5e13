//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[store]
; JSON snapshot of every stored position report and crossing
data_file = {}

[regions]
; GeoJSON FeatureCollection; each feature needs an id, properties.name,
; properties.region_type and a Polygon geometry
file = {}

[ingest]
; Total commit attempts per report, including the first (minimum 1)
retry_attempts = {}
; Delay before the first retry in milliseconds; doubles per retry, capped at 5s
retry_delay_ms = {}
; Skip regions whose bounding box contains neither position (true/false)
bbox_prefilter = {}

[query]
; Limit used when a positions query does not give one
default_limit = {}
; Largest limit a positions query may request
max_limit = {}

[logging]
directory = {}
file = {}
"#,
        path_to_string(&config.store.data_file),
        path_to_string(&config.regions.file),
        config.ingest.retry_attempts,
        config.ingest.retry_delay_ms,
        config.ingest.bbox_prefilter,
        config.query.default_limit,
        config.query.max_limit,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert path to string, collapsing the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sections_written() {
        let text = to_config_string(&ConfigFile::default());
        for section in ["[store]", "[regions]", "[ingest]", "[query]", "[logging]"] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("retry_attempts = 3"));
        assert!(text.contains("bbox_prefilter = false"));
    }
}
