// Configuration loader for the diarization API
//
// This module handles loading configuration from the TOML configuration file
// and environment variables with appropriate precedence.

use std::env;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use toml::Value;

const CONFIG_FILE_PATH: &str = "diarize_api.conf";

/// Loads configuration from the TOML file next to the binary, if present.
///
/// Configuration precedence (highest to lowest):
/// 1. Environment variables
/// 2. Configuration file values
/// 3. Default values (not handled here - application defaults)
///
/// Returns true if the config file was successfully loaded, false otherwise.
pub fn load_config() -> bool {
    load_config_from(Path::new(CONFIG_FILE_PATH))
}

/// Loads a flat TOML file and publishes its entries as environment variables,
/// skipping any key the environment already defines.
pub fn load_config_from(config_path: &Path) -> bool {
    if !config_path.exists() {
        debug!("Configuration file not found at: {}", config_path.display());
        return false;
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read configuration file: {}", e);
            return false;
        }
    };

    let config_values: Value = match config_content.parse() {
        Ok(values) => values,
        Err(e) => {
            warn!("Failed to parse configuration file: {}", e);
            return false;
        }
    };

    let Value::Table(table) = config_values else {
        warn!("Configuration file is not a TOML table, ignoring");
        return false;
    };

    for (key, value) in table {
        // The file is expected to be flat: nested tables and arrays are skipped
        let value = match value {
            Value::String(s) => s,
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            _ => {
                warn!("Skipping unsupported TOML value type for key: {}", key);
                continue;
            }
        };

        if env::var(&key).is_err() {
            debug!("Setting env var from config file: {} = {}", key, value);
            env::set_var(key, value);
        } else {
            debug!("Env var already exists, skipping: {}", key);
        }
    }

    info!("Configuration loaded from {}", config_path.display());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_an_error() {
        assert!(!load_config_from(Path::new("/nonexistent/diarize_api.conf")));
    }

    #[test]
    fn file_values_populate_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diarize_api.conf");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "DIARIZE_LOADER_TEST_STR = \"hello\"").unwrap();
        writeln!(file, "DIARIZE_LOADER_TEST_INT = 42").unwrap();
        drop(file);

        assert!(load_config_from(&path));
        assert_eq!(env::var("DIARIZE_LOADER_TEST_STR").unwrap(), "hello");
        assert_eq!(env::var("DIARIZE_LOADER_TEST_INT").unwrap(), "42");
    }

    #[test]
    fn environment_takes_precedence_over_file() {
        env::set_var("DIARIZE_LOADER_TEST_PRIO", "from-env");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diarize_api.conf");
        fs::write(&path, "DIARIZE_LOADER_TEST_PRIO = \"from-file\"\n").unwrap();

        assert!(load_config_from(&path));
        assert_eq!(env::var("DIARIZE_LOADER_TEST_PRIO").unwrap(), "from-env");
    }
}
