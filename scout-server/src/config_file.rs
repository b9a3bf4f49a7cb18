//! Optional TOML configuration file, merged under the process environment.
//!
//! Keys are the literal environment variable names [`Config::from_env`]
//! reads (`SCOUT_CACHE_DIR`, `SCOUT_DEFAULT_MODEL`, …) — a file is just an
//! alternate source for the same env vars, not a separate schema, so a
//! variable already set in the environment always wins over the file.

use std::path::Path;

use scout_config::Config;
use scout_errors::ScoutError;

/// Load configuration, optionally seeded from a TOML file at `path` before
/// falling back to [`Config::from_env`].
pub fn load_config(path: Option<&Path>) -> Result<Config, ScoutError> {
    if let Some(path) = path {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScoutError::Other(Box::new(e)))?;
        let table: toml::Table = toml::from_str(&contents).map_err(|e| ScoutError::Other(Box::new(e)))?;

        for (key, value) in table {
            if std::env::var_os(&key).is_some() {
                continue;
            }
            let as_env_value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            std::env::set_var(&key, as_env_value);
        }
    }

    Config::from_env()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Both cases live in one test: `SCOUT_DEFAULT_MODEL` is process-global
    // state, and `cargo test` runs this file's tests on separate threads by
    // default, so two tests touching the same var would race.
    #[test]
    fn file_values_fill_gaps_but_never_override_the_environment() {
        std::env::remove_var("SCOUT_DEFAULT_MODEL");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"SCOUT_DEFAULT_MODEL = "from-file-model""#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.default_model, "from-file-model");

        std::env::set_var("SCOUT_DEFAULT_MODEL", "from-env-model");
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.default_model, "from-env-model");
        std::env::remove_var("SCOUT_DEFAULT_MODEL");
    }
}
