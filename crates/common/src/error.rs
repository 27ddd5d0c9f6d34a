//! Errors shared by configuration loading

use thiserror::Error;

/// Error type for configuration and file handling
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_includes_message() {
        let err = Error::Config("base_url must start with http:// or https://".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: base_url must start with http:// or https://"
        );
    }

    #[test]
    fn io_error_converts_via_from() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/storefront.toml")?)
        }
        let err = read_missing().unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got: {err:?}");
    }

    #[test]
    fn toml_error_converts_via_from() {
        fn parse(raw: &str) -> Result<toml::Value> {
            Ok(toml::from_str(raw)?)
        }
        let err = parse("[api\nbase_url = ").unwrap_err();
        assert!(matches!(err, Error::Toml(_)), "got: {err:?}");
    }
}
