use std::path::PathBuf;

/// File the history log is persisted to, relative to the working directory.
pub const HISTORY_FILE: &str = "calculator_history.log";
/// File name used when an export destination turns out to be a directory.
pub const EXPORT_FILE_NAME: &str = "log.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub history_file: PathBuf,
    pub export_file_name: String,
    /// Reject unrecognized characters in expressions instead of skipping them.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            history_file: PathBuf::from(HISTORY_FILE),
            export_file_name: EXPORT_FILE_NAME.to_string(),
            strict: false,
        }
    }
}

impl Config {
    pub fn with_history_file<P: Into<PathBuf>>(mut self, path: P) -> Config {
        self.history_file = path.into();
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Config {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.history_file, PathBuf::from("calculator_history.log"));
        assert_eq!(config.export_file_name, "log.log");
        assert!(!config.strict);
    }

    #[test]
    fn strict_config_reaches_evaluator() {
        let config = Config::default().with_strict(true);
        assert!(Evaluator::strict(config.strict).evaluate("1 + y").is_err());
        assert_eq!(Evaluator::strict(false).evaluate("1 + y1").unwrap(), 2.0);
    }
}
