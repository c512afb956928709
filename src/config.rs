//! Session configuration.

use std::env;

/// Environment variable holding an `env_logger` filter, e.g. `nice=debug`.
pub const LOG_VAR: &str = "NICE_LOG";

/// Environment variable that turns the token listing off when set to `0`, `false`, `off` or
/// `no`.
pub const TOKENS_VAR: &str = "NICE_TOKENS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Write every token to the program output before interpreting.
    pub token_listing: bool,
    /// Shown by the interactive prompt before each line.
    pub prompt: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            token_listing: true,
            prompt: "> ".to_string(),
            log_filter: "off".to_string(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Config {
        Config::from_vars(|name| env::var(name).ok())
    }

    fn from_vars<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(filter) = lookup(LOG_VAR) {
            config.log_filter = filter;
        }
        if let Some(flag) = lookup(TOKENS_VAR) {
            config.token_listing = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        config
    }
}
