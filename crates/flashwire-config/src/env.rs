use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Environment loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not found: {var}")]
    NotFound { var: String },

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

impl ConfigError {
    pub fn invalid(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

/// Reads variables from the process environment with an override layer so
/// tests can inject values without mutating global state.
#[derive(Debug, Default, Clone)]
pub struct EnvLoader {
    overrides: HashMap<String, String>,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader backed only by the given pairs plus the process environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, var: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(var.into(), value.into());
    }

    fn lookup(&self, var: &str) -> Option<String> {
        self.overrides
            .get(var)
            .cloned()
            .or_else(|| env::var(var).ok())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, var: &str) -> Result<String, ConfigError> {
        self.lookup(var).ok_or_else(|| ConfigError::NotFound {
            var: var.to_string(),
        })
    }

    pub fn string_or(&self, var: &str, default: &str) -> String {
        self.lookup(var).unwrap_or_else(|| default.to_string())
    }

    pub fn uint_or(&self, var: &str, default: u64) -> Result<u64, ConfigError> {
        match self.lookup(var) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e| {
                ConfigError::invalid(var, format!("cannot parse as unsigned integer: {e}"))
            }),
        }
    }

    pub fn float_or(&self, var: &str, default: f64) -> Result<f64, ConfigError> {
        match self.lookup(var) {
            None => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::invalid(var, format!("cannot parse as float: {e}"))),
        }
    }

    pub fn bool_or(&self, var: &str, default: bool) -> Result<bool, ConfigError> {
        match self.lookup(var) {
            None => Ok(default),
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                other => Err(ConfigError::invalid(
                    var,
                    format!("invalid boolean value: {other}"),
                )),
            },
        }
    }
}
