use thiserror::Error;

/// Failure to decode a binary payload.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DataContentError {
    #[error("byte array element {index} is not a byte")]
    InvalidByte { index: usize },

    #[error("unsupported binary container: {0}")]
    UnsupportedContainer(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
