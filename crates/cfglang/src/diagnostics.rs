use crate::position::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A tokenizer or parser failure: a message plus the source location of the
/// offending token or character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecognizerError {
    pub location: Location,
    pub message: String,
}

impl RecognizerError {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for RecognizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RecognizerError {}

/// An evaluation or query failure. The location is absent for whole-config
/// conditions such as querying before any data was loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigError {
    pub location: Option<Location>,
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }

    pub fn at(location: Location, message: impl Into<String>) -> Self {
        Self {
            location: Some(location),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Error)]
pub enum CfgError {
    #[error("{0}")]
    Decoder(String),
    #[error("{0}")]
    Tokenizer(RecognizerError),
    #[error("{0}")]
    Parser(RecognizerError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CfgError {
    pub fn tokenizer(location: Location, message: impl Into<String>) -> Self {
        CfgError::Tokenizer(RecognizerError::new(location, message))
    }

    pub fn parser(location: Location, message: impl Into<String>) -> Self {
        CfgError::Parser(RecognizerError::new(location, message))
    }

    pub fn config(message: impl Into<String>) -> Self {
        CfgError::Config(ConfigError::new(message))
    }

    pub fn config_at(location: Location, message: impl Into<String>) -> Self {
        CfgError::Config(ConfigError::at(location, message))
    }

    /// The source location attached to this error, when one exists.
    pub fn location(&self) -> Option<Location> {
        match self {
            CfgError::Tokenizer(e) | CfgError::Parser(e) => Some(e.location),
            CfgError::Config(e) => e.location,
            _ => None,
        }
    }
}

pub type CfgResult<T, E = CfgError> = std::result::Result<T, E>;
