use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetModeError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("error establishing connection to {target}")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("error sending mode command")]
    Transmission {
        #[source]
        source: io::Error,
    },
}

impl SetModeError {
    pub fn config(msg: impl Into<String>) -> Self {
        SetModeError::Configuration(msg.into())
    }
}
