use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("config error: {0}")]
    Config(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("universe store error: {0}")]
    Store(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Configuration problems are fatal at startup; everything else is either
    /// recoverable by the caller or absorbed by the universe fallback.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;
