use std::fmt;

use thiserror::Error;

/// What a not-found failure failed to find, along with the fixed
/// wording the HTTP layer reports for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Refbook,
    Version,
    Elements,
}

impl Missing {
    pub fn detail(&self) -> &'static str {
        match self {
            Missing::Refbook => "Reference book not found",
            Missing::Version => {
                "Reference book version that satisfies the request was not found"
            }
            Missing::Elements => "Reference book elements not found",
        }
    }
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.detail())
    }
}

#[derive(Error, Debug)]
pub enum RefbookdError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(Missing),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, RefbookdError>;

// Helper conversions
impl From<rusqlite::Error> for RefbookdError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
