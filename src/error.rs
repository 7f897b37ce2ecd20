use thiserror::Error;

/// Failure of one backend call.
///
/// `Rejected` is the application tier: the backend answered with a
/// structured error (`{erro}` or `{sucesso: false, mensagem}`) that is shown
/// to the user verbatim. Every other variant is the transport tier.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Transport(String),
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    #[error("Invalid response from sales backend: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Misuse of the sale register by its host.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("Unknown product id {0}")]
    UnknownProduct(i64),
    #[error("No cart line at position {0}")]
    NoSuchLine(usize),
}
