use thiserror::Error;

/// Caller-visible failures of the profiling pipeline.
///
/// Missing or malformed record categories are not errors: they are zero-filled during
/// extraction. Only total absence of the wallet surfaces as `NotFound`.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("wallet address is missing or empty")]
    InvalidAddress,

    #[error("no data found for wallet {address}")]
    NotFound { address: String },

    #[error("remote fetch failed for wallet {address}: {reason}")]
    Upstream { address: String, reason: String },

    #[error("report rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProfileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
