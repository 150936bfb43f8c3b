//! Error taxonomy for the service layer.
//!
//! These are kinds, not transport codes: front-ends map them onto HTTP
//! statuses or JSON-RPC errors. The orchestrator converts every variant into
//! a structured failure result — none of them escape a public operation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller supplied invalid input (empty tag list, unparseable time
    /// phrase, missing content hash).
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist. The message always contains
    /// "not found" so front-ends can map it to the right status.
    #[error("{0} not found")]
    NotFound(String),

    /// Storage or embedding collaborator failed unexpectedly.
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_is_detectable() {
        let err = ServiceError::NotFound("Memory".into());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn backend_errors_wrap_anyhow() {
        let err: ServiceError = anyhow::anyhow!("disk on fire").into();
        assert!(err.to_string().contains("disk on fire"));
    }
}
