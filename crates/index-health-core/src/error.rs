//! Error types for snapshot decoding

use thiserror::Error;

/// Errors raised while turning a raw payload into a [`crate::ClusterStateSnapshot`]
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Payload is not valid JSON or does not match the expected shape
    #[error("Malformed cluster state: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Payload was empty
    #[error("Empty cluster state payload")]
    Empty,
}

/// Result type alias for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SnapshotError::Empty.to_string(),
            "Empty cluster state payload"
        );

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SnapshotError::from(json_err);
        assert!(err.to_string().starts_with("Malformed cluster state:"));
    }
}
