//! Domain errors returned inside RPC replies.

use serde::{Deserialize, Serialize};

/// Errors a registry operation can report to its caller
///
/// These travel inside a successful reply as the `Err` arm of a
/// [`MethodResult`], never as a transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceError {
    /// No paper with this identifier has been registered
    #[error("Paper not found: {id}")]
    NotFound { id: u64 },

    /// The add arguments were rejected; the registry was not modified
    #[error("Invalid paper: {reason}")]
    Validation { reason: String },
}

impl ServiceError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ServiceError::Validation {
            reason: reason.into(),
        }
    }
}

/// Result of a remote method: the success value or a named domain error
pub type MethodResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_is_tagged() {
        let result: MethodResult<u64> = Err(ServiceError::NotFound { id: 2 });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "Err": { "kind": "not_found", "id": 2 } })
        );

        let ok: MethodResult<u64> = serde_json::from_value(serde_json::json!({ "Ok": 1 })).unwrap();
        assert_eq!(ok, Ok(1));
    }
}
