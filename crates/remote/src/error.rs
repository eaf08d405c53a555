//! Proxy-layer error types.

use common::ProductId;
use thiserror::Error;

/// Typed outcome of a cross-service call.
///
/// `Unavailable` is the only fault variant: it covers transport errors,
/// timeouts, non-contract status codes and an open circuit. Every other
/// variant is a business answer from a reachable dependency and does
/// not count against the circuit breaker.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The dependency could not be reached, timed out, or the circuit
    /// is open.
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    /// The dependency answered: the referenced resource does not exist.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The stock ledger refused a decrement for lack of stock.
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    /// The stock ledger already holds a record for this product.
    #[error("stock record already exists for product {product_id}")]
    AlreadyExists { product_id: ProductId },

    /// The dependency rejected the request as malformed.
    #[error("request rejected: {reason}")]
    Invalid { reason: String },
}

impl RemoteError {
    /// True when the error indicates the dependency could not answer,
    /// as opposed to answering with a business refusal.
    pub fn is_fault(&self) -> bool {
        matches!(self, RemoteError::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_counts_as_fault() {
        assert!(
            RemoteError::Unavailable {
                service: "stock",
                reason: "timeout".to_string(),
            }
            .is_fault()
        );
        assert!(
            !RemoteError::NotFound {
                resource: "user".to_string(),
            }
            .is_fault()
        );
        assert!(
            !RemoteError::InsufficientStock {
                product_id: ProductId::new(),
            }
            .is_fault()
        );
    }
}
