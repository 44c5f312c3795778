use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Summary of a cart attached to a structured conflict payload. The server
/// sends whatever it has; only the id is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictCartInfo {
    pub id: i64,
    #[serde(default)]
    pub restaurant: Option<String>,
    #[serde(default)]
    pub restaurant_id: Option<i64>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// The group a session already belongs to, attached to
/// `active_ordergroup_exists` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingGroup {
    pub id: i64,
    #[serde(default)]
    pub restaurant: Option<String>,
    #[serde(default)]
    pub restaurant_id: Option<i64>,
}

/// Every way a call to the ordering API can fail.
///
/// The three `Conflict*` variants are not failures in the usual sense: they
/// carry the server's structured payload and require an explicit user
/// decision before anything is retried. `Unauthorized` is global — the
/// transport flips its session-expired channel before returning it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Add-item targeted a restaurant different from the session's active
    /// cart. Carries the conflicting carts for the delete-and-retry flow.
    #[error("active cart exists at another restaurant")]
    ConflictCart(Vec<ConflictCartInfo>),

    /// Cart creation while another active cart exists; resolved by
    /// re-issuing the create with an explicit force flag.
    #[error("an active cart already exists for this session")]
    ConflictActiveCart(Box<ConflictCartInfo>),

    /// Group join/create while the session already belongs to another
    /// active group. Never resolved destructively.
    #[error("session already belongs to an active order group")]
    ConflictActiveGroup(Box<ExistingGroup>),

    #[error("session expired or unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("api error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Maps a non-2xx response onto [`ApiError`] by inspecting the structured
/// `error` discriminator first and the HTTP status second. Unrecognized
/// discriminators degrade to a generic failure.
pub(crate) fn classify(status: u16, body: Value) -> ApiError {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct ErrorPayload {
        error: Option<String>,
        message: Option<String>,
        carts: Vec<ConflictCartInfo>,
        cart: Option<ConflictCartInfo>,
        #[serde(rename = "orderGroup")]
        order_group: Option<ExistingGroup>,
    }

    let payload: ErrorPayload = serde_json::from_value(body).unwrap_or_default();
    match payload.error.as_deref() {
        Some("cart_conflict") => ApiError::ConflictCart(payload.carts),
        Some("active_cart_exists") => match payload.cart {
            Some(cart) => ApiError::ConflictActiveCart(Box::new(cart)),
            None => ApiError::Api("active_cart_exists without cart payload".into()),
        },
        Some("active_ordergroup_exists") => match payload.order_group {
            Some(group) => ApiError::ConflictActiveGroup(Box::new(group)),
            None => ApiError::Api("active_ordergroup_exists without group payload".into()),
        },
        _ if status == 401 => ApiError::Unauthorized,
        _ if status == 404 => ApiError::NotFound,
        Some(other) => ApiError::Api(other.to_string()),
        None => ApiError::Api(
            payload
                .message
                .unwrap_or_else(|| format!("http status {status}")),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_cart_conflict_with_carts() {
        let err = classify(
            409,
            json!({
                "error": "cart_conflict",
                "carts": [{ "id": 7, "restaurant": "Udupi Grand", "total": 300.0 }]
            }),
        );
        match err {
            ApiError::ConflictCart(carts) => {
                assert_eq!(carts.len(), 1);
                assert_eq!(carts[0].id, 7);
                assert_eq!(carts[0].restaurant.as_deref(), Some("Udupi Grand"));
            }
            other => panic!("expected ConflictCart, got {other:?}"),
        }
    }

    #[test]
    fn classifies_active_cart_exists() {
        let err = classify(
            409,
            json!({ "error": "active_cart_exists", "cart": { "id": 3, "total": 120.0 } }),
        );
        match err {
            ApiError::ConflictActiveCart(cart) => assert_eq!(cart.id, 3),
            other => panic!("expected ConflictActiveCart, got {other:?}"),
        }
    }

    #[test]
    fn classifies_active_ordergroup_exists() {
        let err = classify(
            409,
            json!({
                "error": "active_ordergroup_exists",
                "orderGroup": { "id": 12, "restaurant": "Udupi Grand" }
            }),
        );
        match err {
            ApiError::ConflictActiveGroup(group) => {
                assert_eq!(group.id, 12);
                assert_eq!(group.restaurant.as_deref(), Some("Udupi Grand"));
            }
            other => panic!("expected ConflictActiveGroup, got {other:?}"),
        }
    }

    #[test]
    fn unknown_discriminator_is_generic() {
        let err = classify(409, json!({ "error": "pos_sync_failed" }));
        match err {
            ApiError::Api(msg) => assert_eq!(msg, "pos_sync_failed"),
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn status_fallbacks() {
        assert!(matches!(classify(404, Value::Null), ApiError::NotFound));
        assert!(matches!(classify(401, Value::Null), ApiError::Unauthorized));
        assert!(matches!(classify(500, Value::Null), ApiError::Api(_)));
    }
}
