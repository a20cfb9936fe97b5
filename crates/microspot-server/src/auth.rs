//! Credential hashing and session resolution.

use axum::http::HeaderMap;
use uuid::Uuid;

use microspot_store::{StoreError, User};

use crate::api::AppState;
use crate::error::ApiError;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

/// Resolve the request's session to its user, or fail with 401.
///
/// Every mutating endpoint and every per-user read goes through here.
pub async fn require_user(headers: &HeaderMap, state: &AppState) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;

    let db = state.db.lock().await;
    let session = db.get_session(token).map_err(|e| match e {
        StoreError::NotFound => ApiError::Unauthorized,
        other => ApiError::from_store(other, "session"),
    })?;

    db.get_user(session.user_id).map_err(|e| match e {
        // Session outliving its user means the account was deleted.
        StoreError::NotFound => ApiError::Unauthorized,
        other => ApiError::from_store(other, "user"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn bearer_token_parsing() {
        let token = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token));

        let mut bare = HeaderMap::new();
        bare.insert("authorization", token.to_string().parse().unwrap());
        assert_eq!(bearer_token(&bare), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
