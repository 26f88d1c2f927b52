use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::{api::api_error::ApiError, models::user::Claims, AppState};

#[derive(Debug)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::AccessDenied("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::AccessDenied("Invalid auth header".into()))?;

        // Verify against the same secret login signs with.
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| ApiError::AccessDenied("Invalid token".into()))?;

        Ok(AuthUser(token_data.claims))
    }
}

/// Same extraction, plus an admin role check.
#[derive(Debug)]
pub struct AdminUser(pub Claims);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;

        if claims.role != "admin" {
            return Err(ApiError::AccessDenied("Admin access required".into()));
        }

        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::UserLocks;
    use crate::testutil::test_pool;
    use axum::http::Request;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::sync::Arc;

    async fn state_with_secret(secret: &str) -> AppState {
        AppState {
            db_pool: test_pool().await,
            config: Arc::new(Config {
                database_url: "sqlite::memory:".into(),
                host: "127.0.0.1".into(),
                port: 0,
                jwt_secret: secret.into(),
            }),
            locks: UserLocks::default(),
        }
    }

    fn signed_token(secret: &str, role: &str) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: 7,
            role: role.into(),
            username: "ana".into(),
            iat: now,
            exp: now + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign token")
    }

    fn bearer_parts(token: &str) -> Parts {
        Request::builder()
            .header(axum::http::header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .expect("request")
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn token_signed_with_configured_secret_is_accepted() {
        let state = state_with_secret("configured-secret").await;
        let mut parts = bearer_parts(&signed_token("configured-secret", "user"));

        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("valid token");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "ana");
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let state = state_with_secret("configured-secret").await;
        let mut parts = bearer_parts(&signed_token("some-other-secret", "user"));

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn admin_extractor_rejects_non_admin_claims() {
        let state = state_with_secret("configured-secret").await;

        let mut parts = bearer_parts(&signed_token("configured-secret", "user"));
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));

        let mut parts = bearer_parts(&signed_token("configured-secret", "admin"));
        AdminUser::from_request_parts(&mut parts, &state)
            .await
            .expect("admin token");
    }
}
