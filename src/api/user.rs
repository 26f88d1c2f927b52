use crate::db::user::{create_user as insert_user, get_user_by_username};
use crate::models::user::{Claims, LoginDto, User, UserDto};
use crate::{api::api_error::ApiError, AppState};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use sqlx::SqlitePool;

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserDto>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Provide both username and password".into(),
        ));
    }

    let user = save_pwd_hash(&payload, &state.db_pool).await?;
    let message = format!("User {} created successfully", user.username);

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

async fn save_pwd_hash(user: &UserDto, db: &SqlitePool) -> Result<User, ApiError> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(user.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hash failed: {e}")))?
        .to_string();

    insert_user(db, &user.username, user.is_admin, &password_hash, salt.as_str()).await
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginDto>,
) -> Result<impl IntoResponse, ApiError> {
    let token = auth_and_issue_jwt(&payload, &state.db_pool, state.config.jwt_secret.as_bytes())
        .await?;

    Ok(Json(json!({ "token": token })))
}

async fn auth_and_issue_jwt(
    user_input: &LoginDto,
    db: &SqlitePool,
    jwt_secret: &[u8],
) -> Result<String, ApiError> {
    let user = get_user_by_username(db, &user_input.username)
        .await?
        .ok_or_else(|| ApiError::AccessDenied("Invalid username or password".into()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Internal(format!("stored hash unreadable: {e}")))?;
    Argon2::default()
        .verify_password(user_input.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::AccessDenied("Invalid username or password".into()))?;

    let now = Utc::now();
    let exp = now + Duration::hours(24);

    let claims = Claims {
        sub: user.id,
        role: if user.is_admin { "admin".to_owned() } else { "user".to_owned() },
        username: user.username.clone(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret),
    )
    .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))?;

    Ok(token)
}
