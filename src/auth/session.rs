//! Signed cookie payloads: the login session and the in-flight OAuth state.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const SESSION_COOKIE: &str = "orsa_session";
pub const LOGIN_STATE_COOKIE: &str = "orsa_login_state";

pub const SESSION_TTL_SECS: i64 = 7 * 24 * 3600;
pub const LOGIN_STATE_TTL_SECS: i64 = 600;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Session,
    LoginState,
}

/// Identity kept in the session cookie after a successful login.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionUser {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub user: SessionUser,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginStateClaims {
    pub state: String,
    pub verifier: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
}

pub fn create_session_token(user: SessionUser, secret: &str) -> AppResult<String> {
    let now = Utc::now();
    let claims = SessionClaims {
        user,
        exp: (now + Duration::seconds(SESSION_TTL_SECS)).timestamp(),
        iat: now.timestamp(),
        token_type: TokenType::Session,
    };
    sign(&claims, secret)
}

pub fn create_login_state_token(state: &str, verifier: &str, secret: &str) -> AppResult<String> {
    let now = Utc::now();
    let claims = LoginStateClaims {
        state: state.to_string(),
        verifier: verifier.to_string(),
        exp: (now + Duration::seconds(LOGIN_STATE_TTL_SECS)).timestamp(),
        iat: now.timestamp(),
        token_type: TokenType::LoginState,
    };
    sign(&claims, secret)
}

pub fn verify_session_token(token: &str, secret: &str) -> AppResult<SessionUser> {
    let claims: SessionClaims = verify(token, secret)?;
    if claims.token_type != TokenType::Session {
        return Err(AppError::Unauthorized);
    }
    Ok(claims.user)
}

pub fn verify_login_state_token(token: &str, secret: &str) -> AppResult<LoginStateClaims> {
    let claims: LoginStateClaims = verify(token, secret)?;
    if claims.token_type != TokenType::LoginState {
        return Err(AppError::Unauthorized);
    }
    Ok(claims)
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> AppResult<T> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn user() -> SessionUser {
        SessionUser {
            sub: "1234567890".into(),
            email: Some("aki@example.com".into()),
            name: Some("Aki".into()),
            picture: None,
        }
    }

    #[test]
    fn test_session_round_trip() {
        let token = create_session_token(user(), SECRET).unwrap();
        assert_eq!(verify_session_token(&token, SECRET).unwrap(), user());
    }

    #[test]
    fn test_session_wrong_secret_rejected() {
        let token = create_session_token(user(), SECRET).unwrap();
        assert!(matches!(
            verify_session_token(&token, "other"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_token_types_not_interchangeable() {
        let state = create_login_state_token("abc", "verifier", SECRET).unwrap();
        assert!(verify_session_token(&state, SECRET).is_err());

        let session = create_session_token(user(), SECRET).unwrap();
        assert!(verify_login_state_token(&session, SECRET).is_err());
    }

    #[test]
    fn test_login_state_carries_values() {
        let token = create_login_state_token("abc", "verifier", SECRET).unwrap();
        let claims = verify_login_state_token(&token, SECRET).unwrap();
        assert_eq!(claims.state, "abc");
        assert_eq!(claims.verifier, "verifier");
    }
}
