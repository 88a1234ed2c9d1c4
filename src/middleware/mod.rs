use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ServiceError;

mod json;

pub use json::ValidatedJson;

pub const ROLE_USER: i32 = 1;
pub const ROLE_ADMIN: i32 = 2;

/// Claims carried by session tokens issued by the account service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userID")]
    pub user_id: i32,
    #[serde(rename = "roleID")]
    pub role_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Admins only. Access denied.".to_string()))
        }
    }

    pub fn require_user(&self) -> Result<(), ServiceError> {
        if self.role == Role::User {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Users only. Access denied.".to_string()))
        }
    }

    /// Owner filter for row lookups: admins see everything, users only their own rows.
    pub fn owner_scope(&self) -> Option<i32> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }

    /// Users may read their own data; admins may read anyone's.
    pub fn can_access_user(&self, user_id: i32) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = ServiceError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = match claims.role_id {
            ROLE_USER => Role::User,
            ROLE_ADMIN => Role::Admin,
            _ => return Err(ServiceError::Forbidden("Invalid or expired token".to_string())),
        };
        Ok(AuthUser { user_id: claims.user_id, role, email: claims.email })
    }
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

// Cookie first (browser front end), then the Authorization header
fn token_from_parts(parts: &Parts, cookie_name: &str) -> Option<String> {
    let from_cookie = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string());

    from_cookie.filter(|t| !t.is_empty()).or_else(|| {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jwt = &state.config.jwt;

        let token = token_from_parts(parts, &jwt.cookie_name).ok_or_else(|| {
            ServiceError::Unauthorized("Access denied. No token provided.".to_string())
        })?;

        let claims = decode_token(&token, &jwt.secret).map_err(|e| {
            tracing::debug!("token rejected: {}", e);
            ServiceError::Forbidden("Invalid or expired token".to_string())
        })?;

        AuthUser::try_from(claims)
    }
}
