//! Session tokens: HS256 JWTs carried in an HttpOnly cookie or a bearer
//! header.

use anyhow::Result;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Invalid,
    Expired,
}

pub struct AuthSettings {
    secret: String,
    ttl_days: i64,
    cookie_name: String,
    secure_cookies: bool,
}

impl AuthSettings {
    pub fn new(
        secret: impl Into<String>,
        ttl_days: i64,
        cookie_name: impl Into<String>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            secret: secret.into(),
            ttl_days,
            cookie_name: cookie_name.into(),
            secure_cookies,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let environment = config.server.environment;
        let secret = config.auth.resolve_secret(environment)?;
        Ok(Self::new(
            secret,
            config.auth.token_ttl_days,
            config.auth.cookie_name.clone(),
            environment.is_production(),
        ))
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue(&self, user_id: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        self.encode(&Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_days * 24 * 60 * 60,
        })
    }

    fn encode(&self, claims: &Claims) -> Result<String> {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }

    /// `Set-Cookie` value carrying a freshly issued token.
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; Max-Age={}; {}",
            self.cookie_name,
            token,
            self.ttl_days * 24 * 60 * 60,
            self.same_site()
        )
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=none; Path=/; HttpOnly; Max-Age=0; {}",
            self.cookie_name,
            self.same_site()
        )
    }

    fn same_site(&self) -> &'static str {
        if self.secure_cookies {
            "Secure; SameSite=None"
        } else {
            "SameSite=Lax"
        }
    }

    /// The session cookie wins over an `Authorization: Bearer` header.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, &self.cookie_name).or_else(|| bearer_token(headers))
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn settings() -> AuthSettings {
        AuthSettings::new("test-secret", 7, "token", false)
    }

    #[test]
    fn test_issue_and_verify() {
        let auth = settings();
        let token = auth.issue("user-1").unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = settings().issue("user-1").unwrap();
        let other = AuthSettings::new("other-secret", 7, "token", false);
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
        assert_eq!(settings().verify("garbage"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token() {
        let auth = settings();
        let past = Utc::now().timestamp() - 3 * 24 * 60 * 60;
        let token = auth
            .encode(&Claims {
                sub: "user-1".to_string(),
                iat: past - 60,
                exp: past,
            })
            .unwrap();
        assert_eq!(auth.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_cookie_attributes() {
        let dev = settings().session_cookie("abc");
        assert!(dev.starts_with("token=abc; Path=/; HttpOnly"));
        assert!(dev.ends_with("SameSite=Lax"));

        let prod = AuthSettings::new("s", 7, "token", true).session_cookie("abc");
        assert!(prod.contains("Secure; SameSite=None"));
        assert!(settings().clear_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_token_sources() {
        let auth = settings();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        assert_eq!(auth.token_from_headers(&headers).as_deref(), Some("header-token"));

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=cookie-token"));
        assert_eq!(auth.token_from_headers(&headers).as_deref(), Some("cookie-token"));

        let mut empty = HeaderMap::new();
        empty.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(auth.token_from_headers(&empty), None);
    }
}
