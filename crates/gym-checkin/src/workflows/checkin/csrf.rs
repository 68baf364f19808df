//! Double-submit CSRF token: the page embeds the same value it sets as a cookie, and a form
//! post is accepted only when both come back equal.

use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CsrfError {
    #[error("CSRF cookie not set")]
    MissingCookie,
    #[error("CSRF token missing or incorrect")]
    Mismatch,
}

impl CsrfToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_cookies(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == CSRF_COOKIE && !value.is_empty())
            .map(|(_, value)| Self(value.to_string()))
    }

    /// Checks a submitted form token against the cookie sent with the same request.
    pub fn verify(headers: &HeaderMap, submitted: &str) -> Result<Self, CsrfError> {
        let cookie = Self::from_cookies(headers).ok_or(CsrfError::MissingCookie)?;
        if submitted.is_empty() || cookie.0 != submitted {
            return Err(CsrfError::Mismatch);
        }
        Ok(cookie)
    }

    pub fn set_cookie(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{CSRF_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict",
            self.0
        ))
        .ok()
    }
}
