use super::state::ServerState;
use crate::user::AuthTokenValue;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{debug, error};

#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";
pub const LOGIN_PATH: &str = "/v1/auth/login";

pub enum SessionExtractionError {
    /// Anonymous caller, sent to the login endpoint.
    LoginRequired,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::LoginRequired => Redirect::to(LOGIN_PATH).into_response(),
            SessionExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?;
    let value = String::from_utf8_lossy(value.as_bytes());
    let token = value.strip_prefix("Bearer ").unwrap_or(&value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

async fn extract_session_from_request_parts(
    parts: &Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    let token = match extract_session_token_from_cookies(parts)
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return Ok(None);
        }
        Some(x) => x,
    };

    let auth_token_value = AuthTokenValue(token.clone());
    match ctx.user_manager.resolve_session(&auth_token_value) {
        Ok(Some(user_id)) => {
            debug!("Resolved session of user_id={}", user_id);
            Ok(Some(Session { user_id, token }))
        }
        Ok(None) => {
            debug!("Auth token not found in database");
            Ok(None)
        }
        Err(err) => {
            error!("Failed to resolve session token: {:#}", err);
            Err(SessionExtractionError::InternalError)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await?
            .ok_or(SessionExtractionError::LoginRequired)
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn reads_token_from_cookie() {
        let parts = parts_with_header("cookie", "theme=dark; session_token=abc123");
        assert_eq!(
            extract_session_token_from_cookies(&parts),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn reads_token_from_authorization_header() {
        let parts = parts_with_header("Authorization", "abc123");
        assert_eq!(
            extract_session_token_from_headers(&parts),
            Some("abc123".to_string())
        );

        let parts = parts_with_header("Authorization", "Bearer abc123");
        assert_eq!(
            extract_session_token_from_headers(&parts),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn empty_tokens_are_ignored() {
        let parts = parts_with_header("cookie", "session_token=");
        assert_eq!(extract_session_token_from_cookies(&parts), None);

        let parts = parts_with_header("Authorization", "  ");
        assert_eq!(extract_session_token_from_headers(&parts), None);
    }

    #[test]
    fn anonymous_callers_are_redirected_to_login() {
        let response = SessionExtractionError::LoginRequired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], LOGIN_PATH);
    }
}
