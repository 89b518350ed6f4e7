//! Registration, login and user profiles.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, response, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info};

use super::error_response::error_response;
use super::metrics;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::state::{GuardedUserManager, ServerState};
use crate::concert_store::Note;
use crate::notes::NoteService;
use crate::service_error::{EntityKind, ServiceError, ServiceResult};
use crate::user::{AuthToken, AuthTokenValue, RegistrationForm, User};

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
    user_id: usize,
}

/// What anybody may see about a user.
#[derive(Serialize)]
struct PublicUser {
    id: usize,
    handle: String,
    first_name: String,
    last_name: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            handle: user.handle,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Serialize)]
struct UserProfile {
    user: PublicUser,
    notes: Vec<Note>,
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// 201 with the token in the body and in the session cookie.
fn logged_in_response(auth_token: AuthToken) -> Response {
    let body = LoginSuccessResponse {
        token: auth_token.value.0.clone(),
        user_id: auth_token.user_id,
    };
    let body = match serde_json::to_string(&body) {
        Ok(body) => body,
        Err(err) => {
            error!("Failed to serialize login response: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    response::Builder::new()
        .status(StatusCode::CREATED)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::SET_COOKIE, session_cookie(auth_token.value.0).to_string())
        .body(Body::from(body))
        .unwrap_or_else(|err| {
            error!("Failed to build login response: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    Json(form): Json<RegistrationForm>,
) -> Response {
    let username = form.username.trim().to_string();
    let password = form.password1.clone();
    let user_id = match user_manager.register(form) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };

    // A fresh account starts out logged in.
    match user_manager.login(&username, &password) {
        Ok(Some(auth_token)) => logged_in_response(auth_token),
        Ok(None) => {
            error!("Could not log in freshly registered user {}", user_id);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(err) => {
            error!("Error logging in user {}: {:#}", user_id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.username);
    let start = Instant::now();

    match user_manager.login(&body.username, &body.password) {
        Ok(Some(auth_token)) => {
            metrics::record_login_attempt("success", start.elapsed());
            info!("User {} logged in", auth_token.user_id);
            logged_in_response(auth_token)
        }
        Ok(None) => {
            metrics::record_login_attempt("failure", start.elapsed());
            error_response(StatusCode::FORBIDDEN, "Invalid username or password")
        }
        Err(err) => {
            metrics::record_login_attempt("error", start.elapsed());
            error!("Error with login: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Where anonymous callers of protected routes end up.
async fn login_required() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Authentication required")
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager.logout(&AuthTokenValue(session.token)) {
        Ok(_) => {
            let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
                .same_site(SameSite::Lax)
                .build();

            ([(header::SET_COOKIE, cookie.to_string())], StatusCode::OK).into_response()
        }
        Err(err) => {
            error!("Failed to log user {} out: {:#}", session.user_id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_user_profile(
    State(user_manager): State<GuardedUserManager>,
    State(notes): State<NoteService>,
    Path(user_id): Path<usize>,
) -> ServiceResult<Json<UserProfile>> {
    let user = user_manager
        .get_user(user_id)?
        .ok_or(ServiceError::not_found(EntityKind::User, user_id as i64))?;
    let notes = notes.list_notes_for_user(user_id)?;
    Ok(Json(UserProfile {
        user: user.into(),
        notes,
    }))
}

async fn get_my_profile(session: Session) -> Redirect {
    Redirect::to(&format!("/v1/users/{}", session.user_id))
}

pub fn make_auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", get(login_required).post(login))
        .route("/logout", get(logout))
}

pub fn make_user_routes() -> Router<ServerState> {
    Router::new()
        .route("/me", get(get_my_profile))
        .route("/{id}", get(get_user_profile))
}
