use super::auth::{AuthToken, AuthTokenValue, UsernamePasswordCredentials};
use super::user_models::{NewUser, User};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the password credentials of the user with the given handle.
    /// Returns Ok(None) if the user does not exist or has no password.
    fn get_password_credentials(&self, user_handle: &str)
        -> Result<Option<UsernamePasswordCredentials>>;

    /// Inserts or replaces the password credentials of a user.
    fn set_password_credentials(&self, credentials: &UsernamePasswordCredentials) -> Result<()>;

    /// Records a login attempt, successful or not.
    fn touch_password_credentials(&self, user_id: usize, succeeded: bool) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token, returning it.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    fn add_user_auth_token(&self, token: &AuthToken) -> Result<()>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    /// Fails if the handle or the email is already taken (case-insensitive).
    fn create_user(&self, user: &NewUser) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: usize) -> Result<Option<User>>;

    /// Looks a handle up, ignoring case.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    /// Whether a user with this email exists, ignoring case.
    fn is_email_taken(&self, email: &str) -> Result<bool>;

    fn get_users_count(&self) -> Result<usize>;
}
