mod auth;
mod sqlite_user_store;
mod user_manager;
mod user_models;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, LmnHasher, UsernamePasswordCredentials};
pub use sqlite_user_store::{SqliteUserStore, USER_VERSIONED_SCHEMAS};
pub use user_manager::{RegistrationError, UserManager};
pub use user_models::{NewUser, RegistrationForm, User};
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
