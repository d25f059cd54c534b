//! Authentication: a login session for browsers, HTTP Basic for scripts.
//!
//! There is one administrative account, configured as a username and an
//! argon2 PHC hash. A request is authenticated if its session carries that
//! username or if it presents matching Basic credentials.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use roster_core::store::RecordStore;
use tower_sessions::Session;

use crate::{AppState, error::Error};

/// Session key holding the logged-in username.
pub const SESSION_USER_KEY: &str = "user";

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Zero-size marker: present in the handler means the request was authenticated.
pub struct Authenticated;

/// Check a username/password pair against the configured account.
pub fn verify_password(config: &AuthConfig, username: &str, password: &str) -> Result<(), Error> {
  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

/// Username and password from an `Authorization: Basic …` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let decoded = B64.decode(value.strip_prefix("Basic ")?).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (user, pass) = creds.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

/// Verify HTTP Basic credentials from headers.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let (username, password) = basic_credentials(headers).ok_or(Error::Unauthorized)?;
  verify_password(config, &username, &password)
}

/// Whether `session` belongs to the configured account.
pub async fn session_user_matches(session: &Session, config: &AuthConfig) -> Result<bool, Error> {
  let user: Option<String> = session.get(SESSION_USER_KEY).await?;
  Ok(user.is_some_and(|u| u == config.username))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: RecordStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    if let Some(session) = parts.extensions.get::<Session>()
      && session_user_matches(session, &state.auth).await?
    {
      return Ok(Authenticated);
    }

    if verify_auth(&parts.headers, &state.auth).is_ok() {
      return Ok(Authenticated);
    }

    let path = parts.uri.path();
    if path == "/api" || path.starts_with("/api/") {
      Err(Error::Unauthorized)
    } else {
      let next = parts
        .uri
        .path_and_query()
        .map_or_else(|| path.to_owned(), |pq| pq.as_str().to_owned());
      Err(Error::LoginRequired { next })
    }
  }
}
