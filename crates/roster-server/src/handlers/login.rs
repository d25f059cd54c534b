//! `/login/` and `/logout/`.

use axum::{
  extract::State,
  response::{Html, Redirect},
};
use roster_api::extract::{Form, Query};
use roster_core::store::RecordStore;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{
  AppState, Error,
  auth::{SESSION_USER_KEY, verify_password},
};

const LOGIN_PAGE: &str = include_str!("../assets/login.html");

const DEFAULT_NEXT: &str = "/home/";

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
  match next {
    Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
    _ => DEFAULT_NEXT,
  }
}

fn escape_html(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
    .replace('\'', "&#x27;")
}

#[derive(Debug, Deserialize)]
pub struct NextParam {
  pub next: Option<String>,
}

/// `GET /login/[?next=…]`
pub async fn form(Query(params): Query<NextParam>) -> Html<String> {
  let next = escape_html(safe_next(params.next.as_deref()));
  Html(LOGIN_PAGE.replace("{{next}}", &next))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
  pub next:     Option<String>,
}

/// `POST /login/`: on success the session id is rotated before the user is
/// stored in it.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Form(form): Form<LoginForm>,
) -> Result<Redirect, Error>
where
  S: RecordStore + 'static,
{
  if verify_password(&state.auth, &form.username, &form.password).is_err() {
    warn!(user = %form.username, "failed login");
    return Err(Error::InvalidCredentials);
  }

  session.cycle_id().await?;
  session.insert(SESSION_USER_KEY, &form.username).await?;
  info!(user = %form.username, "logged in");

  Ok(Redirect::to(safe_next(form.next.as_deref())))
}

/// `POST /logout/`
pub async fn logout(session: Session) -> Result<Redirect, Error> {
  session.flush().await?;
  Ok(Redirect::to("/login/"))
}
