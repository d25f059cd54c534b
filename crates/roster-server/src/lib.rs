//! HTTP front end for Roster.
//!
//! Exposes an axum [`Router`] serving the page endpoints, the QR scan
//! endpoint, media files and the JSON API (nested at `/api`), all behind a
//! login session or HTTP Basic auth, backed by any [`RecordStore`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod media;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  middleware,
  response::Redirect,
  routing::{any, get, post},
};
use roster_core::{registry::Registry, store::RecordStore};
use roster_image::QrRenderer;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{
  Expiry, MemoryStore, SessionManagerLayer,
  cookie::{SameSite, time::Duration},
};

use auth::{AuthConfig, Authenticated};
use handlers::{login, records, reports, scan};
use media::FsBlobStore;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Root of the `images/` and `qrcodes/` directories, served at `/media/`.
  pub media_dir:          PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// Mark the session cookie `Secure`; enable when served over HTTPS.
  #[serde(default)]
  pub secure_cookies:     bool,
}

// ─── Application state ───────────────────────────────────────────────────────

/// The record service as wired by this server.
pub type AppRegistry<S> = Registry<S, FsBlobStore, QrRenderer>;

/// Shared state threaded through all axum handlers.
pub struct AppState<S: RecordStore> {
  pub registry: Arc<AppRegistry<S>>,
  pub config:   Arc<ServerConfig>,
  pub auth:     Arc<AuthConfig>,
}

// Not derived: a derive would require `S: Clone`.
impl<S: RecordStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      registry: self.registry.clone(),
      config:   self.config.clone(),
      auth:     self.auth.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let sessions = SessionManagerLayer::new(MemoryStore::default())
    .with_secure(state.config.secure_cookies)
    .with_same_site(SameSite::Lax)
    .with_expiry(Expiry::OnInactivity(Duration::hours(12)));

  let protected = Router::new()
    .route("/", get(|| async { Redirect::to("/home/") }))
    .route("/home/", get(records::home::<S>))
    .route("/full-details/{id}/", get(records::full_details::<S>))
    .route("/generate-card/{id}/", get(records::generate_card::<S>))
    .route("/add-user/", post(records::add_user::<S>))
    .route("/update-student/{id}/", post(records::update_student::<S>))
    .route(
      "/delete-student/{id}/",
      get(records::confirm_delete::<S>).post(records::delete_student::<S>),
    )
    .route("/auth/", get(scan::identify))
    .route("/process_qr/", any(scan::process_qr::<S>))
    .route("/export-csv/", get(reports::export_csv::<S>))
    .route("/dashboard/", get(reports::dashboard::<S>))
    .route("/department/{department}/", get(reports::department::<S>))
    .nest_service("/media", ServeDir::new(&state.config.media_dir))
    .nest_service("/api", roster_api::api_router(state.registry.clone()))
    .route_layer(middleware::from_extractor_with_state::<Authenticated, _>(
      state.clone(),
    ));

  let public = Router::new()
    .route("/login/", get(login::form).post(login::submit::<S>))
    .route("/logout/", post(login::logout));

  protected
    .merge(public)
    .layer(DefaultBodyLimit::max(roster_api::MAX_BODY_BYTES))
    .with_state(state)
    .layer(sessions)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
