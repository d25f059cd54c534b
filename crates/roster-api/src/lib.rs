//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by a [`Registry`] over any
//! [`RecordStore`], [`BlobStore`] and [`ArtifactRenderer`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest_service("/api", roster_api::api_router(registry.clone()))
//! ```

pub mod choices;
pub mod error;
pub mod extract;
pub mod form;
pub mod stats;
pub mod students;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use roster_core::{
  artifact::ArtifactRenderer, blob::BlobStore, registry::Registry, store::RecordStore,
};

pub use error::ApiError;

/// Largest accepted request body; photos arrive inline in multipart forms.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build a fully-materialised API router for `registry`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, B, R>(registry: Arc<Registry<S, B, R>>) -> Router<()>
where
  S: RecordStore + 'static,
  B: BlobStore + 'static,
  R: ArtifactRenderer + 'static,
{
  Router::new()
    .route(
      "/students/",
      get(students::list::<S, B, R>).post(students::create::<S, B, R>),
    )
    .route("/students/stats/", get(stats::handler::<S, B, R>))
    .route(
      "/students/{id}/",
      get(students::get_one::<S, B, R>)
        .put(students::replace::<S, B, R>)
        .delete(students::delete::<S, B, R>),
    )
    .route("/choices/", get(choices::handler))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(registry)
}
