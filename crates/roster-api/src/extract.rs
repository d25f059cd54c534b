//! Drop-in replacements for axum's `Path`, `Query` and `Form` extractors whose
//! rejections render as `{"error": "..."}` like every other API failure.

use axum::extract::{
  FromRequest, FromRequestParts,
  rejection::{FormRejection, PathRejection, QueryRejection},
};

use crate::error::ApiError;

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct Form<T>(pub T);

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<FormRejection> for ApiError {
  fn from(r: FormRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}
