//! Core types and trait definitions for the Roster records service.
//!
//! This crate is deliberately free of HTTP, database and imaging
//! dependencies. Storage backends, the QR renderer and the web layers all
//! plug into the traits defined here; [`registry::Registry`] ties them
//! together.

pub mod artifact;
pub mod blob;
pub mod error;
pub mod export;
pub mod form;
pub mod page;
pub mod record;
pub mod registry;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
