//! Core data models for the file-sharing service.
//!
//! `File` maps to the `files` table via `sqlx::FromRow` and serializes as
//! camelCase JSON via `serde`.

pub mod file;
pub mod principal;
pub mod upload;
