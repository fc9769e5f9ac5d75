//! services/api/src/lib.rs
//!
//! The study notes HTTP service: configuration, adapters for the completion
//! API and the file system, the note pipeline and the REST surface.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
