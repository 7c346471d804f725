//! Core use-case services.
//!
//! # Responsibility
//! - Run each use case as one gateway transaction over the repositories.
//! - Publish a change notice after every committed mutation.
//! - Keep host layers (FFI, CLI) decoupled from storage details.

pub mod task_list_service;
pub mod task_query;
pub mod task_service;
pub mod user_service;
