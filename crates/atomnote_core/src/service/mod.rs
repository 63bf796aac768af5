//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, index and semantics calls into use-case APIs.
//! - Keep the CLI decoupled from storage details.

pub mod notes_service;
