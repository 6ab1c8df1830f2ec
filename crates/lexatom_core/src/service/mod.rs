//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate pipeline and persistence calls into use-case level
//!   APIs.
//! - Keep callers decoupled from storage and extraction details.

pub mod document_service;
