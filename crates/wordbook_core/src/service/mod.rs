//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into the merge engine and the review pass.
//! - Keep the command layer decoupled from storage details.

pub mod review_service;
pub mod word_service;
