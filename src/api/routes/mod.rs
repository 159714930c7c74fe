//! API Routes
//!
//! Route handlers organized by functionality.

pub mod admin;
pub mod health;
pub mod ingest;
pub mod search;
