//! # Lazywire Support
//!
//! Shared utilities for the lazywire crates.
//!
//! This crate provides:
//! - Rendering of resolution trails for cycle errors
//! - Type-name shortening and name suggestions for error hints

pub mod rendering;
