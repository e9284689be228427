//! Shared foundational types used across the vcdx workspace.
//!
//! This crate provides the 4-state logic code stored in change logs, content
//! hashing for round-trip verification, and the common internal result type.

#![warn(missing_docs)]

pub mod hash;
pub mod logic;
pub mod result;

pub use hash::{ContentHash, ContentHasher};
pub use logic::Logic;
pub use result::{InternalError, VcdxResult};
