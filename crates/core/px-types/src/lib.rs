//! Core types for prefix-export.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`Entry`] - An object or a common prefix discovered by a listing
//! - [`ListRequest`] and [`Pagination`] - Immutable parameters of one listing call
//! - [`partition_id`] - Derivation of a partition name from a common prefix

pub mod entry;
pub mod partition;
pub mod request;

pub use entry::*;
pub use partition::*;
pub use request::*;
