//! Domain models for DreamForge.
//!
//! These are the core types shared across all crates.

pub mod creation;
pub mod entitlement;
pub mod generation;
pub mod session;
pub mod subscription;
pub mod tier;
