//! Core type definitions used across the ItemHub workspace.

pub mod id;

pub use id::*;
