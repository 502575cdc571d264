//! Core repository components
//!
//! This module contains the read-side building blocks of a Git repository:
//!
//! - `object_store`: object database lookups over loose files and packs
//! - `refs`: reference resolution (HEAD, branches, tags, packed-refs)
//! - `repository`: repository discovery and coordination

pub mod object_store;
pub mod refs;
pub mod repository;
