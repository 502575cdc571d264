//! lore — read-only access to Git repositories
//!
//! Two tightly coupled subsystems:
//!
//! - The object access layer: pack-index parsing, pack-file offset
//!   resolution, zlib inflate, delta application and loose-object reading,
//!   unified behind [`areas::object_store::ObjectStore`]
//! - The history walker: a priority-ordered traversal of the commit graph
//!   with pluggable per-commit callbacks and history simplification, in
//!   [`artifacts::log`]
//!
//! The crate never writes to a repository.

pub mod areas;
pub mod artifacts;
pub mod commands;
