//! Commit history traversal
//!
//! This module implements the core `log`-style functionality:
//!
//! - `walker`: priority-ordered traversal of the commit graph with history
//!   simplification
//! - `predicates`: built-in callbacks, comparators and combinators (path
//!   scoping, message search, paging, counting)
//!
//! ## Algorithm
//!
//! The traversal keeps a frontier of candidate commits ordered by committer
//! timestamp, supporting:
//! - Multiple starting commits
//! - Pluggable per-commit decisions (take / follow parents / stop)
//! - History simplification via a commit-equivalence comparator
//! - Proper handling of merge commits and complex histories

pub mod predicates;
pub mod walker;
