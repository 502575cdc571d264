//! Git data structures and algorithms
//!
//! This module contains the core types and algorithms:
//!
//! - `log`: commit history traversal and filtering
//! - `objects`: object model (IDs, types, commits, trees)
//! - `pack`: pack file and pack index access

pub mod log;
pub mod objects;
pub mod pack;
