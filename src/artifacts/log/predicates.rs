//! Walk callbacks, commit comparators and their combinators
//!
//! Building blocks for the history walker:
//!
//! - Comparators decide commit equivalence for history simplification
//!   (see `walker::tree_comparator` and `walker::no_simplification` for
//!   the built-in ones)
//! - Callbacks decide per commit whether to take it and whether to keep
//!   following its parents
//! - Combinators wrap a callback with paging or counting behavior while
//!   preserving its error surface

use crate::areas::object_store::ObjectStore;
use crate::artifacts::log::walker::{CommitComparator, WalkCallback, WalkerAction};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::tree::is_path_not_found;
use std::cell::Cell;
use std::rc::Rc;

/// Callback that takes every commit and follows every parent
pub fn take_and_follow(_commit: &Commit) -> anyhow::Result<WalkerAction> {
    Ok(WalkerAction::TAKE_AND_FOLLOW)
}

/// Comparator scoped to a single path
///
/// Two commits are equivalent iff the object at `path` resolves to the same
/// ID in both trees. A path absent from both trees counts as equal; absent
/// from only one, or unreadable in either, counts as unequal.
pub fn make_path_comparator<'s>(
    store: &'s ObjectStore,
    path: &str,
) -> impl CommitComparator + 's {
    let path = path.to_string();

    move |current: &Commit, parent: &Commit| {
        let current_entry = store.tree_entry_at_path(current.tree_oid(), &path);
        let parent_entry = store.tree_entry_at_path(parent.tree_oid(), &path);

        match (current_entry, parent_entry) {
            (Ok(current_entry), Ok(parent_entry)) => current_entry.oid == parent_entry.oid,
            (Err(current_err), Err(parent_err)) => {
                is_path_not_found(&current_err) && is_path_not_found(&parent_err)
            }
            _ => false,
        }
    }
}

/// Callback taking only commits whose tree contains `path`
///
/// Commits without the path are still followed, so history behind its
/// introduction point is explored. Errors other than path absence abort
/// the walk.
pub fn make_path_checker<'s>(store: &'s ObjectStore, path: &str) -> impl WalkCallback + 's {
    let path = path.to_string();

    move |commit: &Commit| match store.tree_entry_at_path(commit.tree_oid(), &path) {
        Ok(_) => Ok(WalkerAction::TAKE_AND_FOLLOW),
        Err(err) if is_path_not_found(&err) => Ok(WalkerAction::FOLLOW_PARENTS),
        Err(err) => Err(err),
    }
}

/// Callback taking only commits whose message matches a regular expression
pub fn make_history_searcher(pattern: &str) -> anyhow::Result<impl WalkCallback> {
    let matcher = regex::Regex::new(pattern)?;

    Ok(move |commit: &Commit| {
        if matcher.is_match(commit.message()) {
            Ok(WalkerAction::TAKE_AND_FOLLOW)
        } else {
            Ok(WalkerAction::FOLLOW_PARENTS)
        }
    })
}

/// Wrap a callback with skip/count paging
///
/// The first `skip` commits the callback takes are let through untaken;
/// the next `count` pass unchanged, with a stop flag added to the last.
/// A `count` of zero stops at the first taken commit without taking it.
pub fn make_pager(mut callback: impl WalkCallback, skip: usize, count: usize) -> impl WalkCallback {
    let mut skip = skip;
    let mut remaining = count;

    move |commit: &Commit| {
        let mut action = callback(commit)?;

        // if the inner callback does not want this commit, neither do we
        if !action.contains(WalkerAction::TAKE_COMMIT) {
            return Ok(action);
        }

        if skip > 0 {
            skip -= 1;
            action.remove(WalkerAction::TAKE_COMMIT);
            return Ok(action);
        }

        if remaining > 0 {
            remaining -= 1;
            if remaining == 0 {
                // this is the last commit the page wants
                action.insert(WalkerAction::STOP);
            }
            return Ok(action);
        }

        Ok(WalkerAction::STOP)
    }
}

/// Wrap a callback so taken commits are counted instead of collected
///
/// Returns the wrapped callback and a getter for the running count.
pub fn make_counter(mut callback: impl WalkCallback) -> (impl WalkCallback, impl Fn() -> usize) {
    let count = Rc::new(Cell::new(0usize));
    let count_handle = Rc::clone(&count);

    let counting_callback = move |commit: &Commit| {
        let mut action = callback(commit)?;

        if action.contains(WalkerAction::TAKE_COMMIT) {
            count.set(count.get() + 1);
            action.remove(WalkerAction::TAKE_COMMIT);
        }

        Ok(action)
    };

    (counting_callback, move || count_handle.get())
}
