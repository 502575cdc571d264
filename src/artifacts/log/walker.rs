//! Commit history walker
//!
//! A priority-ordered traversal of the commit graph from one or more
//! starting commits. Each visited commit goes through a caller-supplied
//! callback deciding whether to keep it, follow its parents, or stop; a
//! commit comparator collapses chains of equivalent commits into a single
//! representative ("history simplification", as described in the History
//! Simplification chapter of git-log).
//!
//! ## Algorithm
//!
//! Until the frontier empties or the callback says stop:
//!
//! 1. Simplify: replace each frontier commit by the nearest parent it is
//!    equivalent to, dropping branches that reach already-seen commits
//! 2. Extract the frontier commit with the newest committer timestamp
//! 3. Invoke the callback and act on the returned flags
//! 4. On follow, merge the commit's parents into the frontier, dropping
//!    parents equivalent to a commit already there
//!
//! The `seen` set guarantees every commit is yielded at most once, which
//! also bounds the traversal on malformed graphs containing cycles.

use crate::areas::object_store::ObjectStore;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::collections::HashSet;

bitflags! {
    /// Per-commit decision returned by a walk callback
    ///
    /// The empty set means "drop this commit and do not follow its parents".
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WalkerAction: u8 {
        /// Append the commit to the results
        const TAKE_COMMIT = 1 << 0;
        /// Merge the commit's parents into the frontier
        const FOLLOW_PARENTS = 1 << 1;
        /// Return immediately with the results gathered so far
        const STOP = 1 << 2;

        /// Take the commit and follow its parents
        const TAKE_AND_FOLLOW = Self::TAKE_COMMIT.bits() | Self::FOLLOW_PARENTS.bits();
    }
}

/// Commit equivalence predicate driving history simplification
///
/// Returning true means the current commit adds nothing over the given
/// parent and can be folded away.
pub trait CommitComparator: Fn(&Commit, &Commit) -> bool {}
impl<F: Fn(&Commit, &Commit) -> bool> CommitComparator for F {}

/// Per-commit visitor callback
pub trait WalkCallback: FnMut(&Commit) -> anyhow::Result<WalkerAction> {}
impl<F: FnMut(&Commit) -> anyhow::Result<WalkerAction>> WalkCallback for F {}

/// Boxed walk callback, for composing callbacks picked at runtime
pub type BoxedWalkCallback<'cb> = Box<dyn FnMut(&Commit) -> anyhow::Result<WalkerAction> + 'cb>;

/// Walk history from a single commit with the default simplification
///
/// Commits whose root tree equals a parent's root tree are folded away.
pub fn walk(
    store: &ObjectStore,
    start: Commit,
    callback: impl WalkCallback,
) -> anyhow::Result<Vec<Commit>> {
    walk_roots(store, vec![start], callback, tree_comparator)
}

/// Walk history from a single commit with a caller-supplied comparator
pub fn walk_filtered(
    store: &ObjectStore,
    start: Commit,
    callback: impl WalkCallback,
    comparator: impl CommitComparator,
) -> anyhow::Result<Vec<Commit>> {
    walk_roots(store, vec![start], callback, comparator)
}

/// Default comparator: two commits are equivalent iff their root trees match
pub fn tree_comparator(current: &Commit, parent: &Commit) -> bool {
    current.tree_oid() == parent.tree_oid()
}

/// Comparator that never considers commits equivalent (no simplification)
pub fn no_simplification(_current: &Commit, _parent: &Commit) -> bool {
    false
}

/// Walk history from a set of pairwise non-equivalent starting commits
///
/// Returns the visited commits in visit order. Any error from the callback
/// or from loading a parent aborts the walk with no partial results.
pub fn walk_roots(
    store: &ObjectStore,
    roots: Vec<Commit>,
    mut callback: impl WalkCallback,
    comparator: impl CommitComparator,
) -> anyhow::Result<Vec<Commit>> {
    let mut results = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut roots = roots;

    loop {
        if roots.is_empty() {
            return Ok(results);
        }

        roots = simplify_roots(store, roots, &comparator, &mut seen)?;
        let Some(next) = extract_newest_commit(&mut roots) else {
            // simplification emptied the frontier
            continue;
        };

        let action = callback(&next)?;

        if action.contains(WalkerAction::TAKE_COMMIT) {
            seen.insert(*next.oid());
            results.push(next.clone());
        }

        if action.contains(WalkerAction::FOLLOW_PARENTS) {
            let parents = load_parents(store, &next)?;
            roots = merge_roots(roots, parents, &comparator, &mut seen);
        }

        if action.contains(WalkerAction::STOP) {
            return Ok(results);
        }
    }
}

fn load_parents(store: &ObjectStore, commit: &Commit) -> anyhow::Result<Vec<Commit>> {
    commit
        .parents()
        .iter()
        .map(|oid| store.parse_commit(oid))
        .collect()
}

/// Replace each root by its simplified representative, dropping dead branches
fn simplify_roots(
    store: &ObjectStore,
    roots: Vec<Commit>,
    comparator: &impl CommitComparator,
    seen: &mut HashSet<ObjectId>,
) -> anyhow::Result<Vec<Commit>> {
    let mut new_roots = Vec::with_capacity(roots.len());

    for commit in roots {
        if let Some(commit) = skip_equal_commits(store, commit, comparator, seen)? {
            new_roots.push(commit);
        }
    }

    Ok(new_roots)
}

/// Slide down a chain of commits equivalent to one of their parents
///
/// Every skipped commit is marked seen; reaching an already-seen commit
/// drops the branch entirely. A root commit (no parents) is kept as-is.
fn skip_equal_commits(
    store: &ObjectStore,
    mut commit: Commit,
    comparator: &impl CommitComparator,
    seen: &mut HashSet<ObjectId>,
) -> anyhow::Result<Option<Commit>> {
    loop {
        if seen.contains(commit.oid()) {
            return Ok(None);
        }

        if commit.parent_count() == 0 {
            return Ok(Some(commit));
        }

        let mut equal_parent = None;
        for parent_oid in commit.parents() {
            let parent = store.parse_commit(parent_oid)?;
            if comparator(&commit, &parent) {
                equal_parent = Some(parent);
                break;
            }
        }

        match equal_parent {
            Some(parent) => {
                // the parent carries the same content; remember the current
                // commit as visited and continue from the parent
                seen.insert(*commit.oid());
                commit = parent;
            }
            None => return Ok(Some(commit)),
        }
    }
}

/// Merge freshly loaded parents into the frontier
///
/// The frontier is already pairwise non-equivalent, so each parent is only
/// tested against it, not against the other parents. An equivalent parent
/// is dropped and marked seen.
fn merge_roots(
    mut roots: Vec<Commit>,
    parents: Vec<Commit>,
    comparator: &impl CommitComparator,
    seen: &mut HashSet<ObjectId>,
) -> Vec<Commit> {
    let base_len = roots.len();

    for parent in parents {
        let equivalent = roots[..base_len]
            .iter()
            .any(|item| comparator(&parent, item));

        if equivalent {
            seen.insert(*parent.oid());
        } else {
            roots.push(parent);
        }
    }

    roots
}

/// Remove and return the frontier commit with the newest committer timestamp
///
/// Ties resolve to the first occurrence.
fn extract_newest_commit(roots: &mut Vec<Commit>) -> Option<Commit> {
    if roots.is_empty() {
        return None;
    }

    let mut target = 0;
    for index in 1..roots.len() {
        if roots[index].timestamp() > roots[target].timestamp() {
            target = index;
        }
    }

    Some(roots.remove(target))
}
