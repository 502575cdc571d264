use crate::areas::object_store::ObjectStore;
use crate::areas::repository::Repository;
use crate::artifacts::log::predicates;
use crate::artifacts::log::walker::{self, BoxedWalkCallback, WalkCallback, WalkerAction};
use crate::artifacts::objects::commit::Commit;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Revision to start from; HEAD when absent
    pub revision: Option<String>,
    /// Number of taken commits to drop before printing
    pub skip: usize,
    /// Maximum number of commits to print
    pub max_count: Option<usize>,
    /// Only print commits whose message matches this pattern
    pub grep: Option<String>,
    /// Only print commits that carry this path, simplifying away commits
    /// that leave it untouched
    pub path: Option<String>,
    /// Disable history simplification
    pub full_history: bool,
}

pub fn run(repository: &Repository, opts: &LogOptions) -> anyhow::Result<()> {
    let store = repository.store();
    let start = repository.resolve_commit(opts.revision.as_deref())?;

    let mut callback: BoxedWalkCallback<'_> = match &opts.path {
        Some(path) => Box::new(predicates::make_path_checker(store, path)),
        None => Box::new(predicates::take_and_follow),
    };

    if let Some(pattern) = &opts.grep {
        callback = Box::new(and_matches(
            callback,
            predicates::make_history_searcher(pattern)?,
        ));
    }

    let results = if opts.skip > 0 || opts.max_count.is_some() {
        let count = opts.max_count.unwrap_or(usize::MAX);
        let pager = predicates::make_pager(callback, opts.skip, count);
        walk_with(store, start, pager, opts)?
    } else {
        walk_with(store, start, callback, opts)?
    };

    for (index, commit) in results.iter().enumerate() {
        if index > 0 {
            println!();
        }
        print_commit(commit);
    }

    Ok(())
}

fn walk_with(
    store: &ObjectStore,
    start: Commit,
    callback: impl WalkCallback,
    opts: &LogOptions,
) -> anyhow::Result<Vec<Commit>> {
    if opts.full_history {
        walker::walk_filtered(store, start, callback, walker::no_simplification)
    } else if let Some(path) = &opts.path {
        let comparator = predicates::make_path_comparator(store, path);
        walker::walk_filtered(store, start, callback, comparator)
    } else {
        walker::walk(store, start, callback)
    }
}

/// Keep a commit only if both callbacks want to take it
///
/// Follow/stop flags come from the first callback; the second one is only
/// consulted about commits the first would take.
fn and_matches<'cb>(
    mut callback: BoxedWalkCallback<'cb>,
    mut filter: impl WalkCallback + 'cb,
) -> impl WalkCallback + 'cb {
    move |commit: &Commit| {
        let mut action = callback(commit)?;

        if action.contains(WalkerAction::TAKE_COMMIT)
            && !filter(commit)?.contains(WalkerAction::TAKE_COMMIT)
        {
            action.remove(WalkerAction::TAKE_COMMIT);
        }

        Ok(action)
    }
}

fn print_commit(commit: &Commit) {
    println!("commit {}", commit.oid());
    println!("Author: {}", commit.author().display_name());
    println!("Date:   {}", commit.author().readable_timestamp());
    println!();
    for line in commit.message().lines() {
        println!("    {line}");
    }
}
