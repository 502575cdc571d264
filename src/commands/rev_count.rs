use crate::areas::repository::Repository;
use crate::artifacts::log::predicates;
use crate::artifacts::log::walker::{self, BoxedWalkCallback};

pub fn run(
    repository: &Repository,
    revision: Option<&str>,
    path: Option<&str>,
) -> anyhow::Result<()> {
    let store = repository.store();
    let start = repository.resolve_commit(revision)?;

    let callback: BoxedWalkCallback<'_> = match path {
        Some(path) => Box::new(predicates::make_path_checker(store, path)),
        None => Box::new(predicates::take_and_follow),
    };
    let (counter, count) = predicates::make_counter(callback);

    match path {
        Some(path) => {
            let comparator = predicates::make_path_comparator(store, path);
            walker::walk_filtered(store, start, counter, comparator)?;
        }
        None => {
            walker::walk_filtered(store, start, counter, walker::no_simplification)?;
        }
    }

    println!("{}", count());
    Ok(())
}
