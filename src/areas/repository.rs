//! Repository abstraction and coordination
//!
//! The `Repository` type is a facade over the lower-level components: the
//! read-only object store and the reference reader. It is the entry point
//! used by the CLI; the library pieces can also be used directly.

use crate::areas::object_store::ObjectStore;
use crate::areas::refs::Refs;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::{Path, PathBuf};

/// Git directory name
const GIT_DIR: &str = ".git";

/// A repository opened for reading
///
/// Coordinates the object store and reference resolution. Opening parses
/// every pack index up front; everything afterwards is lookups.
#[derive(Debug)]
pub struct Repository {
    /// Repository root path (the working directory, not `.git`)
    path: Box<Path>,
    /// Read-only object database
    store: ObjectStore,
    /// Reference reader
    refs: Refs,
}

impl Repository {
    /// Open the repository whose working directory is at `path`
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let path = path.canonicalize()?;
        let git_path = path.join(GIT_DIR);
        if !git_path.is_dir() {
            return Err(anyhow::anyhow!(
                "Not a git repository: {}",
                path.display()
            ));
        }

        let store = ObjectStore::open(&git_path)?;
        let refs = Refs::new(git_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            store,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Resolve a revision string to an object ID, defaulting to HEAD
    pub fn resolve(&self, revision: Option<&str>) -> anyhow::Result<ObjectId> {
        match revision {
            Some(revision) => self.refs.resolve(revision),
            None => self.refs.head(),
        }
    }

    /// Resolve a revision string to its commit, defaulting to HEAD
    pub fn resolve_commit(&self, revision: Option<&str>) -> anyhow::Result<Commit> {
        let oid = self.resolve(revision)?;
        self.store.parse_commit(&oid)
    }
}
