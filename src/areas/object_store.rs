//! Object store for Git objects
//!
//! The store reads content-addressable objects identified by their SHA-1
//! hash, stored either as loose files or inside pack files.
//!
//! ## Storage Format
//!
//! - Loose: `objects/ab/cdef123...` (first 2 hex chars as directory), zlib
//!   compressed, content preceded by a `"<type> <size>\0"` header
//! - Packed: `objects/pack/pack-*.pack` with a sibling `pack-*.idx` mapping
//!   object IDs to byte offsets
//!
//! All pack indexes are parsed when the store opens; lookups probe them in
//! memory before falling back to the loose layout. The store never writes.

use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::RawObject;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::{PathNotFound, Tree, TreeEntry};
use crate::artifacts::pack::index::PackIndex;
use crate::artifacts::pack::{inflate, reader};
use anyhow::Context;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Object database directory name
const OBJECTS_DIR: &str = "objects";

/// Pack directory name inside the object database
const PACK_DIR: &str = "pack";

/// Read-only Git object store
///
/// Holds the parsed pack indexes. The index map is immutable after
/// [`ObjectStore::open`], so a store may be shared by any number of
/// concurrent readers.
#[derive(Debug)]
pub struct ObjectStore {
    /// Path to the objects directory (typically `.git/objects`)
    objects_path: PathBuf,
    /// Parsed pack indexes, keyed by index path so a pack path resolves to
    /// its index by suffix rewrite
    indexes: HashMap<PathBuf, PackIndex>,
}

impl ObjectStore {
    /// Open the object store under a repository root
    ///
    /// Enumerates and parses every `objects/pack/*.idx`; a corrupt index is
    /// a fatal error rather than a skipped file.
    ///
    /// # Arguments
    ///
    /// * `root` - Repository root containing the `objects` directory
    ///   (typically the `.git` directory)
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let objects_path = root.join(OBJECTS_DIR);
        if !objects_path.is_dir() {
            return Err(anyhow::anyhow!(
                "Not an object database: {}",
                objects_path.display()
            ));
        }

        let mut indexes = HashMap::new();
        let pack_dir = objects_path.join(PACK_DIR);
        if pack_dir.is_dir() {
            for entry in std::fs::read_dir(&pack_dir)
                .context(format!("Unable to list pack directory {}", pack_dir.display()))?
            {
                let path = entry?.path();
                if path.extension().and_then(|extension| extension.to_str()) == Some("idx") {
                    let index = PackIndex::open(&path)?;
                    indexes.insert(path, index);
                }
            }
        }

        Ok(ObjectStore {
            objects_path,
            indexes,
        })
    }

    /// Get the path to the objects directory
    pub fn objects_path(&self) -> &Path {
        &self.objects_path
    }

    /// Read an object by ID
    ///
    /// Probes every pack index first, then the loose layout. With
    /// `size_only`, returns the type and logical length without a content
    /// stream, releasing all file handles before returning.
    ///
    /// # Arguments
    ///
    /// * `id` - The SHA-1 hash identifying the object
    /// * `size_only` - Skip materializing the content
    pub fn read(&self, id: &ObjectId, size_only: bool) -> anyhow::Result<RawObject> {
        for index in self.indexes.values() {
            if let Some(offset) = index.offset_of(id) {
                return reader::read_pack_object(index.pack_path(), &self.indexes, offset, size_only);
            }
        }

        self.read_loose(id, size_only)
    }

    /// Check whether an object exists, without decoding it
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.indexes
            .values()
            .any(|index| index.offset_of(id).is_some())
            || self.objects_path.join(id.to_path()).exists()
    }

    /// Read and inflate a loose object file
    fn read_loose(&self, id: &ObjectId, size_only: bool) -> anyhow::Result<RawObject> {
        let object_path = self.objects_path.join(id.to_path());
        if !object_path.exists() {
            return Err(anyhow::anyhow!(
                "Object {} exists neither in a pack nor as a loose file",
                id
            ));
        }

        let file = File::open(&object_path).context(format!(
            "Unable to open object file {}",
            object_path.display()
        ))?;

        let mut stream = BufReader::new(inflate::stream(file));
        let (object_type, length) = ObjectType::parse_header(&mut stream)?;

        if size_only {
            return Ok(RawObject::sized(object_type, length));
        }

        Ok(RawObject::streamed(
            object_type,
            length,
            Box::new(stream.take(length)),
        ))
    }

    /// Read and parse an object as a commit
    ///
    /// # Returns
    ///
    /// The parsed commit, or an error if the object is missing or is not
    /// a commit
    pub fn parse_commit(&self, id: &ObjectId) -> anyhow::Result<Commit> {
        let object = self.read(id, false)?;
        if object.object_type != ObjectType::Commit {
            return Err(anyhow::anyhow!(
                "Object {} is a {}, not a commit",
                id,
                object.object_type
            ));
        }

        Commit::parse(*id, &object.into_bytes()?)
    }

    /// Read and parse an object as a tree
    pub fn parse_tree(&self, id: &ObjectId) -> anyhow::Result<Tree> {
        let object = self.read(id, false)?;
        if object.object_type != ObjectType::Tree {
            return Err(anyhow::anyhow!(
                "Object {} is a {}, not a tree",
                id,
                object.object_type
            ));
        }

        Tree::parse(&object.into_bytes()?)
    }

    /// Resolve a slash-separated path to a tree entry
    ///
    /// Walks nested trees from the given root tree. Returns the
    /// [`PathNotFound`] sentinel when any component is absent or when a
    /// non-final component is not a subtree.
    pub fn tree_entry_at_path(
        &self,
        tree_id: &ObjectId,
        path: &str,
    ) -> anyhow::Result<TreeEntry> {
        let components: Vec<&str> = path
            .split('/')
            .filter(|component| !component.is_empty())
            .collect();
        let Some((name, directories)) = components.split_last() else {
            return Err(PathNotFound.into());
        };

        let mut tree = self.parse_tree(tree_id)?;
        for directory in directories {
            let entry = tree.entry(directory).ok_or(PathNotFound)?;
            if !entry.is_tree() {
                return Err(PathNotFound.into());
            }
            let subtree_oid = entry.oid;
            tree = self.parse_tree(&subtree_oid)?;
        }

        tree.entry(name).cloned().ok_or_else(|| PathNotFound.into())
    }
}
