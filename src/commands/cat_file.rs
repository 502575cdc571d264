use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use std::io::Write;

/// What `cat-file` should print about the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFileMode {
    /// The object content (trees are rendered entry per line)
    Pretty,
    /// The logical content length in bytes
    Size,
    /// The object type name
    Type,
}

pub fn run(repository: &Repository, revision: &str, mode: CatFileMode) -> anyhow::Result<()> {
    let oid = repository.refs().resolve(revision)?;
    let store = repository.store();

    match mode {
        CatFileMode::Type => {
            let object = store.read(&oid, true)?;
            println!("{}", object.object_type);
        }
        CatFileMode::Size => {
            let object = store.read(&oid, true)?;
            println!("{}", object.length);
        }
        CatFileMode::Pretty => {
            let object = store.read(&oid, false)?;
            match object.object_type {
                ObjectType::Tree => {
                    let tree = Tree::parse(&object.into_bytes()?)?;
                    for entry in tree.entries() {
                        let kind = if entry.is_tree() { ObjectType::Tree } else { ObjectType::Blob };
                        println!("{:06o} {} {}\t{}", entry.mode, kind, entry.oid, entry.name);
                    }
                }
                _ => {
                    let content = object.into_bytes()?;
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&content)?;
                }
            }
        }
    }

    Ok(())
}
