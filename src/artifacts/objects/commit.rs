//! Git commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (for history)
//! - Author and committer information
//! - Commit message
//!
//! ## Format
//!
//! On disk (after the `"commit <size>\0"` header):
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;

/// Author or committer information
///
/// Contains name, email, and timestamp with timezone information.
#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Format author name and email for display
    ///
    /// # Returns
    ///
    /// String in format "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Format timestamp in human-readable form
    ///
    /// # Returns
    ///
    /// String like "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    /// Get the timestamp
    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Format: "name <email> timestamp timezone"
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("Invalid signature format"));
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp"))?;
        let name_email_part = parts[2]; // "name <email>"

        // Extract email from within angle brackets
        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid signature format: missing '<'"))?;
        let email_end = name_email_part
            .find('>')
            .ok_or_else(|| anyhow::anyhow!("Invalid signature format: missing '>'"))?;

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let offset = parse_timezone(timezone)?;
        let timestamp = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

/// Parse a `±HHMM` timezone suffix into a fixed offset
fn parse_timezone(timezone: &str) -> anyhow::Result<chrono::FixedOffset> {
    let invalid = || anyhow::anyhow!("Invalid timezone: {:?}", timezone);

    if timezone.len() != 5 || !timezone.is_char_boundary(1) {
        return Err(invalid());
    }

    let (sign, digits) = timezone.split_at(1);
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    let seconds = hours * 3600 + minutes * 60;

    match sign {
        "+" => chrono::FixedOffset::east_opt(seconds),
        "-" => chrono::FixedOffset::west_opt(seconds),
        _ => None,
    }
    .ok_or_else(invalid)
}

/// Git commit object
///
/// A parsed commit, carrying its own ID so that graph algorithms can key on
/// it without recomputing the hash.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// The commit's own object ID
    oid: ObjectId,
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Parent commit IDs (empty for initial commit, multiple for merge commits)
    parents: Vec<ObjectId>,
    /// Author who wrote the changes
    author: Author,
    /// Committer who recorded the commit
    committer: Author,
    /// Commit message
    message: String,
}

impl Commit {
    pub fn new(
        oid: ObjectId,
        tree_oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Author,
        committer: Author,
        message: String,
    ) -> Self {
        Commit {
            oid,
            tree_oid,
            parents,
            author,
            committer,
            message,
        }
    }

    /// Parse a commit from its content bytes (header already stripped)
    ///
    /// # Arguments
    ///
    /// * `oid` - The commit's own object ID, known to the caller
    /// * `content` - The inflated commit content
    pub fn parse(oid: ObjectId, content: &[u8]) -> anyhow::Result<Self> {
        let content = std::str::from_utf8(content).context("Commit content is not UTF-8")?;
        let mut lines = content.lines();

        let tree_line = lines
            .next()
            .context("Invalid commit object: missing tree line")?;
        let tree_oid = tree_line
            .strip_prefix("tree ")
            .context("Invalid commit object: invalid tree line")?;
        let tree_oid = ObjectId::try_parse(tree_oid)?;

        // Parse all parent lines (there can be 0, 1, or multiple parents)
        let mut parents = Vec::new();
        let mut next_line = lines
            .next()
            .context("Invalid commit object: missing author line")?;

        while let Some(parent_oid) = next_line.strip_prefix("parent ") {
            parents.push(ObjectId::try_parse(parent_oid)?);

            next_line = lines
                .next()
                .context("Invalid commit object: missing author line")?;
        }

        // At this point, next_line should be the author line
        let author = next_line
            .strip_prefix("author ")
            .context("Invalid commit object: invalid author line")?;
        let author = Author::try_from(author)?;

        let committer_line = lines
            .next()
            .context("Invalid commit object: missing committer line")?;
        let committer = committer_line
            .strip_prefix("committer ")
            .context("Invalid commit object: invalid committer line")?;
        let committer = Author::try_from(committer)?;

        // skip the empty line
        lines.next();

        let message = lines.collect::<Vec<&str>>().join("\n");
        Ok(Self::new(oid, tree_oid, parents, author, committer, message))
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    pub fn parent(&self, index: usize) -> Option<&ObjectId> {
        self.parents.get(index)
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    /// Committer timestamp, the ordering key for history traversal
    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.committer.timestamp()
    }

    /// Get the full commit message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the first line of the commit message
    ///
    /// Useful for short-form display (e.g., `log --oneline`)
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }
}
