use std::io::BufRead;

/// Object kinds stored in a repository
///
/// The first four are user-visible; the two delta kinds only appear inside
/// pack files and never escape the pack reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
    OffsetDelta,
    RefDelta,
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Commit => "commit",
            ObjectType::Tree => "tree",
            ObjectType::Blob => "blob",
            ObjectType::Tag => "tag",
            ObjectType::OffsetDelta => "offset-delta",
            ObjectType::RefDelta => "ref-delta",
        }
    }

    /// Decode the 3-bit type tag from a pack entry header
    ///
    /// The first byte of a pack entry stores the type as `type << 4`.
    pub fn from_pack_tag(tag: u8) -> anyhow::Result<ObjectType> {
        match tag {
            1 => Ok(ObjectType::Commit),
            2 => Ok(ObjectType::Tree),
            3 => Ok(ObjectType::Blob),
            4 => Ok(ObjectType::Tag),
            6 => Ok(ObjectType::OffsetDelta),
            7 => Ok(ObjectType::RefDelta),
            _ => Err(anyhow::anyhow!("Unknown pack object type tag: {}", tag)),
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, ObjectType::OffsetDelta | ObjectType::RefDelta)
    }

    /// Parse a loose-object header of the form `"<type> <length>\0"`
    ///
    /// Returns the object type and the declared content length.
    pub fn parse_header(reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, u64)> {
        let mut object_type = Vec::new();
        reader.read_until(b' ', &mut object_type)?;

        let object_type = String::from_utf8(object_type)?;
        let object_type = ObjectType::try_from(object_type.trim())?;

        let mut length = Vec::new();
        reader.read_until(b'\0', &mut length)?;
        if length.pop() != Some(b'\0') {
            return Err(anyhow::anyhow!("Truncated object header"));
        }

        let length = String::from_utf8(length)?;
        if length.starts_with('-') {
            return Err(anyhow::anyhow!("Negative length in object header"));
        }
        let length = length
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("Invalid length in object header: {:?}", length))?;

        Ok((object_type, length))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "commit" => Ok(ObjectType::Commit),
            "tree" => Ok(ObjectType::Tree),
            "blob" => Ok(ObjectType::Blob),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(anyhow::anyhow!("Invalid object type: {:?}", value)),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
