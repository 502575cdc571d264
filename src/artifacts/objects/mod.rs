pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Raw size of an object ID in bytes
pub const OBJECT_ID_SIZE: usize = 20;

/// Length of the canonical hex form of an object ID
pub const OBJECT_ID_HEX_LENGTH: usize = 40;
