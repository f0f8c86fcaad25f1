//! Persistence format version.

/// Version written into every serialized rig. Readers accept this version and
/// anything older.
pub const RIG_FORMAT_VERSION: u32 = 1;
