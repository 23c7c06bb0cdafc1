/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// CACHE NAMESPACES
// =============================================================================

/// Cached notice detail responses, keyed by notice id
pub const NOTICE_CACHE: &str = "notices";

/// Cached attachment metadata, keyed by attachment id
pub const FILE_CACHE: &str = "files";
