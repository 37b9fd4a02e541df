//! System-wide constants for docstore.
//!
//! Limits mirror the MySQL engine so that validation rejects exactly what the
//! engine would reject, before any network round trip.

// =============================================================================
// Identifier and Key Limits
// =============================================================================

/// Identifiers must be strictly shorter than this many characters.
///
/// The engine caps table, column and index names at 64 characters.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Maximum primary-key length in characters.
///
/// Matches the `VARCHAR(255)` primary-key column created by `create_table`.
pub const MAX_PRIMARY_KEY_LEN: usize = 255;

// =============================================================================
// Field Hashing
// =============================================================================

/// Prefix of every generated column created for a JSON field.
pub const HASHED_COLUMN_PREFIX: &str = "col_";

/// Number of hex characters in a field digest (SHA-224).
pub const FIELD_DIGEST_HEX_LEN: usize = 56;

// =============================================================================
// Field-Hash Catalog
// =============================================================================

/// Database holding docstore metadata.
pub const SYSTEM_DATABASE: &str = "system";

/// Catalog table mapping hashed column names back to field paths.
pub const FIELD_HASH_TABLE: &str = "field_hash_map";

// =============================================================================
// Engine Error Codes
// =============================================================================

/// `ER_DUP_ENTRY`: duplicate value for a unique key.
pub const ER_DUP_ENTRY: u16 = 1062;

/// `ER_NO_SUCH_TABLE`: table does not exist.
pub const ER_NO_SUCH_TABLE: u16 = 1146;

/// `ER_BAD_DB_ERROR`: unknown database.
pub const ER_BAD_DB_ERROR: u16 = 1049;

// =============================================================================
// Connection Defaults
// =============================================================================

/// Conventional MySQL port, used only by config loaders and the CLI.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Prefix of environment variables read by `ConnectionConfig::from_env`.
pub const ENV_PREFIX: &str = "DOCSTORE_";
