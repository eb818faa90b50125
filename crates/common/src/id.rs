//! Identifier and session token generation.

use ulid::Ulid;
use uuid::Uuid;

/// Generates row identifiers and session tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate a lowercase ULID, used as the primary key of every row.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque bearer token for a signed-in user.
    ///
    /// Tokens carry no time component so they cannot be guessed from a
    /// sign-in timestamp.
    #[must_use]
    pub fn generate_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
