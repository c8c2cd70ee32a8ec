//! ID generation utilities.

use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new row ID.
    ///
    /// UUID v7 is time-ordered, so newer rows sort after older ones and the
    /// string form is a usable tie-break key in cursor predicates.
    #[must_use]
    pub fn generate(&self) -> String {
        Uuid::now_v7().to_string()
    }

    /// Check whether a caller-supplied string is a well-formed UUID.
    #[must_use]
    pub fn is_valid(id: &str) -> bool {
        Uuid::parse_str(id).is_ok()
    }
}
