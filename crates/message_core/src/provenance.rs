use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Which pipeline stage produced a message.
///
/// Each stored message carries exactly one tag. Tags select views; they never
/// affect ordering.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Replayed history
    Memory,
    /// Model output
    Response,
    /// Live user input
    User,
    /// Injected context
    Context,
}

impl Provenance {
    /// Messages with this tag are handed to the persistence layer on drain.
    pub fn needs_saving(&self) -> bool {
        matches!(self, Provenance::User | Provenance::Response)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Memory => "memory",
            Provenance::Response => "response",
            Provenance::User => "user",
            Provenance::Context => "context",
        }
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
