//! Connection state and statement outcomes.

use crate::traits::ModifiedResult;

/// Status of one `DatabaseConnection`.
///
/// `error` and `message` describe the most recent failure; a later
/// successful statement does not clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub error: bool,
    pub message: String,
}

impl ConnectionState {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.error = true;
        self.message = message.into();
    }
}

/// Result of an `update` or `delete` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutcome {
    /// The statement ran
    Executed(ModifiedResult),
    /// No predicate was given, so nothing was sent to the driver
    Skipped,
}

impl StatementOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Rows affected, zero when skipped
    pub fn rows_affected(&self) -> u64 {
        match self {
            Self::Executed(result) => result.rows_affected,
            Self::Skipped => 0,
        }
    }
}
