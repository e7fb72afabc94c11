//! Command infrastructure.

use common::Version;

use crate::aggregate::Aggregate;
use crate::validation::ValidationErrors;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after the command was applied and persisted.
    pub aggregate: A,

    /// The events that were raised by the command, in append order.
    pub events: Vec<A::Event>,

    /// The version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that carry their own input validation.
///
/// Commands represent an intention to perform an action. Validation checks
/// only the shape of the input; state-dependent rules are enforced by the
/// aggregate itself.
pub trait Command: Send + Sync {
    /// Checks every input field and reports all violations at once.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}
