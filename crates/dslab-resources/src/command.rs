//! Commands issued by resource consumers.

use serde::Serialize;

/// What a consumer wants from its resource until the next tick. Times are in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum ResourceCommand {
    /// No demand until `deadline`, the consumer must still be woken up then.
    Idle { deadline: u64 },
    /// Perform `work` units at a rate of at most `limit` units per second, finishing by `deadline`.
    Consume { work: f64, limit: f64, deadline: u64 },
    /// The consumer is finished and will issue no more commands.
    Exit,
}

impl ResourceCommand {
    /// Time at which the consumer wants to be ticked again, `None` after exit.
    pub fn deadline(&self) -> Option<u64> {
        match self {
            ResourceCommand::Idle { deadline } | ResourceCommand::Consume { deadline, .. } => Some(*deadline),
            ResourceCommand::Exit => None,
        }
    }
}
