//! This module contains the command context.
use crate::command::sender::CommandSender;
use crate::dimension::{DimensionManager, PowerLedger};
use crate::host::WorldLoader;

/// What a command can see while it runs.
pub struct CommandContext<'a> {
    /// The sender of the command.
    pub sender: &'a dyn CommandSender,
    /// The dimension table of the open save.
    pub manager: &'a DimensionManager,
    /// Energy of every dimension.
    pub ledger: &'a PowerLedger,
    /// The host's loaded worlds.
    pub worlds: &'a dyn WorldLoader,
}
