//! Command handlers and the glue dispatching to them.
pub mod list;

use crate::command::context::CommandContext;
use crate::command::error::CommandError;

/// Runs a command once it was matched by name.
pub trait CommandExecutor {
    /// Executes the command with its whitespace separated arguments.
    fn execute(&self, args: &[&str], context: &mut CommandContext<'_>) -> Result<(), CommandError>;
}

/// The struct that holds command handler data and executor.
pub struct CommandHandler<E> {
    names: &'static [&'static str],
    description: &'static str,
    permission: &'static str,
    executor: E,
}

impl<E: CommandExecutor> CommandHandler<E> {
    /// Creates a new command handler.
    #[must_use]
    pub const fn new(
        names: &'static [&'static str],
        description: &'static str,
        permission: &'static str,
        executor: E,
    ) -> Self {
        Self {
            names,
            description,
            permission,
            executor,
        }
    }
}

/// Defines a command handler that can be dynamically dispatched.
pub trait CommandHandlerDyn {
    /// Returns the names of the command.
    fn names(&self) -> &'static [&'static str];

    /// Returns the description of the command.
    fn description(&self) -> &'static str;

    /// Returns the permission of the command.
    fn permission(&self) -> &'static str;

    /// Handles the execution of a command.
    fn handle(&self, args: &[&str], context: &mut CommandContext<'_>) -> Result<(), CommandError>;
}

impl<E: CommandExecutor> CommandHandlerDyn for CommandHandler<E> {
    fn names(&self) -> &'static [&'static str] {
        self.names
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn permission(&self) -> &'static str {
        self.permission
    }

    fn handle(&self, args: &[&str], context: &mut CommandContext<'_>) -> Result<(), CommandError> {
        self.executor.execute(args, context)
    }
}
