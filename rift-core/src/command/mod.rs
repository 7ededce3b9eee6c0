//! This module contains everything needed for commands (e.g., dispatch, execution, and sender handling).
pub mod commands;
pub mod context;
pub mod error;
pub mod sender;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::command::commands::{CommandHandlerDyn, list};
use crate::command::context::CommandContext;
use crate::command::error::CommandError::{self, *};

/// A struct that parses and dispatches commands to their appropriate handlers.
pub struct CommandDispatcher {
    /// A map of command names to their handlers.
    handlers: FxHashMap<&'static str, Arc<dyn CommandHandlerDyn>>,
}

impl CommandDispatcher {
    /// Creates a new command dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        CommandDispatcher {
            handlers: FxHashMap::default(),
        }
    }

    /// Executes a command, reporting failures to its sender.
    pub fn handle_command(&self, context: &mut CommandContext<'_>, command: &str) {
        if let Err(error) = self.execute(context, command) {
            let text = match error {
                PermissionDenied => {
                    log::warn!("Permission denied for command \"{command}\"");
                    "I'm sorry, but you do not have permission to perform this command. Please contact the server administrator if you believe this is an error.".to_string()
                }
                CommandFailed(text) => text,
            };
            context.sender.send_message(&text);
        }
    }

    /// Executes a command.
    pub fn execute(&self, context: &mut CommandContext<'_>, command: &str) -> Result<(), CommandError> {
        let (command, command_args) = Self::split_command(command)?;

        let Some(handler) = self.handlers.get(command) else {
            return Err(CommandFailed(format!("Command {command} does not exist")));
        };

        if !context.sender.has_permission(handler.permission()) {
            return Err(PermissionDenied);
        }

        handler.handle(&command_args, context)
    }

    /// Parses a command string into its components.
    fn split_command(command: &str) -> Result<(&str, Vec<&str>), CommandError> {
        let command = command.trim();
        let mut parts = command.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(CommandFailed("Empty Command".to_string()));
        };
        Ok((name, parts.collect()))
    }

    /// Registers a command handler under all its names.
    pub fn register(&mut self, handler: impl CommandHandlerDyn + 'static) {
        let handler: Arc<dyn CommandHandlerDyn> = Arc::new(handler);

        for name in handler.names() {
            if self.handlers.insert(*name, Arc::clone(&handler)).is_some() {
                log::warn!("Command {name} is already registered");
            }
        }
    }

    /// Unregisters a command handler.
    pub fn unregister(&mut self, names: &[&'static str]) {
        for name in names {
            self.handlers.remove(name);
        }
    }

    /// Descriptions of the registered commands, sorted by name.
    #[must_use]
    pub fn help(&self) -> Vec<(&'static str, &'static str)> {
        let mut help: Vec<_> = self
            .handlers
            .iter()
            .map(|(name, handler)| (*name, handler.description()))
            .collect();
        help.sort_unstable();
        help
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(list::command_handler());
        dispatcher
    }
}
