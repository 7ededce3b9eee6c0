//! Handler for the "list" command.
use crate::command::commands::{CommandExecutor, CommandHandler, CommandHandlerDyn};
use crate::command::context::CommandContext;
use crate::command::error::CommandError;

/// Handler for the "list" command.
#[must_use]
pub fn command_handler() -> impl CommandHandlerDyn {
    CommandHandler::new(
        &["list"],
        "Lists the loaded worlds and every dynamic dimension.",
        "rift:command.list",
        ListCommandExecutor,
    )
}

struct ListCommandExecutor;

impl CommandExecutor for ListCommandExecutor {
    fn execute(&self, args: &[&str], context: &mut CommandContext<'_>) -> Result<(), CommandError> {
        if !args.is_empty() {
            return Err(CommandError::CommandFailed("Invalid Syntax.".to_string()));
        }

        for world in context.worlds.loaded_worlds() {
            context
                .sender
                .send_message(&format!("Loaded: id:{}, {}", world.id, world.name));
        }

        for (id, _) in context.manager.dimensions() {
            let information = context.manager.information(id);
            let name = information.map_or("", |information| information.name());
            let owner = information.map_or("", |information| information.owner_name());
            let energy = context.ledger.energy_level(id);

            let line = if owner.is_empty() {
                format!("Rift: id:{id}, {name} (power {energy})")
            } else {
                format!("Rift: id:{id}, {name} (power {energy}) (owner {owner})")
            };
            context.sender.send_message(&line);
        }
        Ok(())
    }
}
