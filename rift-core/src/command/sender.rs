//! Whoever runs a command.

/// The origin of a command, receiving its output.
pub trait CommandSender {
    /// Shows a line of output to the sender.
    fn send_message(&self, message: &str);

    /// Whether the sender holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;
}
