//! User-facing command failures
//!
//! Every variant renders as the single line sent back to the issuing
//! player. None of them are fatal and none leave world state modified.

/// Fixed help text, shown for unknown verbs and for `help`
pub const HELP_TEXT: &str = "Unknown command. Try: look, go <direction>, get <item>, drop <item>, \
inventory, examine <item>, equip <item>, equipment, attack <monster>, health, who, use <item>, \
rest, say, quit";

/// Where a name lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Item in the current room
    RoomItem,
    /// Item in the player's inventory
    Inventory,
    /// Item in the room or the inventory
    Visible,
    /// Living monster in the current room
    Monster,
    /// Currently equipped weapon or armor
    Equipped,
}

impl Lookup {
    pub fn message(self) -> &'static str {
        match self {
            Lookup::RoomItem => "That item is not here.",
            Lookup::Inventory => "You don't have that item.",
            Lookup::Visible => "You don't see that here.",
            Lookup::Monster => "There is no such monster here.",
            Lookup::Equipped => "You don't have that equipped.",
        }
    }
}

/// Command errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("You can't go that way.")]
    NoSuchExit,
    #[error("{}", .0.message())]
    NotFound(Lookup),
    #[error("{prompt}")]
    InvalidArgument { prompt: &'static str },
    #[error("You can't equip that item.")]
    NotEquippable,
    #[error("You can't use that item.")]
    Unusable,
    #[error("{}", HELP_TEXT)]
    UnknownCommand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(CommandError::NoSuchExit.to_string(), "You can't go that way.");
        assert_eq!(
            CommandError::NotFound(Lookup::Monster).to_string(),
            "There is no such monster here."
        );
        assert_eq!(
            CommandError::InvalidArgument { prompt: "Get what?" }.to_string(),
            "Get what?"
        );
        assert!(CommandError::UnknownCommand.to_string().starts_with("Unknown command."));
    }
}
