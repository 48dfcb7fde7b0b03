//! Command parsing
//!
//! Turns one input line into a [`Command`] without touching the world.
//! Verbs are case-insensitive and aliases fold to one variant. Arguments
//! keep their original case with whitespace collapsed, except attack
//! targets, which are lowercased to match monster names.

use crate::game::error::CommandError;
use crate::world::room::Direction;

/// A parsed player command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Look,
    Move(Direction),
    Get(String),
    Drop(String),
    Inventory,
    Examine(String),
    Who,
    Attack(String),
    Health,
    Equip(String),
    Unequip(String),
    Equipment,
    Use(String),
    Rest,
    Say(String),
    Quit,
    Help,
}

impl Command {
    /// Canonical verb, used for telemetry
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Look => "look",
            Command::Move(_) => "go",
            Command::Get(_) => "get",
            Command::Drop(_) => "drop",
            Command::Inventory => "inventory",
            Command::Examine(_) => "examine",
            Command::Who => "who",
            Command::Attack(_) => "attack",
            Command::Health => "health",
            Command::Equip(_) => "equip",
            Command::Unequip(_) => "unequip",
            Command::Equipment => "equipment",
            Command::Use(_) => "use",
            Command::Rest => "rest",
            Command::Say(_) => "say",
            Command::Quit => "quit",
            Command::Help => "help",
        }
    }
}

/// Parse a line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };
    let verb = first.to_lowercase();
    let rest: Vec<&str> = words.collect();
    let argument = rest.join(" ");

    let required = |prompt: &'static str| {
        if argument.is_empty() {
            Err(CommandError::InvalidArgument { prompt })
        } else {
            Ok(argument.clone())
        }
    };

    let command = match verb.as_str() {
        "look" | "l" => Command::Look,
        "go" => {
            let token = rest
                .first()
                .ok_or(CommandError::InvalidArgument { prompt: "Go where?" })?;
            Command::Move(Direction::parse(token).ok_or(CommandError::NoSuchExit)?)
        }
        "get" | "take" => Command::Get(required("Get what?")?),
        "drop" => Command::Drop(required("Drop what?")?),
        "inventory" | "inv" | "i" => Command::Inventory,
        "examine" | "ex" => Command::Examine(required("Examine what?")?),
        "who" => Command::Who,
        "attack" | "kill" | "fight" => Command::Attack(required("Attack what?")?.to_lowercase()),
        "health" | "hp" => Command::Health,
        "equip" | "wield" | "wear" => Command::Equip(required("Equip what?")?),
        "unequip" | "remove" => Command::Unequip(required("Remove what?")?),
        "equipment" | "eq" => Command::Equipment,
        "use" => Command::Use(required("Use what?")?),
        "rest" => Command::Rest,
        "say" => Command::Say(required("Say what?")?),
        "quit" | "q" => Command::Quit,
        "help" => Command::Help,
        other => match Direction::parse(other) {
            Some(direction) => Command::Move(direction),
            None => return Err(CommandError::UnknownCommand),
        },
    };

    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   \t "), Ok(None));
    }

    #[test]
    fn test_aliases_fold() {
        assert_eq!(parsed("l"), Command::Look);
        assert_eq!(parsed("inv"), Command::Inventory);
        assert_eq!(parsed("i"), Command::Inventory);
        assert_eq!(parsed("hp"), Command::Health);
        assert_eq!(parsed("eq"), Command::Equipment);
        assert_eq!(parsed("q"), Command::Quit);
        assert_eq!(parsed("ex mug"), Command::Examine("mug".into()));
        assert_eq!(parsed("kill rat"), Command::Attack("rat".into()));
        assert_eq!(parsed("fight rat"), Command::Attack("rat".into()));
        assert_eq!(parsed("wield sword"), Command::Equip("sword".into()));
        assert_eq!(parsed("wear armor"), Command::Equip("armor".into()));
        assert_eq!(parsed("remove armor"), Command::Unequip("armor".into()));
        assert_eq!(parsed("take coin"), Command::Get("coin".into()));
    }

    #[test]
    fn test_directions() {
        assert_eq!(parsed("n"), Command::Move(Direction::North));
        assert_eq!(parsed("South"), Command::Move(Direction::South));
        assert_eq!(parsed("e"), Command::Move(Direction::East));
        assert_eq!(parsed("w"), Command::Move(Direction::West));
        assert_eq!(parsed("u"), Command::Move(Direction::Up));
        assert_eq!(parsed("d"), Command::Move(Direction::Down));
        assert_eq!(parsed("go north"), Command::Move(Direction::North));
        assert_eq!(parsed("GO d"), Command::Move(Direction::Down));
    }

    #[test]
    fn test_go_errors() {
        assert_eq!(
            parse("go"),
            Err(CommandError::InvalidArgument { prompt: "Go where?" })
        );
        assert_eq!(parse("go sideways"), Err(CommandError::NoSuchExit));
    }

    #[test]
    fn test_case_insensitive_verbs() {
        assert_eq!(parsed("LOOK"), Command::Look);
        assert_eq!(parsed("Inventory"), Command::Inventory);
        assert_eq!(parsed("WhO"), Command::Who);
    }

    #[test]
    fn test_arguments_keep_case_and_collapse_spaces() {
        assert_eq!(parsed("say  Hello   World "), Command::Say("Hello World".into()));
        assert_eq!(parsed("equip Iron  Sword"), Command::Equip("Iron Sword".into()));
    }

    #[test]
    fn test_attack_target_lowercased() {
        assert_eq!(parsed("attack Giant  Rat"), Command::Attack("giant rat".into()));
        assert_eq!(parsed("KILL DIRE WOLF"), Command::Attack("dire wolf".into()));
    }

    #[test]
    fn test_missing_arguments() {
        let cases = [
            ("get", "Get what?"),
            ("drop", "Drop what?"),
            ("examine", "Examine what?"),
            ("attack", "Attack what?"),
            ("equip", "Equip what?"),
            ("unequip", "Remove what?"),
            ("use", "Use what?"),
            ("say", "Say what?"),
        ];
        for (line, prompt) in cases {
            assert_eq!(parse(line), Err(CommandError::InvalidArgument { prompt }));
        }
    }

    #[test]
    fn test_unknown_verb() {
        assert_eq!(parse("dance wildly"), Err(CommandError::UnknownCommand));
    }

    #[test]
    fn test_verb_names() {
        assert_eq!(parsed("n").verb(), "go");
        assert_eq!(parsed("kill rat").verb(), "attack");
        assert_eq!(parsed("help").verb(), "help");
    }
}
