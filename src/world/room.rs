use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::world::item::Item;
use crate::world::monster::Monster;
use crate::world::player::{Player, PlayerId};

/// Stable room key used in the registry and for lock ordering
pub type RoomKey = String;

/// Exit direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "n")]
    North,
    #[serde(alias = "s")]
    South,
    #[serde(alias = "e")]
    East,
    #[serde(alias = "w")]
    West,
    #[serde(alias = "u")]
    Up,
    #[serde(alias = "d")]
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Parse a full name or single-letter alias (case-insensitive)
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable membership of a room, guarded by the room's lock
#[derive(Debug, Default)]
pub struct RoomContents {
    pub players: Vec<Player>,
    pub items: Vec<Item>,
    pub monsters: Vec<Monster>,
}

impl RoomContents {
    /// Send a line to every player here except `except`
    pub fn broadcast(&self, message: &str, except: Option<PlayerId>) {
        for player in &self.players {
            if Some(player.id) != except {
                player.send(message);
            }
        }
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn contains_player(&self, id: PlayerId) -> bool {
        self.player_index(id).is_some()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Remove a player from this room, returning it
    pub fn take_player(&mut self, id: PlayerId) -> Option<Player> {
        let index = self.player_index(id)?;
        Some(self.players.remove(index))
    }

    pub fn has_living_monsters(&self) -> bool {
        self.monsters.iter().any(Monster::is_alive)
    }
}

/// A location in the world graph.
///
/// Name, description and exits are fixed at build time; only the contents
/// change, always under the room lock.
#[derive(Debug)]
pub struct Room {
    key: RoomKey,
    pub name: String,
    pub description: String,
    exits: BTreeMap<Direction, RoomKey>,
    contents: Mutex<RoomContents>,
}

impl Room {
    pub fn new(
        key: impl Into<RoomKey>,
        name: impl Into<String>,
        description: impl Into<String>,
        exits: BTreeMap<Direction, RoomKey>,
        contents: RoomContents,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            exits,
            contents: Mutex::new(contents),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Target room key for an exit
    pub fn exit(&self, direction: Direction) -> Option<&str> {
        self.exits.get(&direction).map(String::as_str)
    }

    /// Exits in fixed direction order
    pub fn exits(&self) -> impl Iterator<Item = (Direction, &str)> {
        self.exits.iter().map(|(d, k)| (*d, k.as_str()))
    }

    /// Lock the room's contents
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, RoomContents> {
        self.contents.lock()
    }

    /// Full look rendering as seen by `viewer` (who is not listed as "other player")
    pub fn render(&self, contents: &RoomContents, viewer: PlayerId) -> Vec<String> {
        let mut lines = vec![format!("=== {} ===", self.name), self.description.clone()];

        if !contents.items.is_empty() {
            lines.push(String::new());
            lines.push("Items here:".to_string());
            lines.extend(contents.items.iter().map(|item| format!("  {}", item.name)));
        }

        if !self.exits.is_empty() {
            lines.push(String::new());
            lines.push("Exits:".to_string());
            lines.extend(self.exits.keys().map(|dir| format!("  {}", dir)));
        }

        if contents.has_living_monsters() {
            lines.push(String::new());
            lines.push("Monsters here:".to_string());
            lines.extend(
                contents
                    .monsters
                    .iter()
                    .filter(|m| m.is_alive())
                    .map(|m| format!("  {}", m.status())),
            );
        }

        let others: Vec<&Player> = contents.players.iter().filter(|p| p.id != viewer).collect();
        if !others.is_empty() {
            lines.push(String::new());
            lines.push("Other players here:".to_string());
            lines.extend(others.iter().map(|p| format!("  {}", p.name)));
        }

        lines
    }
}
