//! World graph: room registry, player roster and the locking discipline
//!
//! Every room carries its own lock. Operations that touch a single room
//! take only that lock; moves take both rooms' locks in ascending key
//! order. The roster lock is always taken last, after any room locks.
//! No lock here is ever held across an `.await`.

use hashbrown::HashMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::game::error::CommandError;
use crate::world::player::{Player, PlayerId};
use crate::world::room::{Direction, Room, RoomContents, RoomKey};

/// World construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Room '{0}' registered twice")]
    DuplicateRoom(RoomKey),
    #[error("No start room configured")]
    NoStartRoom,
    #[error("Start room '{0}' does not exist")]
    UnknownStartRoom(RoomKey),
    #[error("Exit {direction} of room '{room}' leads to unknown room '{target}'")]
    DanglingExit {
        room: RoomKey,
        direction: Direction,
        target: RoomKey,
    },
}

#[derive(Debug, Clone)]
struct RosterEntry {
    name: String,
    room: usize,
    seq: u64,
}

#[derive(Debug, Default)]
struct Roster {
    entries: HashMap<PlayerId, RosterEntry>,
    next_seq: u64,
}

impl Roster {
    fn insert(&mut self, id: PlayerId, name: String, room: usize) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(id, RosterEntry { name, room, seq });
    }

    fn relocate(&mut self, id: PlayerId, room: usize) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.room = room;
        }
    }
}

/// Collects rooms before the graph is frozen
#[derive(Debug, Default)]
pub struct WorldBuilder {
    rooms: Vec<Room>,
    start_room: Option<RoomKey>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room under its key
    pub fn register(&mut self, room: Room) -> Result<&mut Self, WorldError> {
        if self.rooms.iter().any(|r| r.key() == room.key()) {
            return Err(WorldError::DuplicateRoom(room.key().to_string()));
        }
        self.rooms.push(room);
        Ok(self)
    }

    /// Room where players join and respawn
    pub fn start_room(&mut self, key: impl Into<RoomKey>) -> &mut Self {
        self.start_room = Some(key.into());
        self
    }

    /// Validate exits and freeze the graph
    pub fn build(self) -> Result<World, WorldError> {
        let mut rooms = self.rooms;
        // Index order doubles as the global lock order
        rooms.sort_by(|a, b| a.key().cmp(b.key()));

        let index: HashMap<RoomKey, usize> = rooms
            .iter()
            .enumerate()
            .map(|(i, room)| (room.key().to_string(), i))
            .collect();

        for room in &rooms {
            for (direction, target) in room.exits() {
                if !index.contains_key(target) {
                    return Err(WorldError::DanglingExit {
                        room: room.key().to_string(),
                        direction,
                        target: target.to_string(),
                    });
                }
            }
        }

        let start_key = self.start_room.ok_or(WorldError::NoStartRoom)?;
        let start = *index
            .get(&start_key)
            .ok_or(WorldError::UnknownStartRoom(start_key))?;

        Ok(World {
            rooms,
            index,
            start,
            roster: Mutex::new(Roster::default()),
        })
    }
}

/// A player's view of its own room while the room lock is held.
///
/// The player is lifted out of `contents.players` for the duration, so
/// broadcasting on `contents` never reaches the acting player.
pub struct PlayerScope<'a> {
    pub room: &'a Room,
    pub contents: &'a mut RoomContents,
    pub player: &'a mut Player,
}

/// Holds a room lock with one player lifted out; puts it back on drop
struct Lifted<'a> {
    contents: MutexGuard<'a, RoomContents>,
    slot: usize,
    player: Option<Player>,
}

impl Drop for Lifted<'_> {
    fn drop(&mut self) {
        if let Some(player) = self.player.take() {
            let at = self.slot.min(self.contents.players.len());
            self.contents.players.insert(at, player);
        }
    }
}

/// Lock on an occupied room for monster turns, plus the respawn room's lock
/// when it is a different room
pub struct Encounter<'a> {
    world: &'a World,
    pub room: &'a Room,
    pub contents: MutexGuard<'a, RoomContents>,
    respawn: Option<MutexGuard<'a, RoomContents>>,
}

impl Encounter<'_> {
    /// Restore a killed player and move it to the respawn room.
    ///
    /// Returns false if the player is not in this room.
    pub fn respawn_player(&mut self, id: PlayerId) -> bool {
        let Some(mut player) = self.contents.take_player(id) else {
            return false;
        };

        player.vitals.restore();
        let start = self.world.start_room();
        player.send(format!("You respawn in {}, fully healed.", start.name));
        let arrival = format!("{} respawns.", player.name);

        match self.respawn.as_mut() {
            Some(target) => {
                target.broadcast(&arrival, None);
                target.players.push(player);
                self.world.roster.lock().relocate(id, self.world.start);
            }
            None => {
                self.contents.broadcast(&arrival, None);
                self.contents.players.push(player);
            }
        }
        true
    }
}

/// The shared world: fixed room graph plus the connected-player roster
#[derive(Debug)]
pub struct World {
    /// Sorted by key; the index is the lock order
    rooms: Vec<Room>,
    index: HashMap<RoomKey, usize>,
    start: usize,
    roster: Mutex<Roster>,
}

impl World {
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    /// All rooms in lock order
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, key: &str) -> Option<&Room> {
        self.index.get(key).map(|&i| &self.rooms[i])
    }

    /// Where players join and respawn
    pub fn start_room(&self) -> &Room {
        &self.rooms[self.start]
    }

    pub fn player_count(&self) -> usize {
        self.roster.lock().entries.len()
    }

    /// Current room of a connected player
    pub fn location(&self, id: PlayerId) -> Option<&Room> {
        self.locate(id).map(|i| &self.rooms[i])
    }

    fn locate(&self, id: PlayerId) -> Option<usize> {
        self.roster.lock().entries.get(&id).map(|entry| entry.room)
    }

    /// Place a new player in the start room and the roster in one step
    pub fn add_player(&self, player: Player) -> PlayerId {
        let id = player.id;
        let name = player.name.clone();
        let mut contents = self.rooms[self.start].lock();
        contents.players.push(player);
        self.roster.lock().insert(id, name, self.start);
        debug!("Player {} joined", id);
        id
    }

    /// Remove a player from its room and the roster.
    ///
    /// Safe to call any number of times from any task: only the first
    /// call gets the player back, later ones return `None`.
    pub fn remove_player(&self, id: PlayerId) -> Option<Player> {
        loop {
            let index = self.locate(id)?;
            let mut contents = self.rooms[index].lock();
            if let Some(player) = contents.take_player(id) {
                self.roster.lock().entries.remove(&id);
                contents.broadcast(&format!("{} has left the game.", player.name), None);
                debug!("Player {} left", id);
                return Some(player);
            }
            // Moved between the roster read and the lock; look again
        }
    }

    /// Run `f` against the player's room with its lock held.
    ///
    /// Returns `None` if the player is no longer in the world.
    pub fn with_player<T>(&self, id: PlayerId, f: impl FnOnce(PlayerScope<'_>) -> T) -> Option<T> {
        loop {
            let index = self.locate(id)?;
            let room = &self.rooms[index];
            let mut contents = room.lock();
            let Some(slot) = contents.player_index(id) else {
                continue;
            };

            let player = contents.players.remove(slot);
            let mut lifted = Lifted {
                contents,
                slot,
                player: Some(player),
            };
            let Lifted {
                contents, player, ..
            } = &mut lifted;
            let player = player.as_mut()?;
            return Some(f(PlayerScope {
                room,
                contents: &mut **contents,
                player,
            }));
        }
    }

    /// Move a player through an exit of its current room.
    ///
    /// Both rooms are locked in key order for the handoff, so the player is
    /// never visible in zero or two rooms. The old room hears the departure
    /// first, then the new room hears the arrival, then the mover gets the
    /// new room rendered. Returns the destination room.
    pub fn move_player(&self, id: PlayerId, direction: Direction) -> Result<&Room, CommandError> {
        loop {
            let Some(from) = self.locate(id) else {
                return Err(CommandError::NoSuchExit);
            };
            let target = self.rooms[from]
                .exit(direction)
                .and_then(|key| self.index.get(key).copied())
                .ok_or(CommandError::NoSuchExit)?;

            if target == from {
                let room = &self.rooms[from];
                let contents = room.lock();
                let Some(player) = contents.player(id) else {
                    continue;
                };
                player.send_all(room.render(&contents, id));
                return Ok(room);
            }

            let (mut old, mut new) = self.lock_pair(from, target);
            let Some(player) = old.take_player(id) else {
                continue;
            };

            old.broadcast(&format!("{} leaves {}.", player.name, direction), None);
            new.broadcast(&format!("{} arrives.", player.name), None);

            let destination = &self.rooms[target];
            player.send_all(destination.render(&new, id));
            new.players.push(player);
            self.roster.lock().relocate(id, target);

            return Ok(destination);
        }
    }

    /// Lock an occupied room for monster turns
    pub fn encounter(&self, index: usize) -> Option<Encounter<'_>> {
        let room = self.rooms.get(index)?;
        if index == self.start {
            return Some(Encounter {
                world: self,
                room,
                contents: room.lock(),
                respawn: None,
            });
        }

        let (contents, respawn) = self.lock_pair(index, self.start);
        Some(Encounter {
            world: self,
            room,
            contents,
            respawn: Some(respawn),
        })
    }

    /// Connected players in join order with their room names
    pub fn who(&self) -> Vec<(String, String)> {
        let roster = self.roster.lock();
        let mut entries: Vec<&RosterEntry> = roster.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
            .into_iter()
            .map(|entry| (entry.name.clone(), self.rooms[entry.room].name.clone()))
            .collect()
    }

    /// Lock two distinct rooms in ascending index order; guards come back
    /// in argument order
    fn lock_pair(
        &self,
        a: usize,
        b: usize,
    ) -> (MutexGuard<'_, RoomContents>, MutexGuard<'_, RoomContents>) {
        if a < b {
            let first = self.rooms[a].lock();
            let second = self.rooms[b].lock();
            (first, second)
        } else {
            let first = self.rooms[b].lock();
            let second = self.rooms[a].lock();
            (second, first)
        }
    }

    /// Audit the membership invariant: every rostered player sits in exactly
    /// one room, that room matches the roster, and no room holds strangers.
    pub fn consistency_violations(&self) -> Vec<String> {
        let guards: Vec<MutexGuard<'_, RoomContents>> =
            self.rooms.iter().map(Room::lock).collect();
        let roster = self.roster.lock();
        let mut violations = Vec::new();

        for (id, entry) in &roster.entries {
            let homes: Vec<usize> = guards
                .iter()
                .enumerate()
                .filter(|(_, contents)| contents.contains_player(*id))
                .map(|(i, _)| i)
                .collect();
            match homes.as_slice() {
                [only] if *only == entry.room => {}
                [] => violations.push(format!("{} is in no room", entry.name)),
                [only] => violations.push(format!(
                    "{} is in '{}' but the roster says '{}'",
                    entry.name,
                    self.rooms[*only].key(),
                    self.rooms[entry.room].key()
                )),
                _ => violations.push(format!("{} is in {} rooms", entry.name, homes.len())),
            }
        }

        for (i, contents) in guards.iter().enumerate() {
            for player in &contents.players {
                if !roster.entries.contains_key(&player.id) {
                    violations.push(format!(
                        "{} is in '{}' but not on the roster",
                        player.name,
                        self.rooms[i].key()
                    ));
                }
            }
        }

        violations
    }
}
