//! Command interpreter
//!
//! Executes parsed commands against the world on behalf of one player.
//! Anything that reads or changes a room runs under that room's lock with
//! the acting player lifted out, so room broadcasts never echo to the actor.

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::game::command::{self, Command};
use crate::game::constants::tome;
use crate::game::error::{CommandError, Lookup, HELP_TEXT};
use crate::game::systems::combat;
use crate::metrics::Metrics;
use crate::net::outbox::Outbox;
use crate::world::graph::{PlayerScope, World};
use crate::world::item::{self, Item, Slot};
use crate::world::monster;
use crate::world::player::PlayerId;
use crate::world::room::Direction;

/// Whether the session should keep reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// The connection's handle on its player: identity plus a direct line to
/// the same outbox the player entity writes to
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: PlayerId,
    pub name: String,
    outbox: Outbox,
}

impl Actor {
    pub fn new(id: PlayerId, name: impl Into<String>, outbox: Outbox) -> Self {
        Self {
            id,
            name: name.into(),
            outbox,
        }
    }

    pub fn send(&self, line: impl Into<String>) {
        self.outbox.send(line);
    }
}

/// What `use` does, keyed by exact item name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UseEffect {
    Knowledge,
    Prayer,
    Flavor(&'static str),
}

impl UseEffect {
    fn for_item(name: &str) -> Option<Self> {
        match name {
            "tome of knowledge" => Some(UseEffect::Knowledge),
            "prayer book" => Some(UseEffect::Prayer),
            "shiny coin" => Some(UseEffect::Flavor(
                "You flip the coin and make a wish, but nothing happens. It's just a coin.",
            )),
            "rusty key" => Some(UseEffect::Flavor("The key doesn't seem to fit any locks here.")),
            _ => None,
        }
    }

    fn consumed(self) -> bool {
        matches!(self, UseEffect::Knowledge | UseEffect::Prayer)
    }
}

/// Shared command executor; one instance serves every connection
pub struct Interpreter {
    world: Arc<World>,
    metrics: Arc<Metrics>,
}

impl Interpreter {
    pub fn new(world: Arc<World>, metrics: Arc<Metrics>) -> Self {
        Self { world, metrics }
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Parse and run one input line
    pub fn handle_line(&self, actor: &Actor, line: &str) -> Outcome {
        self.handle_line_with(&mut rand::thread_rng(), actor, line)
    }

    /// [`Interpreter::handle_line`] with an explicit combat jitter source
    pub fn handle_line_with<R: Rng + ?Sized>(&self, rng: &mut R, actor: &Actor, line: &str) -> Outcome {
        let command = match command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Outcome::Continue,
            Err(err) => {
                self.metrics.record_command_error();
                actor.send(err.to_string());
                return Outcome::Continue;
            }
        };

        self.metrics.record_command(command.verb());
        debug!("{}: {:?}", actor.name, command);

        match self.execute(rng, actor, command) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.metrics.record_command_error();
                actor.send(err.to_string());
                Outcome::Continue
            }
        }
    }

    /// Run a parsed command. Errors leave the world untouched.
    pub fn execute<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        actor: &Actor,
        command: Command,
    ) -> Result<Outcome, CommandError> {
        match command {
            Command::Look => self.act(actor, look),
            Command::Move(direction) => self.go(direction, actor),
            Command::Get(name) => self.act(actor, |scope| get(scope, &name)),
            Command::Drop(name) => self.act(actor, |scope| drop_item(scope, &name)),
            Command::Inventory => self.act(actor, inventory),
            Command::Examine(name) => self.act(actor, |scope| examine(scope, &name)),
            Command::Who => {
                self.who(actor);
                Ok(Outcome::Continue)
            }
            Command::Attack(name) => self.act(actor, |scope| self.attack(rng, scope, &name)),
            Command::Health => self.act(actor, health),
            Command::Equip(name) => self.act(actor, |scope| equip(scope, &name)),
            Command::Unequip(name) => self.act(actor, |scope| unequip(scope, &name)),
            Command::Equipment => self.act(actor, equipment),
            Command::Use(name) => self.act(actor, |scope| use_item(scope, &name)),
            Command::Rest => self.act(actor, rest),
            Command::Say(message) => self.act(actor, |scope| say(scope, &message)),
            Command::Quit => {
                actor.send("Goodbye!");
                Ok(Outcome::Quit)
            }
            Command::Help => {
                actor.send(HELP_TEXT);
                Ok(Outcome::Continue)
            }
        }
    }

    /// Run `f` in the actor's room. A player no longer in the world ends
    /// the session.
    fn act(
        &self,
        actor: &Actor,
        f: impl FnOnce(PlayerScope<'_>) -> Result<(), CommandError>,
    ) -> Result<Outcome, CommandError> {
        match self.world.with_player(actor.id, f) {
            Some(result) => result.map(|()| Outcome::Continue),
            None => Ok(Outcome::Quit),
        }
    }

    fn go(&self, direction: Direction, actor: &Actor) -> Result<Outcome, CommandError> {
        let room = self.world.move_player(actor.id, direction)?;
        self.metrics.record_room_visit(&room.name);
        Ok(Outcome::Continue)
    }

    fn who(&self, actor: &Actor) {
        actor.send("Players online:");
        for (name, room) in self.world.who() {
            actor.send(format!("  {} ({})", name, room));
        }
    }

    fn attack<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scope: PlayerScope<'_>,
        name: &str,
    ) -> Result<(), CommandError> {
        let PlayerScope {
            contents, player, ..
        } = scope;
        let target = monster::living_named(&mut contents.monsters, name)
            .ok_or(CommandError::NotFound(Lookup::Monster))?;

        let hit = combat::player_attacks_monster(rng, player, target);
        let target_name = target.name.clone();
        self.metrics.record_combat();

        if hit.killed() {
            self.metrics.record_monster_kill();
            player.send(format!("You kill the {}!", target_name));
            contents.broadcast(&format!("{} kills the {}!", player.name, target_name), None);
        } else {
            player.send(format!("You attack the {} for {} damage!", target_name, hit.damage));
            contents.broadcast(&format!("{} attacks the {}!", player.name, target_name), None);
        }
        Ok(())
    }
}

fn look(scope: PlayerScope<'_>) -> Result<(), CommandError> {
    let lines = scope.room.render(scope.contents, scope.player.id);
    scope.player.send_all(lines);
    Ok(())
}

fn get(scope: PlayerScope<'_>, name: &str) -> Result<(), CommandError> {
    let PlayerScope {
        contents, player, ..
    } = scope;
    let item = item::take_named(&mut contents.items, name)
        .ok_or(CommandError::NotFound(Lookup::RoomItem))?;

    player.send(format!("You take the {}.", item.name));
    contents.broadcast(&format!("{} takes the {}.", player.name, item.name), None);
    player.inventory.push(item);
    Ok(())
}

fn drop_item(scope: PlayerScope<'_>, name: &str) -> Result<(), CommandError> {
    let PlayerScope {
        contents, player, ..
    } = scope;
    let item = player
        .take_from_inventory(name)
        .ok_or(CommandError::NotFound(Lookup::Inventory))?;

    player.send(format!("You drop the {}.", item.name));
    contents.broadcast(&format!("{} drops the {}.", player.name, item.name), None);
    contents.items.push(item);
    Ok(())
}

fn inventory(scope: PlayerScope<'_>) -> Result<(), CommandError> {
    let player = scope.player;
    if player.inventory.is_empty() {
        player.send("You are not carrying anything.");
    } else {
        player.send("You are carrying:");
        for item in &player.inventory {
            player.send(format!("  {}", item.name));
        }
    }
    Ok(())
}

fn examine(scope: PlayerScope<'_>, name: &str) -> Result<(), CommandError> {
    let description = item::find_named(&scope.contents.items, name)
        .or_else(|| item::find_named(&scope.player.inventory, name))
        .map(Item::describe)
        .ok_or(CommandError::NotFound(Lookup::Visible))?;
    scope.player.send(description);
    Ok(())
}

fn health(scope: PlayerScope<'_>) -> Result<(), CommandError> {
    let player = scope.player;
    player.send(format!(
        "Health: {}/{}",
        player.vitals.health(),
        player.vitals.max_health()
    ));
    player.send(player.health_status());
    Ok(())
}

fn equip(scope: PlayerScope<'_>, name: &str) -> Result<(), CommandError> {
    let equipped = scope.player.equip(name)?;
    let message = match (equipped.slot, equipped.replaced) {
        (Slot::Weapon, Some(old)) => format!("You unequip {} and equip {}.", old, equipped.item),
        (Slot::Weapon, None) => format!("You equip {}.", equipped.item),
        (Slot::Armor, Some(old)) => format!("You remove {} and wear {}.", old, equipped.item),
        (Slot::Armor, None) => format!("You wear {}.", equipped.item),
    };
    scope.player.send(message);
    Ok(())
}

fn unequip(scope: PlayerScope<'_>, name: &str) -> Result<(), CommandError> {
    let message = match scope.player.unequip(name)? {
        (Slot::Weapon, item) => format!("You unequip {}.", item),
        (Slot::Armor, item) => format!("You remove {}.", item),
    };
    scope.player.send(message);
    Ok(())
}

fn equipment(scope: PlayerScope<'_>) -> Result<(), CommandError> {
    let player = scope.player;
    let weapon = match &player.weapon {
        Some(w) => format!("  Weapon: {} (+{} damage)", w.name, w.damage_bonus()),
        None => "  Weapon: none".to_string(),
    };
    let armor = match &player.armor {
        Some(a) => format!("  Armor: {} (+{} defense)", a.name, a.defense_bonus()),
        None => "  Armor: none".to_string(),
    };
    player.send_all(["Equipment:".to_string(), weapon, armor]);
    Ok(())
}

fn use_item(scope: PlayerScope<'_>, name: &str) -> Result<(), CommandError> {
    let PlayerScope {
        contents, player, ..
    } = scope;
    let index = player
        .inventory
        .iter()
        .position(|item| item.is_named(name))
        .ok_or(CommandError::NotFound(Lookup::Inventory))?;
    let effect = UseEffect::for_item(&player.inventory[index].name).ok_or(CommandError::Unusable)?;

    if effect.consumed() {
        player.inventory.remove(index);
    }

    match effect {
        UseEffect::Knowledge => {
            player.vitals.raise_max(tome::MAX_HEALTH_GAIN);
            player.damage += tome::DAMAGE_GAIN;
            player.send("You study the ancient tome and feel your mind expand with knowledge!");
            player.send(format!(
                "Your maximum health increases to {} and your base damage increases by {}!",
                player.vitals.max_health(),
                tome::DAMAGE_GAIN
            ));
            contents.broadcast(&format!("{} glows with newfound wisdom!", player.name), None);
        }
        UseEffect::Prayer => {
            let max = player.vitals.max_health();
            player.vitals.heal(max);
            player.send("You recite sacred prayers and feel divine healing wash over you!");
            player.send("You are fully healed!");
            contents.broadcast(&format!("{} radiates with holy light!", player.name), None);
        }
        UseEffect::Flavor(text) => player.send(text),
    }
    Ok(())
}

fn rest(scope: PlayerScope<'_>) -> Result<(), CommandError> {
    let PlayerScope {
        contents, player, ..
    } = scope;
    match player.rest() {
        Some(amount) => {
            player.send(format!("You rest and recover {} health points.", amount));
            contents.broadcast(&format!("{} sits down to rest.", player.name), None);
        }
        None => player.send("You are already at full health."),
    }
    Ok(())
}

fn say(scope: PlayerScope<'_>, message: &str) -> Result<(), CommandError> {
    scope.player.send(format!("You say: {}", message));
    scope
        .contents
        .broadcast(&format!("{} says: {}", scope.player.name, message), None);
    Ok(())
}
