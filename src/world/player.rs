use uuid::Uuid;

use crate::game::constants::rest;
use crate::game::error::{CommandError, Lookup};
use crate::net::outbox::Outbox;
use crate::world::item::{self, Item, Slot};
use crate::world::vitals::{DamageOutcome, Vitals};

/// Unique player identifier
pub type PlayerId = Uuid;

/// Starting stats for newly joined players
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerTemplate {
    pub health: i32,
    pub damage: i32,
}

impl Default for PlayerTemplate {
    fn default() -> Self {
        Self {
            health: crate::game::constants::player::STARTING_HEALTH,
            damage: crate::game::constants::player::BASE_DAMAGE,
        }
    }
}

/// Result of a successful equip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equipped {
    pub slot: Slot,
    pub item: String,
    /// Item that was in the slot before and went back to the inventory
    pub replaced: Option<String>,
}

/// A connected player.
///
/// The player value lives inside the player list of exactly one room; the
/// room it sits in is its location.
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub vitals: Vitals,
    /// Base damage before weapon bonus
    pub damage: i32,
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub inventory: Vec<Item>,
    outbox: Outbox,
}

impl Player {
    pub fn new(id: PlayerId, name: String, template: PlayerTemplate, outbox: Outbox) -> Self {
        Self {
            id,
            name,
            vitals: Vitals::new(template.health),
            damage: template.damage,
            weapon: None,
            armor: None,
            inventory: Vec::new(),
            outbox,
        }
    }

    /// Queue one line for this player
    pub fn send(&self, line: impl Into<String>) {
        self.outbox.send(line);
    }

    pub fn send_all<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.outbox.send(line);
        }
    }

    /// Base damage plus weapon bonus
    pub fn attack_power(&self) -> i32 {
        self.damage + self.weapon.as_ref().map_or(0, Item::damage_bonus)
    }

    /// Armor defense bonus
    pub fn defense(&self) -> i32 {
        self.armor.as_ref().map_or(0, Item::defense_bonus)
    }

    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        self.vitals.take_damage(amount)
    }

    pub fn health_status(&self) -> &'static str {
        let fraction = self.vitals.fraction();
        if fraction > 0.8 {
            "You feel great!"
        } else if fraction > 0.6 {
            "You have some minor cuts and bruises."
        } else if fraction > 0.4 {
            "You are wounded."
        } else if fraction > 0.2 {
            "You are badly wounded."
        } else {
            "You are near death!"
        }
    }

    /// Move an inventory item into its slot, returning any displaced item
    /// to the inventory. Misc items stay in the inventory.
    pub fn equip(&mut self, name: &str) -> Result<Equipped, CommandError> {
        let index = self
            .inventory
            .iter()
            .position(|item| item.is_named(name))
            .ok_or(CommandError::NotFound(Lookup::Inventory))?;

        let slot = self.inventory[index]
            .slot()
            .ok_or(CommandError::NotEquippable)?;

        let item = self.inventory.remove(index);
        let item_name = item.name.clone();
        let previous = match slot {
            Slot::Weapon => self.weapon.replace(item),
            Slot::Armor => self.armor.replace(item),
        };

        let replaced = previous.map(|old| {
            let old_name = old.name.clone();
            self.inventory.push(old);
            old_name
        });

        Ok(Equipped {
            slot,
            item: item_name,
            replaced,
        })
    }

    /// Return the named equipped item to the inventory
    pub fn unequip(&mut self, name: &str) -> Result<(Slot, String), CommandError> {
        let slot = if self.weapon.as_ref().is_some_and(|w| w.is_named(name)) {
            Slot::Weapon
        } else if self.armor.as_ref().is_some_and(|a| a.is_named(name)) {
            Slot::Armor
        } else {
            return Err(CommandError::NotFound(Lookup::Equipped));
        };

        let taken = match slot {
            Slot::Weapon => self.weapon.take(),
            Slot::Armor => self.armor.take(),
        };
        let item = taken.ok_or(CommandError::NotFound(Lookup::Equipped))?;
        let item_name = item.name.clone();
        self.inventory.push(item);
        Ok((slot, item_name))
    }

    /// Heal a quarter of max health (at least [`rest::MIN_HEAL`]).
    ///
    /// Returns the nominal heal amount, or `None` when already at full health.
    pub fn rest(&mut self) -> Option<i32> {
        if self.vitals.is_full() {
            return None;
        }
        let amount = (self.vitals.max_health() / rest::DIVISOR).max(rest::MIN_HEAL);
        self.vitals.heal(amount);
        Some(amount)
    }

    /// Remove the first inventory item with this name
    pub fn take_from_inventory(&mut self, name: &str) -> Option<Item> {
        item::take_named(&mut self.inventory, name)
    }
}
