use serde::{Deserialize, Serialize};

/// Item category with its bonus; armor can never carry a damage bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemKind {
    Weapon { damage: i32 },
    Armor { defense: i32 },
    Misc,
}

/// Equipment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Weapon,
    Armor,
}

/// A carryable object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }

    pub fn weapon(name: impl Into<String>, description: impl Into<String>, damage: i32) -> Self {
        Self::new(name, description, ItemKind::Weapon { damage })
    }

    pub fn armor(name: impl Into<String>, description: impl Into<String>, defense: i32) -> Self {
        Self::new(name, description, ItemKind::Armor { defense })
    }

    pub fn misc(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ItemKind::Misc)
    }

    /// Damage bonus when wielded (0 for non-weapons)
    pub fn damage_bonus(&self) -> i32 {
        match self.kind {
            ItemKind::Weapon { damage } => damage,
            _ => 0,
        }
    }

    /// Defense bonus when worn (0 for non-armor)
    pub fn defense_bonus(&self) -> i32 {
        match self.kind {
            ItemKind::Armor { defense } => defense,
            _ => 0,
        }
    }

    /// Which slot this item occupies, if any
    pub fn slot(&self) -> Option<Slot> {
        match self.kind {
            ItemKind::Weapon { .. } => Some(Slot::Weapon),
            ItemKind::Armor { .. } => Some(Slot::Armor),
            ItemKind::Misc => None,
        }
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// One-line examine text with bonus annotation
    pub fn describe(&self) -> String {
        match self.kind {
            ItemKind::Weapon { damage } if damage > 0 => {
                format!("{}: {} (Damage: +{})", self.name, self.description, damage)
            }
            ItemKind::Armor { defense } if defense > 0 => {
                format!("{}: {} (Defense: +{})", self.name, self.description, defense)
            }
            _ => format!("{}: {}", self.name, self.description),
        }
    }
}

/// First item matching `name` (case-insensitive)
pub fn find_named<'a>(items: &'a [Item], name: &str) -> Option<&'a Item> {
    items.iter().find(|item| item.is_named(name))
}

/// Remove and return the first item matching `name`, preserving the order of the rest
pub fn take_named(items: &mut Vec<Item>, name: &str) -> Option<Item> {
    let index = items.iter().position(|item| item.is_named(name))?;
    Some(items.remove(index))
}
