//! World content
//!
//! Rooms, items and monsters are plain data: either the built-in reference
//! world or a JSON file with the same shape. [`World::from_spec`] turns that
//! data into a validated, lockable graph.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::world::graph::{World, WorldError};
use crate::world::item::Item;
use crate::world::monster::Monster;
use crate::world::room::{Direction, Room, RoomContents, RoomKey};

/// World content errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Failed to read world file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid world file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("Monster '{monster}' in room '{room}' must have positive health")]
    InvalidMonster { room: RoomKey, monster: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpec {
    pub name: String,
    pub description: String,
    pub health: i32,
    pub damage: i32,
    #[serde(default)]
    pub aggressive: bool,
}

impl MonsterSpec {
    fn new(name: &str, description: &str, health: i32, damage: i32, aggressive: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            health,
            damage,
            aggressive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub key: RoomKey,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub exits: BTreeMap<Direction, RoomKey>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub monsters: Vec<MonsterSpec>,
}

impl RoomSpec {
    fn new(key: &str, name: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            exits: BTreeMap::new(),
            items: Vec::new(),
            monsters: Vec::new(),
        }
    }

    fn exit(mut self, direction: Direction, target: &str) -> Self {
        self.exits.insert(direction, target.to_string());
        self
    }

    fn item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    fn monster(mut self, monster: MonsterSpec) -> Self {
        self.monsters.push(monster);
        self
    }
}

/// Complete description of a world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSpec {
    pub start_room: RoomKey,
    pub rooms: Vec<RoomSpec>,
}

impl WorldSpec {
    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The built-in twelve-room world
    pub fn reference() -> Self {
        use Direction::*;

        let rooms = vec![
            RoomSpec::new(
                "town_square",
                "Town Square",
                "You are standing in a bustling town square. There are paths leading in all directions.",
            )
            .exit(North, "tavern")
            .exit(South, "forest")
            .exit(East, "market")
            .exit(West, "temple"),
            RoomSpec::new(
                "tavern",
                "The Prancing Pony Tavern",
                "A cozy tavern filled with the smell of ale and roasted meat. Wooden tables and chairs are scattered around.",
            )
            .exit(South, "town_square")
            .exit(Up, "armory")
            .item(Item::misc("wooden mug", "A sturdy wooden drinking mug")),
            RoomSpec::new(
                "forest",
                "Dark Forest",
                "A dense forest with towering trees that block most of the sunlight. Strange sounds echo from the shadows.",
            )
            .exit(North, "town_square")
            .exit(South, "deep_forest")
            .exit(Down, "dungeon")
            .item(Item::weapon(
                "twisted branch",
                "A gnarled branch that could serve as a walking stick",
                2,
            ))
            .monster(MonsterSpec::new(
                "giant rat",
                "A large, mangy rat with red eyes and yellowed teeth",
                15,
                3,
                true,
            ))
            .monster(MonsterSpec::new(
                "dire wolf",
                "A massive wolf with silver fur and piercing blue eyes",
                25,
                6,
                true,
            )),
            RoomSpec::new(
                "market",
                "Marketplace",
                "A busy marketplace with merchants hawking their wares. Colorful stalls line the cobblestone square.",
            )
            .exit(West, "town_square")
            .item(Item::misc("shiny coin", "A gold coin that glints in the sunlight"))
            .monster(MonsterSpec::new(
                "bandit",
                "A shifty-looking human in leather armor, clutching a rusty dagger",
                20,
                5,
                true,
            )),
            RoomSpec::new(
                "temple",
                "Ancient Temple",
                "A sacred temple with marble columns and intricate carvings. A sense of peace fills the air.",
            )
            .exit(East, "town_square")
            .exit(Down, "catacombs")
            .exit(Up, "wizard_tower")
            .item(Item::misc(
                "prayer book",
                "An old leather-bound book of prayers and rituals",
            ))
            .monster(MonsterSpec::new(
                "shadowy cultist",
                "A robed figure with glowing red eyes chanting in an unknown language",
                18,
                4,
                true,
            )),
            RoomSpec::new(
                "dungeon",
                "Dungeon Entrance",
                "A crumbling stone entrance leads into darkness. Ancient torches flicker on the walls.",
            )
            .exit(Up, "forest")
            .exit(North, "catacombs")
            .item(Item::misc("rusty key", "An old iron key, corroded with age"))
            .monster(MonsterSpec::new(
                "skeleton warrior",
                "An ancient skeleton in rusted armor, wielding a bone sword",
                20,
                5,
                false,
            )),
            RoomSpec::new(
                "deep_forest",
                "Deep Forest",
                "The forest grows darker here. Thick canopy blocks all sunlight. Something large moves in the shadows.",
            )
            .exit(North, "forest")
            .exit(West, "cemetery")
            .exit(East, "dragon_lair")
            .item(Item::weapon(
                "iron sword",
                "A well-forged iron sword with a sharp edge",
                8,
            ))
            .monster(MonsterSpec::new(
                "cave bear",
                "A massive brown bear with razor-sharp claws and a thunderous roar",
                40,
                8,
                true,
            )),
            RoomSpec::new(
                "catacombs",
                "Ancient Catacombs",
                "Narrow stone passages wind through countless burial chambers. The air is thick with age and mystery.",
            )
            .exit(Up, "temple")
            .exit(South, "dungeon")
            .item(Item::armor(
                "leather armor",
                "Sturdy leather armor that provides good protection",
                3,
            ))
            .monster(MonsterSpec::new(
                "shambling zombie",
                "A rotting corpse that moves with unnatural hunger",
                25,
                4,
                true,
            ))
            .monster(MonsterSpec::new(
                "ancient mummy",
                "Wrapped in decaying bandages, this ancient guardian protects the tombs",
                30,
                6,
                false,
            )),
            RoomSpec::new(
                "wizard_tower",
                "Wizard's Tower",
                "A tall stone tower filled with magical artifacts and glowing crystals. Books float in mid-air.",
            )
            .exit(Down, "temple")
            .item(Item::weapon(
                "magic staff",
                "A wooden staff topped with a glowing crystal orb",
                10,
            ))
            .item(Item::misc(
                "tome of knowledge",
                "A heavy tome filled with arcane wisdom",
            ))
            .monster(MonsterSpec::new(
                "fire imp",
                "A small demonic creature wreathed in flames with a mischievous grin",
                15,
                7,
                true,
            )),
            RoomSpec::new(
                "dragon_lair",
                "Dragon's Lair",
                "A massive cavern with piles of gold and treasure. Scorch marks cover the walls. The air shimmers with heat.",
            )
            .exit(West, "deep_forest")
            .item(Item::armor(
                "dragon scale",
                "A massive golden scale, still warm to the touch",
                8,
            ))
            .monster(MonsterSpec::new(
                "ancient dragon",
                "A colossal red dragon with scales like molten gold and eyes like burning coals",
                100,
                15,
                true,
            )),
            RoomSpec::new(
                "cemetery",
                "Moonlit Cemetery",
                "Ancient gravestones stretch as far as you can see. Mist swirls between the weathered monuments.",
            )
            .exit(East, "deep_forest")
            .item(Item::weapon(
                "silver cross",
                "A blessed silver cross that gleams in the moonlight",
                6,
            ))
            .monster(MonsterSpec::new(
                "wandering spirit",
                "A translucent figure that wails mournfully as it drifts between the graves",
                20,
                3,
                false,
            ))
            .monster(MonsterSpec::new(
                "vengeful wraith",
                "A dark specter filled with malice and hatred for the living",
                35,
                9,
                true,
            )),
            RoomSpec::new(
                "armory",
                "Castle Armory",
                "Weapons and armor line the walls of this military storehouse. Everything is kept in perfect condition.",
            )
            .exit(Down, "tavern")
            .item(Item::armor(
                "steel shield",
                "A heavy steel shield emblazoned with a royal crest",
                5,
            ))
            .monster(MonsterSpec::new(
                "castle guard",
                "A heavily armored soldier sworn to protect the castle's treasures",
                35,
                7,
                false,
            )),
        ];

        Self {
            start_room: "town_square".to_string(),
            rooms,
        }
    }
}

impl World {
    /// Build and validate a world from content data
    pub fn from_spec(spec: &WorldSpec) -> Result<World, ContentError> {
        let mut builder = World::builder();

        for room in &spec.rooms {
            let mut monsters = Vec::with_capacity(room.monsters.len());
            for m in &room.monsters {
                if m.health <= 0 {
                    return Err(ContentError::InvalidMonster {
                        room: room.key.clone(),
                        monster: m.name.clone(),
                    });
                }
                monsters.push(Monster::new(
                    m.name.clone(),
                    m.description.clone(),
                    m.health,
                    m.damage,
                    m.aggressive,
                ));
            }

            let contents = RoomContents {
                players: Vec::new(),
                items: room.items.clone(),
                monsters,
            };
            builder.register(Room::new(
                room.key.clone(),
                room.name.clone(),
                room.description.clone(),
                room.exits.clone(),
                contents,
            ))?;
        }

        builder.start_room(spec.start_room.clone());
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::item::ItemKind;

    #[test]
    fn test_reference_world_builds() {
        let world = World::from_spec(&WorldSpec::reference()).unwrap();

        assert_eq!(world.rooms().len(), 12);
        assert_eq!(world.start_room().name, "Town Square");
        assert_eq!(world.player_count(), 0);
    }

    #[test]
    fn test_reference_town_square() {
        let world = World::from_spec(&WorldSpec::reference()).unwrap();
        let square = world.start_room();

        let exits: Vec<(Direction, &str)> = square.exits().collect();
        assert_eq!(
            exits,
            vec![
                (Direction::North, "tavern"),
                (Direction::South, "forest"),
                (Direction::East, "market"),
                (Direction::West, "temple"),
            ]
        );
        assert!(square.lock().monsters.is_empty());
    }

    #[test]
    fn test_reference_monster_count() {
        let spec = WorldSpec::reference();
        let monsters: usize = spec.rooms.iter().map(|r| r.monsters.len()).sum();
        assert_eq!(monsters, 13);

        let forest = spec.rooms.iter().find(|r| r.key == "forest").unwrap();
        assert_eq!(forest.monsters[0], MonsterSpec::new(
            "giant rat",
            "A large, mangy rat with red eyes and yellowed teeth",
            15,
            3,
            true,
        ));
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "start_room": "hall",
            "rooms": [
                {
                    "key": "hall",
                    "name": "Great Hall",
                    "description": "A long hall.",
                    "exits": { "north": "yard" },
                    "items": [
                        { "name": "spear", "description": "Long.", "kind": "weapon", "damage": 4 },
                        { "name": "candle", "description": "Lit.", "kind": "misc" }
                    ]
                },
                {
                    "key": "yard",
                    "name": "Yard",
                    "description": "Open sky.",
                    "exits": { "s": "hall" },
                    "monsters": [
                        { "name": "goose", "description": "Loud.", "health": 5, "damage": 1 }
                    ]
                }
            ]
        }"#;

        let spec = WorldSpec::from_json_str(json).unwrap();
        assert_eq!(spec.rooms[0].items[0].kind, ItemKind::Weapon { damage: 4 });
        assert!(!spec.rooms[1].monsters[0].aggressive);

        let world = World::from_spec(&spec).unwrap();
        assert_eq!(world.room("yard").unwrap().exit(Direction::South), Some("hall"));
    }

    #[test]
    fn test_reference_round_trips_through_json() {
        let spec = WorldSpec::reference();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(WorldSpec::from_json_str(&json).unwrap(), spec);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            WorldSpec::from_json_str("{ not json"),
            Err(ContentError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_dangling_exit() {
        let mut spec = WorldSpec::reference();
        spec.rooms[0].exits.insert(Direction::Down, "basement".to_string());

        assert!(matches!(
            World::from_spec(&spec),
            Err(ContentError::World(WorldError::DanglingExit { .. }))
        ));
    }

    #[test]
    fn test_rejects_unknown_start() {
        let mut spec = WorldSpec::reference();
        spec.start_room = "moon".to_string();

        assert!(matches!(
            World::from_spec(&spec),
            Err(ContentError::World(WorldError::UnknownStartRoom(_)))
        ));
    }

    #[test]
    fn test_rejects_dead_monster() {
        let mut spec = WorldSpec::reference();
        spec.rooms[2].monsters[0].health = 0;

        assert!(matches!(
            World::from_spec(&spec),
            Err(ContentError::InvalidMonster { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            WorldSpec::from_json_file("/definitely/not/here.json"),
            Err(ContentError::Io(_))
        ));
    }
}
