use rand::Rng;

use crate::game::systems::combat;
use crate::world::graph::Encounter;
use crate::world::player::PlayerId;

/// What happened during one room's monster turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub attacks: u32,
    pub deaths: u32,
}

impl TurnReport {
    pub fn merge(&mut self, other: TurnReport) {
        self.attacks += other.attacks;
        self.deaths += other.deaths;
    }
}

/// Whether a living monster acts this tick
fn wants_to_attack<R: Rng + ?Sized>(rng: &mut R, aggressive: bool, passive_attack_chance: f64) -> bool {
    aggressive || rng.gen_bool(passive_attack_chance.clamp(0.0, 1.0))
}

/// Let every living monster in the encounter's room take its turn.
///
/// Aggressive monsters always attack a random player present; passive ones
/// attack with `passive_attack_chance`. A killed player is respawned before
/// the next monster acts, so it is never attacked twice in one tick.
pub fn run_monster_turns<R: Rng + ?Sized>(
    rng: &mut R,
    encounter: &mut Encounter<'_>,
    passive_attack_chance: f64,
) -> TurnReport {
    let mut report = TurnReport::default();

    for index in 0..encounter.contents.monsters.len() {
        let killed: Option<PlayerId> = {
            let contents = &mut *encounter.contents;
            if contents.players.is_empty() {
                break;
            }

            let monster = &contents.monsters[index];
            if !monster.is_alive() || !wants_to_attack(rng, monster.aggressive, passive_attack_chance)
            {
                continue;
            }

            let target = rng.gen_range(0..contents.players.len());
            let victim = &mut contents.players[target];
            let hit = combat::monster_attacks_player(rng, monster, victim);
            let (victim_id, victim_name) = (victim.id, victim.name.clone());
            report.attacks += 1;

            if hit.killed() {
                victim.send("You have been killed!");
                contents.broadcast(
                    &format!("{} has been killed by {}!", victim_name, monster.name),
                    Some(victim_id),
                );
                Some(victim_id)
            } else {
                victim.send(format!("The {} attacks you for {} damage!", monster.name, hit.damage));
                contents.broadcast(
                    &format!("{} attacks {}!", monster.name, victim_name),
                    Some(victim_id),
                );
                None
            }
        };

        if let Some(id) = killed {
            report.deaths += 1;
            encounter.respawn_player(id);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::outbox::{drain_lines, Outbox, OutboxReceiver};
    use crate::world::graph::World;
    use crate::world::monster::Monster;
    use crate::world::player::{Player, PlayerTemplate};
    use crate::world::room::{Direction, Room, RoomContents, RoomKey};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn create_world(monsters: Vec<Monster>) -> World {
        let square_exits: BTreeMap<Direction, RoomKey> =
            [(Direction::South, "cellar".to_string())].into_iter().collect();
        let cellar_exits: BTreeMap<Direction, RoomKey> =
            [(Direction::North, "square".to_string())].into_iter().collect();
        let cellar = RoomContents {
            monsters,
            ..RoomContents::default()
        };

        let mut builder = World::builder();
        builder
            .register(Room::new("square", "Town Square", "", square_exits, RoomContents::default()))
            .unwrap()
            .register(Room::new("cellar", "Cellar", "", cellar_exits, cellar))
            .unwrap();
        builder.start_room("square");
        builder.build().unwrap()
    }

    fn join(world: &World, name: &str) -> (PlayerId, OutboxReceiver) {
        let (outbox, rx) = Outbox::channel(64);
        let player = Player::new(Uuid::new_v4(), name.to_string(), PlayerTemplate::default(), outbox);
        (world.add_player(player), rx)
    }

    fn cellar_index(world: &World) -> usize {
        world.rooms().iter().position(|r| r.key() == "cellar").unwrap()
    }

    #[test]
    fn test_aggressive_monster_attacks() {
        let world = create_world(vec![Monster::new("giant rat", "", 15, 3, true)]);
        let (alice, mut alice_rx) = join(&world, "Alice");
        let (bob, mut bob_rx) = join(&world, "Bob");
        world.move_player(alice, Direction::South).unwrap();
        world.move_player(bob, Direction::South).unwrap();
        drain_lines(&mut alice_rx);
        drain_lines(&mut bob_rx);

        let mut rng = StdRng::seed_from_u64(9);
        let report = {
            let mut encounter = world.encounter(cellar_index(&world)).unwrap();
            run_monster_turns(&mut rng, &mut encounter, 0.0)
        };

        assert_eq!(report, TurnReport { attacks: 1, deaths: 0 });
        let alice_lines = drain_lines(&mut alice_rx);
        let bob_lines = drain_lines(&mut bob_rx);
        let (victim_lines, witness_lines) = if alice_lines[0].starts_with("The giant rat") {
            (alice_lines, bob_lines)
        } else {
            (bob_lines, alice_lines)
        };
        assert!(victim_lines[0].starts_with("The giant rat attacks you for "));
        assert!(witness_lines[0].starts_with("giant rat attacks "));
    }

    #[test]
    fn test_empty_room_is_skipped() {
        let world = create_world(vec![Monster::new("giant rat", "", 15, 3, true)]);
        let mut rng = StdRng::seed_from_u64(1);

        let mut encounter = world.encounter(cellar_index(&world)).unwrap();
        let report = run_monster_turns(&mut rng, &mut encounter, 1.0);

        assert_eq!(report, TurnReport::default());
    }

    #[test]
    fn test_dead_monster_does_nothing() {
        let mut rat = Monster::new("giant rat", "", 15, 3, true);
        rat.take_damage(15);
        let world = create_world(vec![rat]);
        let (alice, _rx) = join(&world, "Alice");
        world.move_player(alice, Direction::South).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let mut encounter = world.encounter(cellar_index(&world)).unwrap();
        assert_eq!(run_monster_turns(&mut rng, &mut encounter, 1.0).attacks, 0);
    }

    #[test]
    fn test_passive_monster_chance() {
        let world = create_world(vec![Monster::new("old owl", "", 10, 1, false)]);
        let (alice, _rx) = join(&world, "Alice");
        world.move_player(alice, Direction::South).unwrap();
        let cellar = cellar_index(&world);
        let mut rng = StdRng::seed_from_u64(4);

        let never: u32 = (0..50)
            .map(|_| run_monster_turns(&mut rng, &mut world.encounter(cellar).unwrap(), 0.0).attacks)
            .sum();
        assert_eq!(never, 0);

        let always = run_monster_turns(&mut rng, &mut world.encounter(cellar).unwrap(), 1.0);
        assert_eq!(always.attacks, 1);
    }

    #[test]
    fn test_killed_player_respawns_in_start_room() {
        let world = create_world(vec![
            Monster::new("ancient dragon", "", 100, 40, true),
            Monster::new("second dragon", "", 100, 40, true),
        ]);
        let (alice, mut alice_rx) = join(&world, "Alice");
        world.move_player(alice, Direction::South).unwrap();
        drain_lines(&mut alice_rx);

        let mut rng = StdRng::seed_from_u64(2);
        let report = {
            let mut encounter = world.encounter(cellar_index(&world)).unwrap();
            run_monster_turns(&mut rng, &mut encounter, 0.0)
        };

        // The second dragon finds the room empty after the respawn
        assert_eq!(report, TurnReport { attacks: 1, deaths: 1 });
        assert_eq!(world.location(alice).unwrap().name, "Town Square");
        let health = world.with_player(alice, |scope| scope.player.vitals.health()).unwrap();
        assert_eq!(health, 30);
        assert_eq!(
            drain_lines(&mut alice_rx),
            vec!["You have been killed!", "You respawn in Town Square, fully healed."]
        );
        assert!(world.consistency_violations().is_empty());
    }

    #[test]
    fn test_death_witnessed_by_room() {
        let world = create_world(vec![Monster::new("ancient dragon", "", 100, 40, true)]);
        let (alice, _a) = join(&world, "Alice");
        let (bob, mut bob_rx) = join(&world, "Bob");
        // Armor keeps Bob alive so the dragon only kills whoever it rolls
        world.move_player(alice, Direction::South).unwrap();
        world.move_player(bob, Direction::South).unwrap();
        world.with_player(bob, |scope| {
            scope.player.inventory.push(crate::world::item::Item::armor("plate", "", 100));
            scope.player.equip("plate").unwrap();
        });
        drain_lines(&mut bob_rx);

        let mut rng = StdRng::seed_from_u64(3);
        let mut deaths = 0;
        for _ in 0..20 {
            let mut encounter = world.encounter(cellar_index(&world)).unwrap();
            deaths += run_monster_turns(&mut rng, &mut encounter, 0.0).deaths;
            if deaths > 0 {
                break;
            }
        }

        assert_eq!(deaths, 1);
        let lines = drain_lines(&mut bob_rx);
        assert!(lines.contains(&"Alice has been killed by ancient dragon!".to_string()));
    }
}
