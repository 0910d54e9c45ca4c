use std::collections::hash_map::Entry;

use crate::map::Map;
use crate::schema::{CommandBatch, TurnMessage, UnitID, UnitUpdate};
use crate::unit::Unit;
use crate::FastHashMap;

/// Game state for one connection. Tiles and units are never forgotten.
pub struct Match {
    map: Map,
    units: FastHashMap<UnitID, Unit>,
}

impl Match {
    pub fn new() -> Match {
        Match::with_map(Map::new())
    }

    pub fn with_map(map: Map) -> Match {
        Match {
            map,
            units: FastHashMap::default(),
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn unit(&self, id: UnitID) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Applies every message of `batch` in order, then lets each known unit
    /// decide. The result covers the whole batch, however many turns it spans.
    pub fn process_updates(&mut self, batch: &[TurnMessage]) -> CommandBatch {
        for message in batch {
            self.map.update_tiles(&message.tile_updates);
            // TODO: read turn 0 game info (unit stats, game time) once the server sends it
            for update in &message.unit_updates {
                self.update_unit(update);
            }
        }

        let Match { ref mut map, ref units } = *self;
        let mut acting: Vec<&Unit> = units.values().collect();
        acting.sort_by_key(|unit| unit.id);

        CommandBatch {
            commands: acting.into_iter().filter_map(|unit| unit.act(map)).collect(),
        }
    }

    fn update_unit(&mut self, update: &UnitUpdate) {
        match self.units.entry(update.id) {
            Entry::Occupied(mut known) => known.get_mut().merge(update),
            Entry::Vacant(slot) => match Unit::from_update(update) {
                Ok(unit) => {
                    slot.insert(unit);
                }
                Err(e) => warn!("skipping update for unit {}: {}", update.id, e),
            },
        }
    }
}

impl Default for Match {
    fn default() -> Match {
        Match::new()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::geometry::{Direction, Vector};
    use crate::schema::Command;
    use crate::unit::UnitKind;

    fn turn(json: &str) -> TurnMessage {
        serde_json::from_str(json).unwrap()
    }

    fn game() -> Match {
        Match::with_map(Map::with_rng(StdRng::seed_from_u64(3)))
    }

    #[test]
    fn test_gather_from_adjacent_tile() {
        let mut game = game();
        let batch = game.process_updates(&[turn(r#"{
            "tile_updates": [{"x": 6, "y": 0, "resources": true}],
            "unit_updates": [{"id": 12, "type": "worker", "x": 5, "y": 0, "status": "idle", "resource": 0}]
        }"#)]);

        assert_eq!(batch.commands, vec![Command::gather(12, Direction::East)]);
    }

    #[test]
    fn test_loaded_worker_moves_home() {
        let mut game = game();
        let batch = game.process_updates(&[turn(r#"{
            "tile_updates": [],
            "unit_updates": [{"id": 4, "type": "worker", "x": 2, "y": 2, "status": "idle", "resource": 2}]
        }"#)]);

        assert_eq!(batch.commands, vec![Command::move_to(4, Direction::North)]);
    }

    #[test]
    fn test_units_persist_across_turns() {
        let mut game = game();
        game.process_updates(&[turn(r#"{
            "tile_updates": [{"x": 3, "y": 1, "resources": true}],
            "unit_updates": [
                {"id": 1, "type": "base", "x": 0, "y": 0, "status": "idle", "resource": 0},
                {"id": 2, "type": "worker", "x": 0, "y": 0, "status": "moving", "resource": 0}
            ]
        }"#)]);
        let batch = game.process_updates(&[turn(r#"{
            "tile_updates": [],
            "unit_updates": [{"id": 2, "x": 2, "y": 1, "status": "idle"}]
        }"#)]);

        assert_eq!(game.unit_count(), 2);
        assert_eq!(game.unit(1).unwrap().kind, UnitKind::Base);
        assert_eq!(game.unit(2).unwrap().position, Vector::new(2, 1));
        assert_eq!(batch.commands, vec![Command::gather(2, Direction::East)]);
    }

    #[test]
    fn test_unknown_unit_type_is_skipped() {
        let mut game = game();
        let batch = game.process_updates(&[turn(r#"{
            "tile_updates": [],
            "unit_updates": [
                {"id": 7, "type": "dragon", "x": 1, "y": 1, "status": "idle", "resource": 0},
                {"id": 8, "x": 1, "y": 1, "status": "idle", "resource": 0},
                {"id": 9, "type": "worker", "x": -3, "y": 0, "status": "idle", "resource": 5}
            ]
        }"#)]);

        assert!(game.unit(7).is_none());
        assert!(game.unit(8).is_none());
        assert_eq!(batch.commands, vec![Command::move_to(9, Direction::East)]);
    }

    #[test]
    fn test_batch_applies_messages_in_order() {
        let mut game = game();
        let batch = game.process_updates(&[
            turn(r#"{
                "tile_updates": [{"x": 1, "y": 0, "resources": true}],
                "unit_updates": [{"id": 5, "type": "worker", "x": 0, "y": 0, "status": "idle", "resource": 0}]
            }"#),
            turn(r#"{
                "tile_updates": [{"x": 1, "y": 0, "resources": null}, {"x": 0, "y": -3, "resources": true}],
                "unit_updates": [{"id": 6, "type": "worker", "x": 4, "y": 4, "status": "idle", "resource": 1}]
            }"#),
            turn(r#"{
                "tile_updates": [],
                "unit_updates": [{"id": 6, "status": "moving"}]
            }"#),
        ]);

        assert!(!game.map().tile(Vector::new(1, 0)).unwrap().has_resources());
        assert_eq!(batch.commands, vec![Command::move_to(5, Direction::North)]);
    }

    #[test]
    fn test_extreme_coordinates() {
        let mut game = game();
        let batch = game.process_updates(&[turn(r#"{
            "tile_updates": [{"x": 2147483647, "y": 0, "resources": true}],
            "unit_updates": [
                {"id": 1, "type": "worker", "x": -5, "y": 0, "status": "idle", "resource": 0},
                {"id": 2, "type": "worker", "x": -2147483648, "y": 2147483647, "status": "idle", "resource": 3}
            ]
        }"#)]);

        assert_eq!(batch.commands, vec![
            Command::move_to(1, Direction::East),
            Command::move_to(2, Direction::North),
        ]);
    }

    #[test]
    fn test_commands_are_ordered_by_unit() {
        let mut game = game();
        let batch = game.process_updates(&[turn(r#"{
            "tile_updates": [],
            "unit_updates": [
                {"id": 30, "type": "worker", "x": 1, "y": 0, "status": "idle", "resource": 1},
                {"id": 10, "type": "worker", "x": 0, "y": 1, "status": "idle", "resource": 1},
                {"id": 20, "type": "worker", "x": -1, "y": 0, "status": "idle", "resource": 1}
            ]
        }"#)]);

        let units: Vec<_> = batch.commands.iter().map(|c| c.unit).collect();
        assert_eq!(units, vec![10, 20, 30]);
        assert_eq!(batch.commands[0].dir, Direction::North);
        assert_eq!(batch.commands[1].dir, Direction::East);
        assert_eq!(batch.commands[2].dir, Direction::West);
    }
}
