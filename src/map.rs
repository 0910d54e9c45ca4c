use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::Value;

use crate::geometry::{Direction, Vector};
use crate::schema::{Extra, TileUpdate};
use crate::FastHashMap;

/// Everything the server has told us about one tile so far.
#[derive(PartialEq, Debug, Clone)]
pub struct Tile {
    pub position: Vector,
    pub resources: Option<Value>,
    pub extra: Extra,
}

impl Tile {
    fn new(position: Vector) -> Tile {
        Tile {
            position,
            resources: None,
            extra: Extra::new(),
        }
    }

    /// Overwrites every field present in `update`, keeps the rest.
    pub fn merge(&mut self, update: &TileUpdate) {
        if let Some(ref resources) = update.resources {
            self.resources = Some(resources.clone());
        }
        for (key, value) in &update.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn has_resources(&self) -> bool {
        match self.resources {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        }
    }
}

/// Sparse view of the world, in the frame where our base sits at the origin.
pub struct Map {
    tiles: FastHashMap<Vector, Tile>,
    rng: Box<dyn RngCore + Send>,
}

impl Map {
    pub fn new() -> Map {
        Map::with_rng(StdRng::from_entropy())
    }

    /// Uses `rng` to pick a direction when no resource is known.
    pub fn with_rng<R: RngCore + Send + 'static>(rng: R) -> Map {
        Map {
            tiles: FastHashMap::default(),
            rng: Box::new(rng),
        }
    }

    pub fn tile(&self, position: Vector) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn update_tiles(&mut self, updates: &[TileUpdate]) {
        for update in updates {
            let position = Vector::new(update.x, update.y);
            self.tiles
                .entry(position)
                .or_insert_with(|| Tile::new(position))
                .merge(update);
        }
    }

    /// Direction back to the base. `None` when already standing on it.
    // TODO: route around blocked tiles once the server reports them reliably
    pub fn direction_home(&self, from: Vector) -> Option<Direction> {
        Direction::from_orientation((Vector::ORIGIN - from).orientation())
    }

    /// Direction of the closest known resource tile and whether it is exactly
    /// one step away.
    ///
    /// The tile under `from` itself is never a candidate. Equally distant
    /// tiles are broken by the smallest coordinate (x, then y). With no
    /// resource known, a random direction is returned so the unit explores.
    pub fn direction_of_nearest_resource(&mut self, from: Vector) -> (Direction, bool) {
        let nearest = self
            .tiles
            .values()
            .filter(|tile| tile.position != from && tile.has_resources())
            .map(|tile| ((tile.position - from).magnitude_squared(), tile.position))
            .min();

        if let Some((distance, position)) = nearest {
            if let Some(dir) = Direction::from_orientation((position - from).orientation()) {
                return (dir, distance == 1);
            }
        }

        (self.wander(), false)
    }

    fn wander(&mut self) -> Direction {
        Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())]
    }
}

impl Default for Map {
    fn default() -> Map {
        Map::new()
    }
}
