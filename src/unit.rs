use crate::geometry::Vector;
use crate::map::Map;
use crate::schema::{Command, Extra, UnitID, UnitUpdate};
use crate::{Error, ErrorKind, Result};

pub const IDLE: &str = "idle";

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum UnitKind {
    /// Never acts.
    Base,
    /// Shuttles resources between the nearest known deposit and the base.
    Worker,
}

/// Every variant the bot knows how to drive, keyed by its capitalized tag.
const VARIANTS: &[(&str, UnitKind)] = &[
    ("Base", UnitKind::Base),
    ("Worker", UnitKind::Worker),
];

impl UnitKind {
    /// Resolves a server-reported type tag; "worker", "WORKER" and "Worker"
    /// all name the same variant.
    pub fn from_type_tag(tag: &str) -> Result<UnitKind> {
        let name = capitalize(tag);
        VARIANTS
            .iter()
            .find(|&&(variant, _)| variant == name)
            .map(|&(_, kind)| kind)
            .ok_or_else(|| ErrorKind::UnknownUnitType(tag.into()).into())
    }

    pub fn name(self) -> &'static str {
        match self {
            UnitKind::Base => "Base",
            UnitKind::Worker => "Worker",
        }
    }
}

fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Last known state of one of our units.
#[derive(PartialEq, Debug, Clone)]
pub struct Unit {
    pub id: UnitID,
    pub kind: UnitKind,
    pub position: Vector,
    pub status: String,
    /// Amount of resource currently carried.
    pub resource: i64,
    pub extra: Extra,
}

impl Unit {
    /// Builds a unit from its first observation. The variant is fixed here;
    /// `type` in later updates is ignored.
    pub fn from_update(update: &UnitUpdate) -> Result<Unit> {
        let tag = update
            .unit_type
            .as_ref()
            .ok_or_else(|| Error::from(ErrorKind::MissingUnitType(update.id)))?;
        let mut unit = Unit {
            id: update.id,
            kind: UnitKind::from_type_tag(tag)?,
            position: Vector::ORIGIN,
            status: String::new(),
            resource: 0,
            extra: Extra::new(),
        };
        unit.merge(update);
        Ok(unit)
    }

    pub fn merge(&mut self, update: &UnitUpdate) {
        if let Some(x) = update.x {
            self.position.x = x;
        }
        if let Some(y) = update.y {
            self.position.y = y;
        }
        if let Some(ref status) = update.status {
            self.status = status.clone();
        }
        if let Some(resource) = update.resource {
            self.resource = resource;
        }
        for (key, value) in &update.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == IDLE
    }

    /// Picks this turn's command, if any.
    pub fn act(&self, map: &mut Map) -> Option<Command> {
        match self.kind {
            UnitKind::Base => None,
            UnitKind::Worker => self.work(map),
        }
    }

    fn work(&self, map: &mut Map) -> Option<Command> {
        debug!("{}#{}: I'm {}", self.kind.name(), self.id, self.status);
        if !self.is_idle() {
            return None;
        }

        if self.resource == 0 {
            let (dir, adjacent) = map.direction_of_nearest_resource(self.position);
            if adjacent {
                debug!("{}#{}: gathering {}", self.kind.name(), self.id, dir);
                Some(Command::gather(self.id, dir))
            } else {
                debug!("{}#{}: moving {}", self.kind.name(), self.id, dir);
                Some(Command::move_to(self.id, dir))
            }
        } else {
            match map.direction_home(self.position) {
                Some(dir) => {
                    debug!("{}#{}: heading home {}", self.kind.name(), self.id, dir);
                    Some(Command::move_to(self.id, dir))
                }
                None => {
                    debug!("{}#{}: already home", self.kind.name(), self.id);
                    None
                }
            }
        }
    }
}
