use serde::{Deserialize, Deserializer};
use serde_json::{Map as JsonMap, Value};

use crate::geometry::Direction;

pub type UnitID = u64;

/// Fields a record carries that the bot has no use for (yet). Kept so that
/// merges never lose what the server reported.
pub type Extra = JsonMap<String, Value>;

/// One turn's worth of deltas, as sent by the game server on a single line.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    pub tile_updates: Vec<TileUpdate>,
    pub unit_updates: Vec<UnitUpdate>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TileUpdate {
    pub x: i32,
    pub y: i32,
    // `None` when the key is absent, `Some(Null)` when the server cleared it
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UnitUpdate {
    pub id: UnitID,
    // note: this field is renamed because "type" is a keyword in rust
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandKind {
    Move,
    Gather,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Command {
    pub command: CommandKind,
    pub unit: UnitID,
    pub dir: Direction,
}

impl Command {
    pub fn move_to(unit: UnitID, dir: Direction) -> Command {
        Command { command: CommandKind::Move, unit, dir }
    }

    pub fn gather(unit: UnitID, dir: Direction) -> Command {
        Command { command: CommandKind::Gather, unit, dir }
    }
}

/// The single response written back for each decision pass.
#[derive(PartialEq, Eq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandBatch {
    pub commands: Vec<Command>,
}

fn present<'de, D>(deserializer: D) -> ::std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
