use std::fmt;
use std::ops::Sub;

/// A tile coordinate.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    pub const ORIGIN: Vector = Vector { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Vector {
        Vector { x, y }
    }

    /// Component-wise sign. A zero component stays zero.
    pub fn orientation(self) -> Vector {
        Vector {
            x: self.x.signum(),
            y: self.y.signum(),
        }
    }
}

/// Displacement between two coordinates. Wide enough that subtracting any
/// two `Vector`s is exact.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

impl Offset {
    /// Component-wise sign, as a unit step.
    pub fn orientation(self) -> Vector {
        Vector {
            x: self.x.signum() as i32,
            y: self.y.signum() as i32,
        }
    }

    /// Squared euclidean length; orders the same as the true magnitude.
    pub fn magnitude_squared(self) -> i128 {
        let x = i128::from(self.x);
        let y = i128::from(self.y);
        x * x + y * y
    }
}

impl Sub for Vector {
    type Output = Offset;

    fn sub(self, other: Vector) -> Offset {
        Offset {
            x: i64::from(self.x) - i64::from(other.x),
            y: i64::from(self.y) - i64::from(other.y),
        }
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "W")]
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::North,
    ];

    /// Looks up an orientation vector in the direction table.
    ///
    /// Diagonals are not resolved by angle: the three southward vectors map
    /// to `S`, the three northward ones to `N`, and only the pure horizontals
    /// yield `E` or `W`. Returns `None` for the zero vector or anything that
    /// is not an orientation.
    pub fn from_orientation(orientation: Vector) -> Option<Direction> {
        match (orientation.x, orientation.y) {
            (1, 0) => Some(Direction::East),
            (1, 1) => Some(Direction::South),
            (0, 1) => Some(Direction::South),
            (-1, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            (-1, -1) => Some(Direction::North),
            (0, -1) => Some(Direction::North),
            (1, -1) => Some(Direction::North),
            _ => None,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::East => "E",
            Direction::South => "S",
            Direction::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.letter())
    }
}
