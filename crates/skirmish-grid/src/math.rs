use core::ops::{Add, Div, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 2D vector used for world positions and tile-space ray marching.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product; positive when `other` is counter-clockwise of `self`.
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Unit-length copy, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len <= f32::EPSILON {
            None
        } else {
            Some(self / len)
        }
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Integer tile coordinate. Tile `(x, y)` covers `[x, x+1) × [y, y+1)` in tile space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile-space centre of this tile.
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Tile containing a tile-space point.
    pub fn containing(p: Vec2) -> TilePos {
        TilePos::new(p.x.floor() as i32, p.y.floor() as i32)
    }

    pub fn offset(self, dx: i32, dy: i32) -> TilePos {
        TilePos::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev distance, matching the 8-direction movement system.
    pub fn chebyshev(self, other: TilePos) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    pub fn is_adjacent(self, other: TilePos) -> bool {
        self != other && self.chebyshev(other) == 1
    }

    /// Every tile the centre-to-centre segment `self -> other` enters, in order, both ends
    /// included.
    ///
    /// Boundary crossings are compared in integer arithmetic, so the walk is exact and visits
    /// the same tiles in either direction. A segment passing exactly through a tile corner
    /// steps diagonally.
    pub fn line_to(self, other: TilePos) -> Vec<TilePos> {
        let dx = i64::from(other.x) - i64::from(self.x);
        let dy = i64::from(other.y) - i64::from(self.y);
        let (nx, ny) = (dx.abs(), dy.abs());
        let (sx, sy) = (dx.signum() as i32, dy.signum() as i32);

        let mut cur = self;
        let mut out = Vec::with_capacity((nx + ny + 1) as usize);
        out.push(cur);
        let (mut ix, mut iy) = (0i64, 0i64);
        while ix < nx || iy < ny {
            // Next vertical boundary at t = (ix + 0.5) / nx, horizontal at (iy + 0.5) / ny.
            let vertical = (1 + 2 * ix) * ny;
            let horizontal = (1 + 2 * iy) * nx;
            match vertical.cmp(&horizontal) {
                core::cmp::Ordering::Equal => {
                    cur = cur.offset(sx, sy);
                    ix += 1;
                    iy += 1;
                }
                core::cmp::Ordering::Less => {
                    cur = cur.offset(sx, 0);
                    ix += 1;
                }
                core::cmp::Ordering::Greater => {
                    cur = cur.offset(0, sy);
                    iy += 1;
                }
            }
            out.push(cur);
        }
        out
    }
}

impl core::fmt::Display for TilePos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
