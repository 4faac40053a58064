//! Region shapes
//!
//! A shape answers two questions for the rest of the system: does it contain a
//! block, and does it overlap another shape. Flag resolution never looks at
//! shapes beyond that.

use serde::{Deserialize, Serialize};

/// A block position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockVector {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (height).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockVector {
    /// Create a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

/// A horizontal (x, z) position, used for polygon outlines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BlockVector2 {
    /// X coordinate.
    pub x: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockVector2 {
    /// Create a horizontal position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// The area a region covers.
///
/// # Examples
///
/// ```
/// use guard_regions::{BlockVector, Shape};
///
/// let cuboid = Shape::cuboid(BlockVector::new(10, 0, 10), BlockVector::new(0, 64, 0));
/// assert!(cuboid.contains(BlockVector::new(5, 32, 5)));
/// assert!(!cuboid.contains(BlockVector::new(11, 32, 5)));
/// assert_eq!(cuboid.volume(), 11 * 65 * 11);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Covers the whole world.
    Global,

    /// An axis-aligned box; both corners are inside.
    Cuboid {
        /// Minimum corner.
        min: BlockVector,
        /// Maximum corner.
        max: BlockVector,
    },

    /// A vertical prism over a 2D outline.
    Polygon {
        /// Outline, in order.
        points: Vec<BlockVector2>,
        /// Lowest contained y.
        min_y: i32,
        /// Highest contained y.
        max_y: i32,
    },
}

impl Shape {
    /// Create a cuboid from any two opposite corners.
    pub fn cuboid(a: BlockVector, b: BlockVector) -> Self {
        Shape::Cuboid {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a polygon; the y bounds may be given in either order.
    pub fn polygon(points: Vec<BlockVector2>, y1: i32, y2: i32) -> Self {
        Shape::Polygon {
            points,
            min_y: y1.min(y2),
            max_y: y1.max(y2),
        }
    }

    /// Check if this is the global shape.
    pub fn is_global(&self) -> bool {
        matches!(self, Shape::Global)
    }

    /// Get the bounding box, or `None` for the global shape.
    pub fn bounding_box(&self) -> Option<(BlockVector, BlockVector)> {
        match self {
            Shape::Global => None,
            Shape::Cuboid { min, max } => Some((*min, *max)),
            Shape::Polygon { points, min_y, max_y } => {
                let first = points.first()?;
                let (mut min_x, mut max_x, mut min_z, mut max_z) = (first.x, first.x, first.z, first.z);
                for p in points {
                    min_x = min_x.min(p.x);
                    max_x = max_x.max(p.x);
                    min_z = min_z.min(p.z);
                    max_z = max_z.max(p.z);
                }
                Some((
                    BlockVector::new(min_x, *min_y, min_z),
                    BlockVector::new(max_x, *max_y, max_z),
                ))
            }
        }
    }

    /// Check if a block is inside this shape. Edges count as inside.
    pub fn contains(&self, point: BlockVector) -> bool {
        match self {
            Shape::Global => true,
            Shape::Cuboid { min, max } => {
                point.x >= min.x
                    && point.x <= max.x
                    && point.y >= min.y
                    && point.y <= max.y
                    && point.z >= min.z
                    && point.z <= max.z
            }
            Shape::Polygon { points, min_y, max_y } => {
                point.y >= *min_y
                    && point.y <= *max_y
                    && polygon_contains(points, BlockVector2::new(point.x, point.z))
            }
        }
    }

    /// Number of blocks covered. The global shape reports zero.
    pub fn volume(&self) -> u64 {
        match self {
            Shape::Global => 0,
            Shape::Cuboid { min, max } => {
                let dx = (max.x as i64 - min.x as i64 + 1) as u64;
                let dy = (max.y as i64 - min.y as i64 + 1) as u64;
                let dz = (max.z as i64 - min.z as i64 + 1) as u64;
                dx.saturating_mul(dy).saturating_mul(dz)
            }
            Shape::Polygon { points, min_y, max_y } => {
                if points.len() < 3 {
                    return 0;
                }
                let mut twice_area: i128 = 0;
                for (i, p) in points.iter().enumerate() {
                    let q = points[(i + 1) % points.len()];
                    twice_area = twice_area.saturating_add(
                        p.x as i128 * q.z as i128 - q.x as i128 * p.z as i128,
                    );
                }
                let area = u64::try_from(twice_area.unsigned_abs() / 2).unwrap_or(u64::MAX);
                area.saturating_mul((*max_y as i64 - *min_y as i64 + 1) as u64)
            }
        }
    }

    /// Check if two shapes share at least one block.
    ///
    /// # Examples
    ///
    /// ```
    /// use guard_regions::{BlockVector, Shape};
    ///
    /// let a = Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(10, 10, 10));
    /// let b = Shape::cuboid(BlockVector::new(10, 10, 10), BlockVector::new(20, 20, 20));
    /// let c = Shape::cuboid(BlockVector::new(11, 0, 0), BlockVector::new(20, 10, 10));
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// assert!(Shape::Global.intersects(&c));
    /// ```
    pub fn intersects(&self, other: &Shape) -> bool {
        let (Some((a_min, a_max)), Some((b_min, b_max))) = (self.bounding_box(), other.bounding_box())
        else {
            // Global overlaps everything
            return true;
        };

        let boxes_overlap = a_min.x <= b_max.x
            && a_max.x >= b_min.x
            && a_min.y <= b_max.y
            && a_max.y >= b_min.y
            && a_min.z <= b_max.z
            && a_max.z >= b_min.z;
        if !boxes_overlap {
            return false;
        }

        if matches!(self, Shape::Cuboid { .. }) && matches!(other, Shape::Cuboid { .. }) {
            return true;
        }

        let ours = self.outline();
        let theirs = other.outline();

        ours.iter().any(|p| polygon_contains(&theirs, *p))
            || theirs.iter().any(|p| polygon_contains(&ours, *p))
            || edges_intersect(&ours, &theirs)
    }

    /// The 2D outline of a bounded shape.
    fn outline(&self) -> Vec<BlockVector2> {
        match self {
            Shape::Global => Vec::new(),
            Shape::Cuboid { min, max } => vec![
                BlockVector2::new(min.x, min.z),
                BlockVector2::new(max.x, min.z),
                BlockVector2::new(max.x, max.z),
                BlockVector2::new(min.x, max.z),
            ],
            Shape::Polygon { points, .. } => points.clone(),
        }
    }
}

/// Even-odd containment test where points on an edge or vertex are inside.
fn polygon_contains(points: &[BlockVector2], target: BlockVector2) -> bool {
    if points.len() < 3 {
        return false;
    }

    let (tx, tz) = (target.x as i64, target.z as i64);
    let mut inside = false;
    let last = points[points.len() - 1];
    let (mut x_old, mut z_old) = (last.x as i64, last.z as i64);

    for p in points {
        let (x_new, z_new) = (p.x as i64, p.z as i64);
        if x_new == tx && z_new == tz {
            return true;
        }

        let (x1, z1, x2, z2) = if x_new > x_old {
            (x_old, z_old, x_new, z_new)
        } else {
            (x_new, z_new, x_old, z_old)
        };

        if x1 <= tx && tx <= x2 {
            let cross = (tz - z1) * (x2 - x1) - (z2 - z1) * (tx - x1);
            if cross == 0 {
                if (z1 <= tz) == (tz <= z2) {
                    return true;
                }
            } else if cross < 0 && x1 != tx {
                inside = !inside;
            }
        }

        x_old = x_new;
        z_old = z_new;
    }

    inside
}

fn edges_intersect(a: &[BlockVector2], b: &[BlockVector2]) -> bool {
    let edges = |pts: &[BlockVector2]| -> Vec<(BlockVector2, BlockVector2)> {
        (0..pts.len()).map(|i| (pts[i], pts[(i + 1) % pts.len()])).collect()
    };
    let b_edges = edges(b);
    edges(a)
        .iter()
        .any(|ea| b_edges.iter().any(|eb| segments_intersect(*ea, *eb)))
}

fn orientation(p: BlockVector2, q: BlockVector2, r: BlockVector2) -> i64 {
    let v = (q.z as i64 - p.z as i64) * (r.x as i64 - q.x as i64)
        - (q.x as i64 - p.x as i64) * (r.z as i64 - q.z as i64);
    v.signum()
}

fn on_segment(p: BlockVector2, q: BlockVector2, r: BlockVector2) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.z <= p.z.max(r.z) && q.z >= p.z.min(r.z)
}

fn segments_intersect(
    (p1, q1): (BlockVector2, BlockVector2),
    (p2, q2): (BlockVector2, BlockVector2),
) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    (o1 != o2 && o3 != o4)
        || (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Shape {
        Shape::polygon(
            vec![
                BlockVector2::new(0, 0),
                BlockVector2::new(10, 0),
                BlockVector2::new(0, 10),
            ],
            64,
            0,
        )
    }

    #[test]
    fn test_cuboid_normalises_corners() {
        let shape = Shape::cuboid(BlockVector::new(5, 10, -5), BlockVector::new(-5, 0, 5));
        assert_eq!(
            shape.bounding_box(),
            Some((BlockVector::new(-5, 0, -5), BlockVector::new(5, 10, 5)))
        );
    }

    #[test]
    fn test_polygon_contains() {
        let shape = triangle();
        assert!(shape.contains(BlockVector::new(1, 10, 1)));
        // Vertex and edge
        assert!(shape.contains(BlockVector::new(0, 10, 0)));
        assert!(shape.contains(BlockVector::new(5, 10, 0)));
        assert!(shape.contains(BlockVector::new(5, 10, 5)));
        // Outside the hypotenuse
        assert!(!shape.contains(BlockVector::new(8, 10, 8)));
        // Outside vertically
        assert!(!shape.contains(BlockVector::new(1, 65, 1)));
    }

    #[test]
    fn test_polygon_volume() {
        // Area 50, height 65
        assert_eq!(triangle().volume(), 50 * 65);
    }

    #[test]
    fn test_volume_of_world_sized_shapes_saturates() {
        let cuboid = Shape::cuboid(
            BlockVector::new(i32::MIN, i32::MIN, i32::MIN),
            BlockVector::new(i32::MAX, i32::MAX, i32::MAX),
        );
        assert_eq!(cuboid.volume(), u64::MAX);

        let column = Shape::cuboid(
            BlockVector::new(i32::MIN, 0, 0),
            BlockVector::new(i32::MAX, 0, 0),
        );
        assert_eq!(column.volume(), 1 << 32);

        let square = Shape::polygon(
            vec![
                BlockVector2::new(i32::MIN, i32::MIN),
                BlockVector2::new(i32::MAX, i32::MIN),
                BlockVector2::new(i32::MAX, i32::MAX),
                BlockVector2::new(i32::MIN, i32::MAX),
            ],
            i32::MIN,
            i32::MAX,
        );
        assert_eq!(square.volume(), u64::MAX);
    }

    #[test]
    fn test_global_contains_everything() {
        assert!(Shape::Global.contains(BlockVector::new(i32::MAX, i32::MIN, 0)));
        assert_eq!(Shape::Global.volume(), 0);
        assert!(Shape::Global.bounding_box().is_none());
    }

    #[test]
    fn test_polygon_cuboid_intersection() {
        let tri = triangle();
        let touching = Shape::cuboid(BlockVector::new(4, 0, 4), BlockVector::new(6, 10, 6));
        let near_miss = Shape::cuboid(BlockVector::new(8, 0, 8), BlockVector::new(10, 10, 10));
        assert!(tri.intersects(&touching));
        assert!(!tri.intersects(&near_miss));
    }

    #[test]
    fn test_crossing_without_contained_vertices() {
        // A plus-sign arrangement: neither contains a vertex of the other
        let wide = Shape::polygon(
            vec![
                BlockVector2::new(0, 4),
                BlockVector2::new(10, 4),
                BlockVector2::new(10, 6),
                BlockVector2::new(0, 6),
            ],
            0,
            10,
        );
        let tall = Shape::cuboid(BlockVector::new(4, 0, 0), BlockVector::new(6, 10, 10));
        assert!(wide.intersects(&tall));
    }
}
