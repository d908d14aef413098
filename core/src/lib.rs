#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Shamble simulation.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the pure decision and tick systems, and the adapters: grid geometry,
//! character identity and life state, the [`Action`] surface produced by
//! decision logic, and the [`Viewpoint`] and [`Tracer`] contracts the tick
//! orchestrator consumes.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Absolute location of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new grid point from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the point.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate of the point.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, vector: Vector) -> Point {
        Point::new(self.x + vector.dx, self.y + vector.dy)
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, other: Point) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        // Row-major: the iteration and tie-break order used throughout.
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Signed displacement between two grid cells.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Vector {
    dx: i32,
    dy: i32,
}

impl Vector {
    /// The zero displacement.
    pub const ZERO: Vector = Vector::new(0, 0);

    /// Creates a new displacement from its components.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal component of the displacement.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Vertical component of the displacement.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Euclidean length of the displacement.
    ///
    /// This is the true (non-squared) norm. Distance comparisons would be
    /// unaffected by squaring, but the movement search reasons additively
    /// about distances via the triangle inequality, which only holds for the
    /// true norm.
    #[must_use]
    pub fn distance(&self) -> f64 {
        f64::from(self.dx).hypot(f64::from(self.dy))
    }

    /// Reports whether this is the zero displacement.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::new(self.dx + other.dx, self.dy + other.dy)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, other: Vector) -> Vector {
        Vector::new(self.dx - other.dx, self.dy - other.dy)
    }
}

/// Half-open axis-aligned rectangle of grid points, `[lower, upper)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    lower: Point,
    upper: Point,
}

impl Area {
    /// Creates a new area spanning the two corner points.
    ///
    /// The corners are normalized component-wise, so the arguments may be
    /// given in either order.
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            lower: Point::new(a.x.min(b.x), a.y.min(b.y)),
            upper: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Inclusive lower corner of the area.
    #[must_use]
    pub const fn lower(&self) -> Point {
        self.lower
    }

    /// Exclusive upper corner of the area.
    #[must_use]
    pub const fn upper(&self) -> Point {
        self.upper
    }

    /// Number of columns spanned by the area.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.upper.x - self.lower.x
    }

    /// Number of rows spanned by the area.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.upper.y - self.lower.y
    }

    /// Reports whether the area contains no points at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Reports whether the given point lies within the area.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        self.lower.x <= point.x
            && point.x < self.upper.x
            && self.lower.y <= point.y
            && point.y < self.upper.y
    }

    /// Returns the overlap between this area and another, possibly empty.
    #[must_use]
    pub fn intersect(&self, other: &Area) -> Area {
        let lower = Point::new(
            self.lower.x.max(other.lower.x),
            self.lower.y.max(other.lower.y),
        );
        let upper = Point::new(
            self.upper.x.min(other.upper.x).max(lower.x),
            self.upper.y.min(other.upper.y).max(lower.y),
        );
        Area { lower, upper }
    }

    /// Euclidean distance from the given point to the nearest cell of the
    /// area, or zero when the point lies inside it.
    ///
    /// Empty areas are infinitely far from everything, which lets spatial
    /// queries prune them unconditionally.
    #[must_use]
    pub fn distance_from(&self, point: Point) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }

        let nearest = Point::new(
            point.x.clamp(self.lower.x, self.upper.x - 1),
            point.y.clamp(self.lower.y, self.upper.y - 1),
        );
        (nearest - point).distance()
    }

    /// Translates the area into displacements relative to the given origin.
    #[must_use]
    pub fn from_origin(&self, origin: Point) -> BoundingBox {
        BoundingBox::new(self.lower - origin, self.upper - origin)
    }

    /// Iterates over every point of the area in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let (lower, upper) = (self.lower, self.upper);
        (lower.y..upper.y).flat_map(move |y| (lower.x..upper.x).map(move |x| Point::new(x, y)))
    }
}

/// Half-open axis-aligned rectangle of displacements, `[lower, upper)`.
///
/// Bounding boxes describe movement and attack ranges relative to a
/// character's own position, so all spatial reasoning in decision logic is
/// origin-independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    lower: Vector,
    upper: Vector,
}

impl BoundingBox {
    /// Creates a new bounding box spanning the two corner displacements.
    #[must_use]
    pub fn new(a: Vector, b: Vector) -> Self {
        Self {
            lower: Vector::new(a.dx.min(b.dx), a.dy.min(b.dy)),
            upper: Vector::new(a.dx.max(b.dx), a.dy.max(b.dy)),
        }
    }

    /// Creates the square box of side `2 * radius + 1` centered on zero.
    ///
    /// `range(0)` contains exactly the zero vector; negative radii are
    /// treated as zero.
    #[must_use]
    pub fn range(radius: i32) -> Self {
        let radius = radius.max(0);
        Self::new(
            Vector::new(-radius, -radius),
            Vector::new(radius + 1, radius + 1),
        )
    }

    /// Inclusive lower corner of the box.
    #[must_use]
    pub const fn lower(&self) -> Vector {
        self.lower
    }

    /// Exclusive upper corner of the box.
    #[must_use]
    pub const fn upper(&self) -> Vector {
        self.upper
    }

    /// Reports whether the given displacement lies within the box.
    #[must_use]
    pub const fn contains(&self, vector: Vector) -> bool {
        self.lower.dx <= vector.dx
            && vector.dx < self.upper.dx
            && self.lower.dy <= vector.dy
            && vector.dy < self.upper.dy
    }

    /// Returns the overlap between this box and another, possibly empty.
    #[must_use]
    pub fn intersect(&self, other: &BoundingBox) -> BoundingBox {
        let lower = Vector::new(
            self.lower.dx.max(other.lower.dx),
            self.lower.dy.max(other.lower.dy),
        );
        let upper = Vector::new(
            self.upper.dx.min(other.upper.dx).max(lower.dx),
            self.upper.dy.min(other.upper.dy).max(lower.dy),
        );
        BoundingBox { lower, upper }
    }

    /// Iterates over every displacement contained in the box.
    pub fn vectors(&self) -> impl Iterator<Item = Vector> {
        let (lower, upper) = (self.lower, self.upper);
        (lower.dy..upper.dy)
            .flat_map(move |dy| (lower.dx..upper.dx).map(move |dx| Vector::new(dx, dy)))
    }
}

/// Unique identifier assigned to a character.
///
/// Identity, not state, is the uniqueness key enforced by the roster: a
/// character keeps its identifier through state transitions, and no two
/// roster entries may share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(u32);

impl CharacterId {
    /// Creates a new character identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Life state of a character, including any state-internal data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeState {
    /// A living human.
    Living,
    /// A corpse, counting ticks since death.
    Dead {
        /// Number of ticks the character has spent dead.
        age: u32,
    },
    /// A reanimated corpse.
    Undead,
}

impl LifeState {
    /// Collapses the state to its partition key, discarding internal data.
    #[must_use]
    pub const fn kind(&self) -> LifeStateKind {
        match self {
            LifeState::Living => LifeStateKind::Living,
            LifeState::Dead { .. } => LifeStateKind::Dead,
            LifeState::Undead => LifeStateKind::Undead,
        }
    }
}

/// Discriminator used to partition the spatial index by life state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeStateKind {
    /// Living humans.
    Living,
    /// Corpses of any age.
    Dead,
    /// Reanimated corpses.
    Undead,
}

impl LifeStateKind {
    /// All partition keys, in a fixed order usable for indexing.
    pub const ALL: [LifeStateKind; 3] = [
        LifeStateKind::Living,
        LifeStateKind::Dead,
        LifeStateKind::Undead,
    ];

    /// Stable human-readable name, used as span context by the tick system.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            LifeStateKind::Living => "living",
            LifeStateKind::Dead => "dead",
            LifeStateKind::Undead => "undead",
        }
    }
}

/// Identity-bearing inhabitant of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Character {
    id: CharacterId,
    state: LifeState,
}

impl Character {
    /// Creates a character with the given identity and state.
    #[must_use]
    pub const fn new(id: CharacterId, state: LifeState) -> Self {
        Self { id, state }
    }

    /// Creates a living human with the given identity.
    #[must_use]
    pub const fn human(id: CharacterId) -> Self {
        Self::new(id, LifeState::Living)
    }

    /// Creates an undead character with the given identity.
    #[must_use]
    pub const fn zombie(id: CharacterId) -> Self {
        Self::new(id, LifeState::Undead)
    }

    /// Identity of the character.
    #[must_use]
    pub const fn id(&self) -> CharacterId {
        self.id
    }

    /// Current life state of the character.
    #[must_use]
    pub const fn state(&self) -> LifeState {
        self.state
    }

    /// Partition key of the character's current state.
    #[must_use]
    pub const fn kind(&self) -> LifeStateKind {
        self.state.kind()
    }

    /// Returns a new character value with the same identity and a new state.
    #[must_use]
    pub const fn with_state(&self, state: LifeState) -> Character {
        Character::new(self.id, state)
    }

    /// Returns the character as it stands after being attacked.
    #[must_use]
    pub const fn attacked(&self) -> Character {
        self.with_state(LifeState::Dead { age: 0 })
    }
}

/// Actions a character may take in a single tick.
///
/// Decision logic produces one `Action` per character per tick; the tick
/// orchestrator applies it to the roster. All displacements are relative to
/// the acting character's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Relocate by the given displacement. The zero vector means staying put.
    Move {
        /// Displacement of the move.
        vector: Vector,
    },
    /// Attack the character at the given displacement.
    Attack {
        /// Offset of the victim from the attacker.
        target: Vector,
    },
    /// Replace the character's state without moving or attacking.
    ChangeState {
        /// State the character transitions into.
        state: LifeState,
    },
}

/// Origin-relative read-only projection of the world's occupants.
///
/// Implementations translate between absolute positions and displacements so
/// decision logic never works with absolute coordinates.
pub trait Viewpoint: Sized {
    /// All occupied displacements within the given box, excluding nothing:
    /// the zero vector is included when the origin itself is occupied.
    fn occupied_points_in(&self, bounds: BoundingBox) -> HashSet<Vector>;

    /// Displacement of the nearest occupant of the given kind, excluding an
    /// occupant at the origin itself, or `None` when no such occupant exists.
    fn nearest(&self, kind: LifeStateKind) -> Option<Vector>;

    /// Returns a viewpoint whose origin is shifted by the given displacement.
    ///
    /// This simulates the view after a hypothetical move; it must be cheap
    /// and must not copy the underlying index.
    fn from_offset(&self, offset: Vector) -> Self;
}

/// Span-recording handle injected into the tick orchestrator.
///
/// Spans bracket units of work and may carry string key/value context. The
/// orchestrator is agnostic to where spans are recorded; [`NullTracer`]
/// discards them.
pub trait Tracer {
    /// Opens a span nested under the currently open span, if any.
    fn open_span(&mut self, name: &str, context: &[(&str, &str)]);

    /// Closes the most recently opened span.
    fn close_span(&mut self);
}

/// Tracer that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn open_span(&mut self, _name: &str, _context: &[(&str, &str)]) {}

    fn close_span(&mut self) {}
}
