//! Character-relative read-only projection over a roster.

use std::collections::HashSet;

use shamble_core::{Area, BoundingBox, Character, LifeStateKind, Point, Vector, Viewpoint};

use crate::Roster;

/// Read-only view of a [`Roster`] from one character's position.
///
/// All queries are expressed in displacements from the origin, so decision
/// logic built on top of this never sees absolute coordinates. Shifting the
/// origin with [`Viewpoint::from_offset`] is O(1) and shares the underlying
/// roster.
#[derive(Clone, Copy, Debug)]
pub struct RosterViewpoint<'a> {
    roster: &'a Roster,
    origin: Point,
}

impl<'a> RosterViewpoint<'a> {
    /// Creates a viewpoint over the given roster anchored at `origin`.
    #[must_use]
    pub const fn new(roster: &'a Roster, origin: Point) -> Self {
        Self { roster, origin }
    }

    /// Position the viewpoint is anchored at.
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    /// Returns the character at the given displacement from the origin.
    #[must_use]
    pub fn character_at(&self, offset: Vector) -> Option<&'a Character> {
        self.roster.character_at(self.origin + offset)
    }
}

impl Viewpoint for RosterViewpoint<'_> {
    fn occupied_points_in(&self, bounds: BoundingBox) -> HashSet<Vector> {
        let absolute = Area::new(self.origin + bounds.lower(), self.origin + bounds.upper());
        self.roster
            .characters_in(&absolute)
            .into_iter()
            .map(|(point, _)| point - self.origin)
            .collect()
    }

    fn nearest(&self, kind: LifeStateKind) -> Option<Vector> {
        self.roster
            .nearest_to(self.origin, kind)
            .map(|(point, _)| point - self.origin)
    }

    fn from_offset(&self, offset: Vector) -> Self {
        Self {
            roster: self.roster,
            origin: self.origin + offset,
        }
    }
}
