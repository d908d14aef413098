//! Static rectangular obstacles occupying grid cells.

use std::collections::HashSet;

use shamble_core::{Area, Point};

/// Immutable set of axis-aligned obstacle rectangles.
///
/// Barriers block movement but never move, so they live outside the roster
/// and are only ever queried during a tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Barriers {
    areas: Vec<Area>,
}

impl Barriers {
    /// Creates barriers covering the given rectangles.
    #[must_use]
    pub fn new(areas: Vec<Area>) -> Self {
        Self { areas }
    }

    /// Creates an empty barrier set.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The barrier rectangles.
    #[must_use]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Reports whether any barrier covers the given point.
    #[must_use]
    pub fn occupied(&self, point: Point) -> bool {
        self.areas.iter().any(|area| area.contains(point))
    }

    /// All barrier-covered points within the given area.
    #[must_use]
    pub fn occupied_points_in(&self, area: &Area) -> HashSet<Point> {
        self.areas
            .iter()
            .flat_map(|barrier| barrier.intersect(area).points())
            .collect()
    }

    /// Iterates over every barrier-covered point.
    ///
    /// Points covered by overlapping rectangles are emitted once per
    /// rectangle; callers needing a set should deduplicate.
    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.areas.iter().flat_map(|area| area.points())
    }
}
