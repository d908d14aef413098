#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative spatial state for the Shamble simulation.
//!
//! A [`Roster`] is one immutable snapshot of who stands where: a bijective
//! mapping from grid points to characters, partitioned into one persistent
//! [`SpaceTree`] per life state so "nearest living character" style queries
//! never scan the other partitions. Every mutating operation returns a new
//! roster sharing unmodified subtrees with the old one.

mod barriers;
mod tree;
mod viewpoint;

use std::collections::HashSet;

use shamble_core::{Area, Character, CharacterId, LifeStateKind, Point};
use thiserror::Error;

pub use barriers::Barriers;
pub use tree::{Entries, SpaceTree, TreeError};
pub use viewpoint::RosterViewpoint;

/// Errors raised when a roster operation would break an invariant.
///
/// These are programmer errors, not expected runtime conditions: the
/// simulation has no transient failure modes, so callers propagate them
/// instead of retrying.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    /// A position lay outside the roster's declared area.
    #[error("position {0} lies outside the world area")]
    OutOfArea(Point),
    /// A move targeted an already occupied position.
    #[error("position {0} is already occupied")]
    PositionOccupied(Point),
    /// An operation referenced a position holding no character.
    #[error("position {0} is vacant")]
    PositionVacant(Point),
    /// Two entries claimed the same position.
    #[error("position {0} appears more than once")]
    DuplicatePosition(Point),
    /// Two entries claimed the same character identity.
    #[error("character {} appears in multiple places", .0.get())]
    DuplicateCharacter(CharacterId),
}

impl From<TreeError> for RosterError {
    fn from(error: TreeError) -> Self {
        match error {
            TreeError::NotFound(point) => RosterError::PositionVacant(point),
            TreeError::OutOfArea(point) => RosterError::OutOfArea(point),
        }
    }
}

/// One immutable snapshot of every character's position.
///
/// Invariants, enforced at construction and after every operation: every
/// position lies within the declared area, no two entries share a position,
/// and no two entries share a character identity.
#[derive(Clone, Debug)]
pub struct Roster {
    area: Area,
    partitions: [SpaceTree<Character>; 3],
    ids: HashSet<CharacterId>,
}

const fn partition_index(kind: LifeStateKind) -> usize {
    match kind {
        LifeStateKind::Living => 0,
        LifeStateKind::Dead => 1,
        LifeStateKind::Undead => 2,
    }
}

impl Roster {
    /// Creates an empty roster over the given area.
    #[must_use]
    pub fn empty(area: Area) -> Self {
        Self {
            area,
            partitions: [
                SpaceTree::empty(area),
                SpaceTree::empty(area),
                SpaceTree::empty(area),
            ],
            ids: HashSet::new(),
        }
    }

    /// Builds a roster from position/character pairs.
    ///
    /// Fails when any position is outside `area`, any position repeats, or
    /// any character identity repeats.
    pub fn for_mapping(
        entries: impl IntoIterator<Item = (Point, Character)>,
        area: Area,
    ) -> Result<Self, RosterError> {
        let mut roster = Self::empty(area);
        for (point, character) in entries {
            if !area.contains(point) {
                return Err(RosterError::OutOfArea(point));
            }
            if roster.character_at(point).is_some() {
                return Err(RosterError::DuplicatePosition(point));
            }
            if !roster.ids.insert(character.id()) {
                return Err(RosterError::DuplicateCharacter(character.id()));
            }
            let index = partition_index(character.kind());
            roster.partitions[index] = roster.partitions[index].set(point, character);
        }
        Ok(roster)
    }

    /// Area the roster covers.
    #[must_use]
    pub const fn area(&self) -> Area {
        self.area
    }

    /// Number of characters in the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.iter().map(SpaceTree::len).sum()
    }

    /// Reports whether the roster holds no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(SpaceTree::is_empty)
    }

    /// Returns the character at the given position, if any.
    #[must_use]
    pub fn character_at(&self, point: Point) -> Option<&Character> {
        self.partitions
            .iter()
            .find_map(|partition| partition.get(point))
    }

    /// Reports whether a character with the given identity is present.
    #[must_use]
    pub fn contains_character(&self, id: CharacterId) -> bool {
        self.ids.contains(&id)
    }

    /// All characters positioned within the given area.
    #[must_use]
    pub fn characters_in(&self, area: &Area) -> Vec<(Point, &Character)> {
        self.partitions
            .iter()
            .flat_map(|partition| partition.items_in(area))
            .collect()
    }

    /// Nearest character of the given kind to `origin`, excluding any
    /// character standing exactly at `origin`.
    #[must_use]
    pub fn nearest_to(&self, origin: Point, kind: LifeStateKind) -> Option<(Point, &Character)> {
        self.nearest_to_matching(origin, kind, |_| true)
    }

    /// Nearest character of the given kind to `origin` for which the
    /// predicate holds.
    #[must_use]
    pub fn nearest_to_matching<F>(
        &self,
        origin: Point,
        kind: LifeStateKind,
        predicate: F,
    ) -> Option<(Point, &Character)>
    where
        F: Fn(&Character) -> bool,
    {
        self.partitions[partition_index(kind)].nearest_to(origin, predicate)
    }

    /// Iterates over every (position, character) entry, in no particular
    /// order.
    pub fn positions(&self) -> impl Iterator<Item = (Point, &Character)> {
        self.partitions.iter().flat_map(SpaceTree::items)
    }

    /// Returns a viewpoint over this roster anchored at the given origin.
    #[must_use]
    pub const fn viewpoint(&self, origin: Point) -> RosterViewpoint<'_> {
        RosterViewpoint::new(self, origin)
    }

    /// Returns a new roster with the character at `old` relocated to `new`.
    ///
    /// Moving a character onto its own position yields an equal roster.
    /// Fails when `old` is vacant, `new` is outside the area, or `new` is
    /// occupied by another character.
    pub fn move_character(&self, old: Point, new: Point) -> Result<Self, RosterError> {
        let character = *self
            .character_at(old)
            .ok_or(RosterError::PositionVacant(old))?;
        if new == old {
            return Ok(self.clone());
        }
        if !self.area.contains(new) {
            return Err(RosterError::OutOfArea(new));
        }
        if self.character_at(new).is_some() {
            return Err(RosterError::PositionOccupied(new));
        }

        let index = partition_index(character.kind());
        let mut roster = self.clone();
        roster.partitions[index] = roster.partitions[index].unset(old)?.set(new, character);
        Ok(roster)
    }

    /// Returns a new roster with the character at `point` replaced by
    /// `transform` applied to it.
    ///
    /// When the transformed character's life state kind differs, the entry
    /// moves between partitions; when its identity differs, the identity set
    /// is updated, rejecting duplicates. Fails when `point` is vacant.
    pub fn change_character<F>(&self, point: Point, transform: F) -> Result<Self, RosterError>
    where
        F: FnOnce(&Character) -> Character,
    {
        let old = *self
            .character_at(point)
            .ok_or(RosterError::PositionVacant(point))?;
        let new = transform(&old);

        let mut roster = self.clone();
        if new.id() != old.id() {
            let _ = roster.ids.remove(&old.id());
            if !roster.ids.insert(new.id()) {
                return Err(RosterError::DuplicateCharacter(new.id()));
            }
        }

        let old_index = partition_index(old.kind());
        let new_index = partition_index(new.kind());
        if old_index == new_index {
            roster.partitions[new_index] = roster.partitions[new_index].set(point, new);
        } else {
            roster.partitions[old_index] = roster.partitions[old_index].unset(point)?;
            roster.partitions[new_index] = roster.partitions[new_index].set(point, new);
        }
        Ok(roster)
    }
}

impl PartialEq for Roster {
    /// Structural equality over the position to character mapping, not over
    /// partition tree shape.
    fn eq(&self, other: &Self) -> bool {
        if self.area != other.area || self.len() != other.len() {
            return false;
        }
        let mut left: Vec<(Point, &Character)> = self.positions().collect();
        let mut right: Vec<(Point, &Character)> = other.positions().collect();
        left.sort_by_key(|(point, _)| *point);
        right.sort_by_key(|(point, _)| *point);
        left == right
    }
}

/// Builds the starting roster for a world.
///
/// Walks the area in row-major order, skips barrier-occupied cells, and
/// consumes one population sample per remaining cell, placing the characters
/// the stream yields. A population stream shorter than the grid leaves the
/// remaining cells empty.
pub fn build(
    area: Area,
    population: impl IntoIterator<Item = Option<Character>>,
    barriers: &Barriers,
) -> Result<Roster, RosterError> {
    let mut population = population.into_iter();
    let mut entries = Vec::new();
    for point in area.points() {
        if barriers.occupied(point) {
            continue;
        }
        match population.next() {
            Some(Some(character)) => entries.push((point, character)),
            Some(None) => {}
            None => break,
        }
    }
    Roster::for_mapping(entries, area)
}
