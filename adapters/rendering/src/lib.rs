#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Glyph rendering of the world for terminal display.
//!
//! [`Scene::compose`] flattens a roster and its barriers into a row-major
//! grid of [`Tile`] values; [`Scene::lines`] turns each row into a display
//! string. Every tile renders two columns wide so the grid stays roughly
//! square in a terminal.

use shamble_core::{Area, LifeStateKind, Point, Vector};
use shamble_world::{Barriers, Roster};

/// Which neighboring cells of a barrier cell are also barrier cells.
///
/// Wall glyphs are chosen from these flags so connected barriers render as
/// continuous lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct WallJoins {
    /// A barrier cell lies directly above.
    pub up: bool,
    /// A barrier cell lies directly below.
    pub down: bool,
    /// A barrier cell lies directly to the left.
    pub left: bool,
    /// A barrier cell lies directly to the right.
    pub right: bool,
}

impl WallJoins {
    fn junction(self) -> char {
        match (self.up, self.down, self.left, self.right) {
            (true, true, true, true) => '┼',
            (true, true, true, false) => '┤',
            (true, true, false, true) => '├',
            (true, false, true, true) => '┴',
            (false, true, true, true) => '┬',
            (true, false, true, false) => '┘',
            (true, false, false, true) => '└',
            (false, true, true, false) => '┐',
            (false, true, false, true) => '┌',
            (true, true, false, false) | (true, false, false, false) | (false, true, false, false) => '│',
            (false, false, true, _) | (false, false, false, true) => '─',
            (false, false, false, false) => '■',
        }
    }
}

/// A single rendered grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    /// Nothing occupies the cell.
    Empty,
    /// A character of the given life state occupies the cell.
    Character(LifeStateKind),
    /// A barrier cell, with its joins to neighboring barrier cells.
    Barrier(WallJoins),
}

impl Tile {
    fn render(self, out: &mut String) {
        match self {
            Tile::Empty => out.push_str(". "),
            Tile::Character(LifeStateKind::Living) => out.push_str("\u{1F468} "),
            Tile::Character(LifeStateKind::Dead) => out.push_str("\u{1F480} "),
            Tile::Character(LifeStateKind::Undead) => out.push_str("\u{1F9DF} "),
            Tile::Barrier(joins) => {
                out.push(joins.junction());
                out.push(if joins.right { '─' } else { ' ' });
            }
        }
    }
}

/// Row-major grid of tiles ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    area: Area,
    tiles: Vec<Tile>,
}

impl Scene {
    /// Flattens the roster and barriers over the roster's area.
    ///
    /// Barriers mask characters; the world builder never places a character
    /// on a barrier cell, so the masking only matters for scenes composed
    /// from hand-built data.
    #[must_use]
    pub fn compose(roster: &Roster, barriers: &Barriers) -> Self {
        let area = roster.area();
        let tiles = area
            .points()
            .map(|point| {
                if barriers.occupied(point) {
                    Tile::Barrier(joins_at(barriers, point))
                } else if let Some(character) = roster.character_at(point) {
                    Tile::Character(character.kind())
                } else {
                    Tile::Empty
                }
            })
            .collect();
        Self { area, tiles }
    }

    /// The tile at the given point, or `None` outside the scene.
    #[must_use]
    pub fn tile_at(&self, point: Point) -> Option<Tile> {
        if !self.area.contains(point) {
            return None;
        }
        let offset = point - self.area.lower();
        let index = offset.dy() * self.area.width() + offset.dx();
        usize::try_from(index).ok().map(|index| self.tiles[index])
    }

    /// One display string per grid row, top to bottom.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let width = usize::try_from(self.area.width()).unwrap_or(0);
        self.tiles
            .chunks(width.max(1))
            .map(|row| {
                let mut line = String::new();
                for tile in row {
                    tile.render(&mut line);
                }
                line
            })
            .collect()
    }
}

fn joins_at(barriers: &Barriers, point: Point) -> WallJoins {
    let joined = |offset: Vector| barriers.occupied(point + offset);
    WallJoins {
        up: joined(Vector::new(0, -1)),
        down: joined(Vector::new(0, 1)),
        left: joined(Vector::new(-1, 0)),
        right: joined(Vector::new(1, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shamble_core::{Character, CharacterId, LifeState};
    use shamble_world::Roster;

    fn area(width: i32, height: i32) -> Area {
        Area::new(Point::new(0, 0), Point::new(width, height))
    }

    #[test]
    fn empty_world_renders_dots() {
        let roster = Roster::empty(area(3, 2));
        let scene = Scene::compose(&roster, &Barriers::none());
        assert_eq!(scene.lines(), vec![". . . ", ". . . "]);
    }

    #[test]
    fn characters_render_by_life_state() {
        let roster = Roster::for_mapping(
            [
                (
                    Point::new(0, 0),
                    Character::human(CharacterId::new(0)),
                ),
                (
                    Point::new(1, 0),
                    Character::new(CharacterId::new(1), LifeState::Dead { age: 3 }),
                ),
                (
                    Point::new(2, 0),
                    Character::zombie(CharacterId::new(2)),
                ),
            ],
            area(3, 1),
        )
        .unwrap();

        let scene = Scene::compose(&roster, &Barriers::none());
        assert_eq!(scene.lines(), vec!["\u{1F468} \u{1F480} \u{1F9DF} "]);
    }

    #[test]
    fn horizontal_walls_render_as_continuous_lines() {
        let barriers = Barriers::new(vec![Area::new(Point::new(0, 0), Point::new(3, 1))]);
        let roster = Roster::empty(area(4, 1));
        let scene = Scene::compose(&roster, &barriers);
        assert_eq!(scene.lines(), vec!["───── . "]);
    }

    #[test]
    fn vertical_walls_render_as_a_column() {
        let barriers = Barriers::new(vec![Area::new(Point::new(1, 0), Point::new(2, 3))]);
        let roster = Roster::empty(area(3, 3));
        let scene = Scene::compose(&roster, &barriers);
        assert_eq!(
            scene.lines(),
            vec![". │ . ", ". │ . ", ". │ . "]
        );
    }

    #[test]
    fn wall_corners_join() {
        let barriers = Barriers::new(vec![
            Area::new(Point::new(0, 0), Point::new(3, 1)),
            Area::new(Point::new(2, 0), Point::new(3, 3)),
        ]);
        let roster = Roster::empty(area(3, 3));
        let scene = Scene::compose(&roster, &barriers);
        assert_eq!(scene.tile_at(Point::new(2, 0)), Some(Tile::Barrier(WallJoins {
            up: false,
            down: true,
            left: true,
            right: false,
        })));
        assert_eq!(scene.lines()[0], "────┐ ");
    }

    #[test]
    fn isolated_barrier_cells_render_solid() {
        let barriers = Barriers::new(vec![Area::new(Point::new(1, 1), Point::new(2, 2))]);
        let roster = Roster::empty(area(3, 3));
        let scene = Scene::compose(&roster, &barriers);
        assert_eq!(scene.tile_at(Point::new(1, 1)), Some(Tile::Barrier(WallJoins::default())));
        assert_eq!(scene.lines()[1], ". ■ . ");
    }
}
