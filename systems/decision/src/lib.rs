#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-state decision logic that chooses each character's next action.
//!
//! Given an origin-relative [`Viewpoint`], movement limits, and barrier
//! obstacles, [`decide`] produces exactly one [`Action`] per character per
//! tick. All reasoning is in displacement space; the decision never sees an
//! absolute coordinate.

use std::collections::{BTreeMap, HashSet};

use shamble_core::{Action, BoundingBox, Character, LifeState, LifeStateKind, Vector, Viewpoint};
use thiserror::Error;

/// Number of ticks a dead character lies still before rising undead.
pub const RESURRECTION_AGE: u32 = 20;

/// Failures while choosing an action.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    /// The movement search was given no moves to choose from.
    #[error("attempting to choose from no available moves")]
    NoMoves,
    /// Staying put is not a legal move, which indicates a corrupt world:
    /// the character's own cell is outside its range or obstructed.
    #[error("zero movement unavailable for character")]
    ZeroMoveUnavailable,
}

/// Movement range of a character in the given state, centered on itself.
///
/// The living sprint, the undead shamble, and the dead stay exactly where
/// they fell.
#[must_use]
pub fn movement_range(state: LifeState) -> BoundingBox {
    let radius = match state.kind() {
        LifeStateKind::Living => 2,
        LifeStateKind::Dead => 0,
        LifeStateKind::Undead => 1,
    };
    BoundingBox::range(radius)
}

/// Spontaneous state transition at the start of a tick, if any.
///
/// Dead characters age by one each tick and rise undead once they reach
/// [`RESURRECTION_AGE`]. Living and undead characters never transition on
/// their own.
#[must_use]
pub fn next_state(state: LifeState) -> Option<LifeState> {
    match state {
        LifeState::Dead { age } if age >= RESURRECTION_AGE => Some(LifeState::Undead),
        LifeState::Dead { age } => Some(LifeState::Dead { age: age + 1 }),
        LifeState::Living | LifeState::Undead => None,
    }
}

/// Cached lookups for the displacements decision logic cares about.
#[derive(Debug)]
pub struct TargetVectors<V: Viewpoint> {
    viewpoint: V,
}

impl<V: Viewpoint> TargetVectors<V> {
    /// Wraps a viewpoint.
    pub fn new(viewpoint: V) -> Self {
        Self { viewpoint }
    }

    /// Displacement of the nearest living character, if any.
    #[must_use]
    pub fn nearest_human(&self) -> Option<Vector> {
        self.viewpoint.nearest(LifeStateKind::Living)
    }

    /// Displacement of the nearest undead character, if any.
    #[must_use]
    pub fn nearest_zombie(&self) -> Option<Vector> {
        self.viewpoint.nearest(LifeStateKind::Undead)
    }

    /// Targets as seen after a hypothetical move by `offset`.
    #[must_use]
    pub fn from_offset(&self, offset: Vector) -> Self {
        Self::new(self.viewpoint.from_offset(offset))
    }
}

#[derive(Clone, Copy, Debug)]
struct MoveOption {
    vector: Vector,
    upper_bound: f64,
}

/// Moves that might end further away sort first; shorter moves break ties.
fn by_potential(a: &MoveOption, b: &MoveOption) -> std::cmp::Ordering {
    b.upper_bound
        .total_cmp(&a.upper_bound)
        .then_with(|| a.vector.distance().total_cmp(&b.vector.distance()))
}

/// Picks the move that maximizes the distance from the nearest enemy, calling
/// `nearest` as few times as possible.
///
/// Every move starts with an unlimited potential distance. Each round takes
/// the move with the most remaining potential, evaluates where the nearest
/// enemy would actually be after it, and uses that answer to cap the
/// potential of every other move: by the triangle inequality, a move ending
/// `d` away from the evaluated one can improve on its result by at most `d`.
/// Moves whose cap falls to or below the best evaluated result are dropped
/// without ever being evaluated.
///
/// When fleeing directly away from the only nearby enemy is optimal, this
/// settles after two evaluations instead of one per candidate move.
pub fn best_move_upper_bound<F>(
    moves: impl IntoIterator<Item = Vector>,
    nearest: F,
) -> Result<Vector, DecisionError>
where
    F: Fn(Vector) -> Option<Vector>,
{
    let mut options: Vec<MoveOption> = moves
        .into_iter()
        .map(|vector| MoveOption {
            vector,
            upper_bound: f64::INFINITY,
        })
        .collect();
    options.sort_by(by_potential);

    let mut best: Option<MoveOption> = None;

    while !options.is_empty() {
        let mut candidate = options.remove(0);

        let Some(enemy) = nearest(candidate.vector) else {
            // No enemy in sight after this move; nothing can beat that.
            return Ok(candidate.vector);
        };
        candidate.upper_bound = enemy.distance();

        let incumbent = match best {
            Some(incumbent) if incumbent.upper_bound >= candidate.upper_bound => incumbent,
            _ => candidate,
        };
        best = Some(incumbent);

        for option in &mut options {
            let cap = (enemy + (candidate.vector - option.vector)).distance();
            option.upper_bound = option.upper_bound.min(cap);
        }
        options.retain(|option| option.upper_bound > incumbent.upper_bound);
        options.sort_by(by_potential);
    }

    match best {
        Some(best) => Ok(best.vector),
        None => Err(DecisionError::NoMoves),
    }
}

/// Moves within `range` that the character can actually reach.
///
/// A move is available when its target cell is unobstructed and a path of
/// unobstructed cells, stepping one king-move at a time, connects it to the
/// character's own cell. The result always contains the zero move and is
/// sorted for deterministic iteration.
pub fn available_moves(
    range: BoundingBox,
    obstacles: &HashSet<Vector>,
) -> Result<Vec<Vector>, DecisionError> {
    if !range.contains(Vector::ZERO) || obstacles.contains(&Vector::ZERO) {
        return Err(DecisionError::ZeroMoveUnavailable);
    }

    let mut shells: BTreeMap<i32, Vec<Vector>> = BTreeMap::new();
    for vector in range.vectors() {
        let shell = vector.dx().abs().max(vector.dy().abs());
        shells.entry(shell).or_default().push(vector);
    }

    let adjacent = |a: Vector, b: Vector| {
        (a.dx() - b.dx()).abs() <= 1 && (a.dy() - b.dy()).abs() <= 1
    };

    // Grow reachability outward one Chebyshev shell at a time.
    let mut reachable: HashSet<Vector> = HashSet::from([Vector::ZERO]);
    for (shell, candidates) in &shells {
        if *shell == 0 {
            continue;
        }
        let newly_reachable: Vec<Vector> = candidates
            .iter()
            .copied()
            .filter(|candidate| {
                !obstacles.contains(candidate)
                    && reachable.iter().any(|inner| adjacent(*candidate, *inner))
            })
            .collect();
        reachable.extend(newly_reachable);
    }

    let mut moves: Vec<Vector> = reachable.into_iter().collect();
    moves.sort();
    Ok(moves)
}

/// The displacement an undead character in this state attacks, if any.
fn attack<V: Viewpoint>(state: LifeState, targets: &TargetVectors<V>) -> Option<Vector> {
    match state {
        LifeState::Undead => targets
            .nearest_human()
            .filter(|human| BoundingBox::range(1).contains(*human)),
        LifeState::Living | LifeState::Dead { .. } => None,
    }
}

/// The best of `moves` for a character in the given state.
fn best_move<V: Viewpoint>(
    state: LifeState,
    targets: &TargetVectors<V>,
    moves: &[Vector],
) -> Result<Vector, DecisionError> {
    match state {
        LifeState::Living => best_move_upper_bound(moves.iter().copied(), |offset| {
            targets.from_offset(offset).nearest_zombie()
        }),
        LifeState::Dead { .. } => {
            if moves.contains(&Vector::ZERO) {
                Ok(Vector::ZERO)
            } else {
                Err(DecisionError::ZeroMoveUnavailable)
            }
        }
        LifeState::Undead => match targets.nearest_human() {
            Some(human) => moves
                .iter()
                .copied()
                .min_by(|a, b| {
                    (human - *a)
                        .distance()
                        .total_cmp(&(human - *b).distance())
                        .then_with(|| a.distance().total_cmp(&b.distance()))
                })
                .ok_or(DecisionError::NoMoves),
            None => moves
                .iter()
                .copied()
                .min_by(|a, b| a.distance().total_cmp(&b.distance()))
                .ok_or(DecisionError::NoMoves),
        },
    }
}

/// Chooses the character's action for this tick.
///
/// Spontaneous state changes take precedence over attacks, and attacks over
/// movement. `limits` bounds movement by the edges of the world relative to
/// the character, and `barrier_obstacles` lists barrier cells as
/// displacements; other characters are read from the viewpoint.
pub fn decide<V: Viewpoint>(
    character: &Character,
    viewpoint: V,
    limits: BoundingBox,
    barrier_obstacles: &HashSet<Vector>,
) -> Result<Action, DecisionError> {
    if let Some(state) = next_state(character.state()) {
        return Ok(Action::ChangeState { state });
    }

    let range = movement_range(character.state()).intersect(&limits);
    let mut obstacles = viewpoint.occupied_points_in(range);
    let _ = obstacles.remove(&Vector::ZERO);
    obstacles.extend(barrier_obstacles.iter().copied());

    let targets = TargetVectors::new(viewpoint);
    if let Some(target) = attack(character.state(), &targets) {
        return Ok(Action::Attack { target });
    }

    let moves = available_moves(range, &obstacles)?;
    let vector = best_move(character.state(), &targets, &moves)?;
    Ok(Action::Move { vector })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_ranges_per_state() {
        assert_eq!(movement_range(LifeState::Living), BoundingBox::range(2));
        assert_eq!(
            movement_range(LifeState::Dead { age: 3 }),
            BoundingBox::range(0)
        );
        assert_eq!(movement_range(LifeState::Undead), BoundingBox::range(1));
    }

    #[test]
    fn dead_characters_age_each_tick() {
        assert_eq!(
            next_state(LifeState::Dead { age: 0 }),
            Some(LifeState::Dead { age: 1 })
        );
        assert_eq!(
            next_state(LifeState::Dead {
                age: RESURRECTION_AGE - 1
            }),
            Some(LifeState::Dead {
                age: RESURRECTION_AGE
            })
        );
    }

    #[test]
    fn dead_characters_rise_at_resurrection_age() {
        assert_eq!(
            next_state(LifeState::Dead {
                age: RESURRECTION_AGE
            }),
            Some(LifeState::Undead)
        );
    }

    #[test]
    fn living_and_undead_never_transition_spontaneously() {
        assert_eq!(next_state(LifeState::Living), None);
        assert_eq!(next_state(LifeState::Undead), None);
    }

    #[test]
    fn available_moves_requires_a_legal_zero_move() {
        let out_of_range = BoundingBox::new(Vector::new(1, 1), Vector::new(3, 3));
        assert_eq!(
            available_moves(out_of_range, &HashSet::new()),
            Err(DecisionError::ZeroMoveUnavailable)
        );

        let obstructed = HashSet::from([Vector::ZERO]);
        assert_eq!(
            available_moves(BoundingBox::range(1), &obstructed),
            Err(DecisionError::ZeroMoveUnavailable)
        );
    }

    #[test]
    fn available_moves_covers_an_open_range() {
        let moves = available_moves(BoundingBox::range(1), &HashSet::new()).unwrap();
        assert_eq!(moves.len(), 9);
        assert!(moves.contains(&Vector::ZERO));
        assert!(moves.contains(&Vector::new(-1, 1)));
    }

    #[test]
    fn available_moves_excludes_obstructed_cells() {
        let obstacles = HashSet::from([Vector::new(1, 0)]);
        let moves = available_moves(BoundingBox::range(1), &obstacles).unwrap();
        assert_eq!(moves.len(), 8);
        assert!(!moves.contains(&Vector::new(1, 0)));
    }

    #[test]
    fn available_moves_requires_a_clear_path() {
        // A wall across x = 1 makes the x = 2 column unreachable even though
        // those cells themselves are empty.
        let wall: HashSet<Vector> = (-2..=2).map(|dy| Vector::new(1, dy)).collect();
        let moves = available_moves(BoundingBox::range(2), &wall).unwrap();
        assert!(moves.iter().all(|m| m.dx() < 1));
        assert!(moves.contains(&Vector::new(-2, -2)));
    }

    #[test]
    fn best_move_fails_on_no_moves() {
        let result = best_move_upper_bound(Vec::new(), |_| Some(Vector::new(1, 0)));
        assert_eq!(result, Err(DecisionError::NoMoves));
    }

    #[test]
    fn best_move_maximizes_distance_from_a_lone_enemy() {
        let moves: Vec<Vector> = BoundingBox::range(2).vectors().collect();
        let enemy = Vector::new(-5, 0);
        let furthest = moves
            .iter()
            .map(|offset| (enemy - *offset).distance())
            .fold(f64::NEG_INFINITY, f64::max);

        let best =
            best_move_upper_bound(moves, |offset| Some(enemy - offset)).unwrap();
        assert_eq!((enemy - best).distance(), furthest);
    }

    #[test]
    fn best_move_stops_early_when_no_enemy_is_visible() {
        let calls = std::cell::Cell::new(0);
        let moves: Vec<Vector> = BoundingBox::range(2).vectors().collect();
        let best = best_move_upper_bound(moves, |_| {
            calls.set(calls.get() + 1);
            None
        })
        .unwrap();
        assert_eq!(calls.get(), 1);
        // With no enemy anywhere, the first candidate wins outright.
        assert!(BoundingBox::range(2).contains(best));
    }

    #[test]
    fn best_move_prefers_shorter_moves_on_ties() {
        // Both staying put and moving keep the enemy equally far, so the
        // zero move must win.
        let moves = vec![Vector::ZERO, Vector::new(0, 2)];
        let enemy = Vector::new(10, 1);
        let best = best_move_upper_bound(moves, |offset| {
            Some(Vector::new(enemy.dx() - offset.dx(), 1))
        })
        .unwrap();
        assert_eq!(best, Vector::ZERO);
    }
}
