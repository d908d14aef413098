#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! The tick orchestrator: advances the whole world by one turn.
//!
//! Characters act sequentially in row-major order over the positions they
//! occupied when the tick began. Each character observes the roster as
//! already modified by the characters before it, so no two characters ever
//! contend for the same cell within a tick.

use std::collections::HashSet;

use shamble_core::{Action, Area, BoundingBox, Character, CharacterId, Point, Tracer, Vector};
use shamble_system_decision::{decide, DecisionError};
use shamble_world::{Barriers, Roster, RosterError};
use thiserror::Error;

/// Failures while advancing the world by one tick.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TickError {
    /// A chosen action violated a roster invariant when applied.
    #[error(transparent)]
    Roster(#[from] RosterError),
    /// A character could not choose an action at all.
    #[error(transparent)]
    Decision(#[from] DecisionError),
    /// An attack targeted a vacant cell.
    #[error("attack on vacant position {0}")]
    InvalidAttack(Point),
}

/// Advances the roster by one tick, giving every character one action.
///
/// The returned roster shares unchanged partition subtrees with the input
/// one. A `"tick"` span brackets the whole turn and a `"character_action"`
/// span brackets each character's decision and its application, tagged with
/// the actor's life state.
pub fn advance(
    roster: &Roster,
    barriers: &Barriers,
    tracer: &mut dyn Tracer,
) -> Result<Roster, TickError> {
    tracer.open_span("tick", &[]);
    let result = advance_characters(roster, barriers, tracer);
    tracer.close_span();
    result
}

fn advance_characters(
    roster: &Roster,
    barriers: &Barriers,
    tracer: &mut dyn Tracer,
) -> Result<Roster, TickError> {
    let mut starting_points: Vec<Point> =
        roster.positions().map(|(point, _)| point).collect();
    starting_points.sort();

    let mut current = roster.clone();
    let mut acted: HashSet<CharacterId> = HashSet::new();

    for point in starting_points {
        // The occupant may have moved away, been felled, or already acted.
        let Some(character) = current.character_at(point).copied() else {
            continue;
        };
        if !acted.insert(character.id()) {
            continue;
        }

        tracer.open_span("character_action", &[("life_state", character.kind().name())]);
        let result = act(&current, barriers, point, &character);
        tracer.close_span();
        current = result?;
    }

    Ok(current)
}

fn act(
    roster: &Roster,
    barriers: &Barriers,
    position: Point,
    character: &Character,
) -> Result<Roster, TickError> {
    let limits = roster.area().from_origin(position);
    let obstacles = barrier_obstacles(barriers, position);
    let action = decide(character, roster.viewpoint(position), limits, &obstacles)?;

    match action {
        Action::ChangeState { state } => {
            Ok(roster.change_character(position, |actor| actor.with_state(state))?)
        }
        Action::Attack { target } => {
            let victim_position = position + target;
            if roster.character_at(victim_position).is_none() {
                return Err(TickError::InvalidAttack(victim_position));
            }
            Ok(roster.change_character(victim_position, |victim| victim.attacked())?)
        }
        Action::Move { vector } => {
            if vector.is_zero() {
                Ok(roster.clone())
            } else {
                Ok(roster.move_character(position, position + vector)?)
            }
        }
    }
}

/// Barrier cells near `position`, as displacements from it.
///
/// Covers the widest movement range any state has, so the decision engine
/// sees every barrier it could possibly path into.
fn barrier_obstacles(barriers: &Barriers, position: Point) -> HashSet<Vector> {
    let reach = BoundingBox::range(2);
    let nearby = Area::new(position + reach.lower(), position + reach.upper());
    barriers
        .occupied_points_in(&nearby)
        .into_iter()
        .map(|point| point - position)
        .collect()
}
