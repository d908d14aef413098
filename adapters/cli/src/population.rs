//! Random starting populations.

use rand::Rng;
use shamble_core::{Character, CharacterId};

/// Endless stream of starting cells: a human, a zombie, or nothing.
///
/// Each sample rolls once; the roll decides between human, zombie, and an
/// empty cell by cumulative probability. Identifiers are handed out
/// sequentially so every generated character is unique.
#[derive(Debug)]
pub(crate) struct Population<R> {
    rng: R,
    next_id: u32,
    human_threshold: f64,
    occupied_threshold: f64,
}

impl<R: Rng> Population<R> {
    pub(crate) fn new(rng: R, density: f64, zombie_chance: f64) -> Self {
        Self {
            rng,
            next_id: 0,
            human_threshold: density * (1.0 - zombie_chance),
            occupied_threshold: density,
        }
    }

    fn fresh_id(&mut self) -> CharacterId {
        let id = CharacterId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

impl<R: Rng> Iterator for Population<R> {
    type Item = Option<Character>;

    fn next(&mut self) -> Option<Self::Item> {
        let roll: f64 = self.rng.gen();
        let character = if roll < self.human_threshold {
            Some(Character::human(self.fresh_id()))
        } else if roll < self.occupied_threshold {
            Some(Character::zombie(self.fresh_id()))
        } else {
            None
        };
        Some(character)
    }
}
