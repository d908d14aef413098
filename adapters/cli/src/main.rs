#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the simulation in a terminal.

mod config;
mod population;
mod trace;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shamble_core::{Area, NullTracer, Point, Tracer};
use shamble_rendering::Scene;
use shamble_system_tick::advance;
use shamble_world::Barriers;

use crate::config::Config;
use crate::population::Population;
use crate::trace::FileTracer;

fn main() -> Result<()> {
    run(&Config::parse())
}

fn run(config: &Config) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&config.density),
        "--density must lie between 0 and 1"
    );
    ensure!(
        (0.0..=1.0).contains(&config.zombie_chance),
        "--zombie-chance must lie between 0 and 1"
    );
    ensure!(config.tick >= 0.0, "--tick must not be negative");

    let (width, height) = config.dimensions()?;
    let area = Area::new(Point::new(0, 0), Point::new(width, height));

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let barriers = random_barriers(&mut rng, config.barriers, width, height);
    let population = Population::new(
        ChaCha8Rng::seed_from_u64(rng.gen()),
        config.density,
        config.zombie_chance,
    );
    let roster =
        shamble_world::build(area, population, &barriers).context("could not build the world")?;

    let mut tracer: Box<dyn Tracer> = match &config.trace_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not open trace file {}", path.display()))?;
            Box::new(FileTracer::new(BufWriter::new(file)))
        }
        None => Box::new(NullTracer),
    };

    watch(roster, &barriers, config, tracer.as_mut())
}

/// Runs the simulation at the configured cadence until it reaches a
/// standstill or the tick limit.
fn watch(
    mut roster: shamble_world::Roster,
    barriers: &Barriers,
    config: &Config,
    tracer: &mut dyn Tracer,
) -> Result<()> {
    let interval = Duration::from_secs_f64(config.tick);
    let mut ticks = 0_u64;

    loop {
        if config.max_age.is_some_and(|max_age| ticks >= max_age) {
            break;
        }
        let tick_started = Instant::now();

        display(&Scene::compose(&roster, barriers))?;

        let next = advance(&roster, barriers, tracer).context("the simulation failed")?;
        ticks += 1;
        if next == roster {
            break;
        }
        roster = next;

        if let Some(remaining) = interval.checked_sub(tick_started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    Ok(())
}

fn display(scene: &Scene) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Home the cursor and clear, rather than scrolling a frame per tick.
    out.write_all(b"\x1b[H\x1b[J")?;
    for line in scene.lines() {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Places `count` random one-cell-thick walls, vertical or horizontal with
/// equal chance. Walls may touch or cross; crossings just render as joins.
fn random_barriers<R: Rng>(rng: &mut R, count: u32, width: i32, height: i32) -> Barriers {
    let mut areas = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let area = if rng.gen::<bool>() {
            let x = rng.gen_range(0..width);
            let mut ys = [rng.gen_range(0..height), rng.gen_range(0..height)];
            ys.sort_unstable();
            Area::new(Point::new(x, ys[0]), Point::new(x + 1, ys[1] + 1))
        } else {
            let y = rng.gen_range(0..height);
            let mut xs = [rng.gen_range(0..width), rng.gen_range(0..width)];
            xs.sort_unstable();
            Area::new(Point::new(xs[0], y), Point::new(xs[1] + 1, y + 1))
        };
        areas.push(area);
    }
    Barriers::new(areas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_barriers_stay_inside_the_world() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let bounds = Area::new(Point::new(0, 0), Point::new(40, 20));
        let barriers = random_barriers(&mut rng, 50, 40, 20);
        assert!(barriers.positions().all(|point| bounds.contains(point)));
    }

    #[test]
    fn random_barriers_are_one_cell_thick() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let barriers = random_barriers(&mut rng, 50, 40, 20);
        assert!(barriers
            .areas()
            .iter()
            .all(|area| area.width() == 1 || area.height() == 1));
    }

    #[test]
    fn barrier_generation_is_reproducible_from_a_seed() {
        let first = random_barriers(&mut ChaCha8Rng::seed_from_u64(3), 20, 60, 30);
        let second = random_barriers(&mut ChaCha8Rng::seed_from_u64(3), 20, 60, 30);
        assert_eq!(
            first.positions().collect::<Vec<_>>(),
            second.positions().collect::<Vec<_>>()
        );
    }
}
