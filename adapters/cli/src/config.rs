//! Command-line and environment configuration.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;

/// Watch a grid of humans and zombies until nothing changes any more.
#[derive(Debug, Parser)]
#[command(name = "shamble")]
pub(crate) struct Config {
    /// World size as WIDTHxHEIGHT, or "auto" to fit the terminal.
    #[arg(long, env = "WORLD_SIZE", default_value = "60x30")]
    pub(crate) size: WorldSize,

    /// Chance of any one cell starting out occupied.
    #[arg(long, env = "DENSITY", default_value_t = 0.05)]
    pub(crate) density: f64,

    /// Chance that an occupied cell starts as a zombie rather than a human.
    #[arg(long, env = "ZOMBIE_CHANCE", default_value_t = 0.2)]
    pub(crate) zombie_chance: f64,

    /// Number of randomly placed barrier walls.
    #[arg(long, env = "BARRIERS", default_value_t = 20)]
    pub(crate) barriers: u32,

    /// Seconds between ticks.
    #[arg(long, env = "TICK", default_value_t = 0.1)]
    pub(crate) tick: f64,

    /// Stop after this many ticks instead of running to a standstill.
    #[arg(long, env = "MAX_AGE")]
    pub(crate) max_age: Option<u64>,

    /// Write tracing spans to this file, one JSON object per line.
    #[arg(long, env = "TRACEFILE")]
    pub(crate) trace_file: Option<PathBuf>,

    /// Seed for world generation; omit for a fresh world every run.
    #[arg(long, env = "SEED")]
    pub(crate) seed: Option<u64>,
}

impl Config {
    /// World dimensions in cells, consulting the terminal for `auto`.
    pub(crate) fn dimensions(&self) -> Result<(i32, i32)> {
        match self.size {
            WorldSize::Fixed { width, height } => Ok((i32::from(width), i32::from(height))),
            WorldSize::Auto => {
                let (columns, rows) = crossterm::terminal::size()
                    .context("could not read the terminal size for --size auto")?;
                // Each cell renders two columns wide; keep one terminal row
                // free for the cursor.
                Ok((
                    i32::from(columns / 2).max(1),
                    i32::from(rows.saturating_sub(1)).max(1),
                ))
            }
        }
    }
}

/// Grid dimensions, either explicit or taken from the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WorldSize {
    /// Derive the size from the terminal window at startup.
    Auto,
    /// An explicit number of columns and rows.
    Fixed {
        /// Columns in the grid.
        width: u16,
        /// Rows in the grid.
        height: u16,
    },
}

impl FromStr for WorldSize {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text == "auto" {
            return Ok(WorldSize::Auto);
        }

        let parse = |part: &str| {
            part.parse::<u16>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or_else(|| format!("unrecognised size \"{text}\", expected WIDTHxHEIGHT or auto"))
        };
        let (width, height) = text
            .split_once('x')
            .ok_or_else(|| format!("unrecognised size \"{text}\", expected WIDTHxHEIGHT or auto"))?;
        Ok(WorldSize::Fixed {
            width: parse(width)?,
            height: parse(height)?,
        })
    }
}
