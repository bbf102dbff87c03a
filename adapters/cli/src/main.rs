#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Join Circuit experience.

mod session;

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use join_circuit_levels::Catalog;
use join_circuit_rendering::{palette, Presentation, RenderingBackend};
use join_circuit_rendering_macroquad::MacroquadBackend;

use crate::session::Session;

/// Command-line arguments accepted by the game binary.
#[derive(Debug, Parser)]
#[command(
    name = "join-circuit",
    about = "A puzzle game about relational joins: wire table nodes together \
             before the chaos meter overflows."
)]
struct Args {
    /// Zero-based index of the level to start from.
    #[arg(long, default_value_t = 0)]
    level: usize,

    /// Seed shared by spawn jitter and particle emission.
    #[arg(long, default_value_t = 0x4a6f_696e)]
    seed: u64,

    /// Path to a TOML catalog replacing the built-in campaign.
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Render as fast as possible instead of syncing to the display.
    #[arg(long)]
    no_vsync: bool,

    /// Print frame timing metrics once per second.
    #[arg(long)]
    show_fps: bool,
}

/// Entry point for the Join Circuit command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog = match &args.levels {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading level catalog from {}", path.display()))?,
        None => Catalog::built_in(),
    };
    ensure!(
        args.level < catalog.len(),
        "level index {} is out of range; the catalog holds {} levels",
        args.level,
        catalog.len()
    );

    log::info!(
        "starting with {} levels, level {}, seed {:#x}",
        catalog.len(),
        args.level,
        args.seed
    );

    let mut session = Session::new(catalog, args.level, args.seed);
    let presentation = Presentation::new(
        "Join Circuit",
        palette::BACKGROUND,
        session.initial_scene(),
    );
    let backend = MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps);

    backend
        .run(presentation, move |dt, input, scene| {
            session.frame(dt, input, scene);
        })
        .context("rendering backend failed")
}
