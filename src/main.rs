//! TriMorph - render morph frames from a project file
//!
//! Loads a project (two images plus anchors), runs the morphing engine at one
//! phase or over an evenly spaced phase sequence, and writes the blended
//! output as images.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use trimorph::config::Config;
use trimorph::mesh::Segment;
use trimorph::project::Project;
use trimorph::render::{draw_edges, frame_path, frame_phases};
use trimorph::{MorphEngine, Quality, Role};

/// TriMorph - triangle-mesh image morphing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project file (JSON: image paths and anchors)
    #[arg(short, long)]
    project: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "trimorph.toml")]
    config: PathBuf,

    /// Phase to render, 0 = source, 1 = target
    #[arg(long)]
    phase: Option<f64>,

    /// Warp sampling quality
    #[arg(short, long, value_enum)]
    quality: Option<Quality>,

    /// Render a sequence of N+1 frames from phase 0 to phase 1
    #[arg(short, long)]
    frames: Option<u32>,

    /// Output image (sequence frames get a numeric suffix)
    #[arg(short, long, default_value = "morph.png")]
    output: PathBuf,

    /// Draw the current triangle edges onto the output
    #[arg(long)]
    overlay: bool,

    /// Write the source, target and current edges as JSON
    #[arg(long)]
    edges: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct EdgeDump<'a> {
    phase: f64,
    source: &'a [Segment],
    target: &'a [Segment],
    current: &'a [Segment],
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("TriMorph v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_or_create(&args.config)?;
    if let Some(quality) = args.quality {
        config.engine.quality = quality;
    }
    if args.overlay {
        config.render.overlay = true;
    }
    let frames = args.frames.unwrap_or(config.render.frames);

    let project = Project::load(&args.project)?;
    let base_dir = args
        .project
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let (source, target) = project.load_images(&base_dir)?;

    let mut engine = MorphEngine::new(config.engine.clone());
    engine
        .load_project(source, target, project.anchors)
        .context("Failed to initialize morph")?;

    info!(
        "Quality: {}, anchors: {}, triangles: {}",
        engine.quality().as_str(),
        engine.anchors().len(),
        engine.mesh().len()
    );

    if frames > 0 {
        for (i, phase) in frame_phases(frames).into_iter().enumerate() {
            engine.set_phase(phase)?;
            write_output(&engine, &frame_path(&args.output, i), &config)?;
        }
    } else {
        let phase = args.phase.unwrap_or(config.engine.initial_phase);
        engine.set_phase(phase)?;
        write_output(&engine, &args.output, &config)?;
    }

    if let Some(path) = &args.edges {
        let dump = EdgeDump {
            phase: engine.phase(),
            source: engine.triangle_edges(Role::Source),
            target: engine.triangle_edges(Role::Target),
            current: engine.triangle_edges(Role::Output),
        };
        let content = serde_json::to_string_pretty(&dump).context("Failed to serialize edges")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write edges to {:?}", path))?;
        info!("Wrote edges to {:?}", path);
    }

    let stats = engine.cache_stats();
    info!(
        "Cache: {} hits, {} misses, {} transforms built",
        stats.hits, stats.misses, stats.transforms_built
    );

    Ok(())
}

/// Write the blended output, or a single warped side when only one image is set
fn write_output(engine: &MorphEngine, path: &Path, config: &Config) -> Result<()> {
    let image = engine
        .image(Role::Output)
        .or_else(|| engine.image(Role::SourceWarped))
        .or_else(|| engine.image(Role::TargetWarped))
        .context("Project has no images to morph")?;

    let mut image = image.clone();
    if config.render.overlay {
        draw_edges(
            &mut image,
            engine.triangle_edges(Role::Output),
            config.render.overlay_color,
        );
    }

    image
        .save(path)
        .with_context(|| format!("Failed to write image to {:?}", path))?;
    info!("Wrote phase {} to {:?}", engine.phase(), path);
    Ok(())
}
