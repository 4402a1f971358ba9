//! imgex-replay: apply a transform pipeline to an image without a display.
//!
//! Loads an image, restores a persisted pipeline and/or applies transforms
//! given on the command line, writes the resulting raster and prints the
//! pipeline dump.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use imgex_core::geometry::{ImageLocal, Panel};
use imgex_core::{ImageFile, Pipeline, Point, Rect, Session, Transformable, ViewerConfig};

#[derive(Debug, Parser)]
#[command(version, about = "Replay imgex transform pipelines on an image")]
struct Args {
    /// Image to load; bare names are looked up in the picture directory
    image: PathBuf,

    /// JSON pipeline to restore before applying other transforms
    #[arg(long)]
    pipeline: Option<PathBuf>,

    /// JSON viewer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the transformed raster here (format from the extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the final pipeline as JSON here
    #[arg(long)]
    save_pipeline: Option<PathBuf>,

    /// Record the image and its pipeline in this session file
    #[arg(long)]
    session: Option<PathBuf>,

    /// Zoom factor relative to the source image
    #[arg(long)]
    zoom: Option<f64>,

    /// Crop rect in displayed pixels, as X,Y,W,H
    #[arg(long, value_parser = parse_crop, allow_hyphen_values = true)]
    crop: Option<Rect<ImageLocal>>,

    /// Move the top-left corner to X,Y
    #[arg(long = "move", value_parser = parse_point, allow_hyphen_values = true)]
    move_to: Option<Point<Panel>>,
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[i64; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got {:?}", s));
    }
    let mut out = [0i64; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid number {part:?}: {e}"))?;
    }
    Ok(out)
}

fn parse_crop(s: &str) -> Result<Rect<ImageLocal>, String> {
    let [x, y, w, h] = parse_numbers::<4>(s)?;
    let coord = |v: i64| i32::try_from(v).map_err(|e| format!("{v}: {e}"));
    let extent = |v: i64| u32::try_from(v).map_err(|_| format!("crop size must be non-negative, got {v}"));
    Ok(Rect::new(coord(x)?, coord(y)?, extent(w)?, extent(h)?))
}

fn parse_point(s: &str) -> Result<Point<Panel>, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    let coord = |v: i64| i32::try_from(v).map_err(|e| format!("{v}: {e}"));
    Ok(Point::new(coord(x)?, coord(y)?))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

fn load_pipeline(path: &Path) -> anyhow::Result<Pipeline> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Malformed pipeline {}", path.display()))
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let file = ImageFile::resolve(&args.image, &config);
    let mut entity = Transformable::load(&file)
        .with_context(|| format!("Failed to open {}", file.path().display()))?
        .with_filter(config.filter);

    if let Some(path) = &args.pipeline {
        entity.restore(load_pipeline(path)?)?;
    }
    if let Some(factor) = args.zoom {
        entity.zoom_to(factor)?;
    }
    if let Some(rect) = args.crop {
        entity.crop(rect)?;
    }
    if let Some(p) = args.move_to {
        entity.move_to(p);
    }

    println!("{}", entity.pipeline());
    log::info!("{} ends at {}", file.name(), entity.bounds());

    if let Some(out) = &args.output {
        if entity.is_inert() {
            bail!("Nothing to write: the crop left {} empty", file.name());
        }
        entity
            .raster()
            .to_rgb_image()?
            .save(out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        log::info!("Wrote {}", out.display());
    }

    if let Some(path) = &args.save_pipeline {
        let json = serde_json::to_string_pretty(entity.pipeline())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write pipeline {}", path.display()))?;
    }

    if let Some(path) = &args.session {
        let mut session = if path.exists() {
            Session::restore(path)?
        } else {
            Session::new(std::process::id().into())
        };
        session
            .record(file.path(), &entity)
            .with_context(|| format!("Cannot record {} in {}", file.name(), path.display()))?;
        session.persist(path)?;
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run(Args::parse())
}
