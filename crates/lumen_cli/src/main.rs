mod scenes;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lumen_renderer::{Framebuffer, Integrator, RenderConfig, Renderer};

use scenes::DemoScene;

#[derive(Parser, Debug)]
#[command(name = "lumen", version, about = "Render a built-in scene with the lumen path tracer")]
struct Args {
    /// JSON render configuration. Missing fields use defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t)]
    /// Scene selector
    scene: DemoScene,

    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Worker threads, 0 for one per core
    #[arg(short, long)]
    threads: Option<usize>,

    /// Samples per pixel
    #[arg(long)]
    spp: Option<u32>,

    #[arg(short, long, value_enum)]
    integrator: Option<IntegratorArg>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum IntegratorArg {
    Whitted,
    MonteCarlo,
}

impl From<IntegratorArg> for Integrator {
    fn from(arg: IntegratorArg) -> Self {
        match arg {
            IntegratorArg::Whitted => Integrator::Whitted,
            IntegratorArg::MonteCarlo => Integrator::MonteCarlo,
        }
    }
}

impl Args {
    /// Command line flags take precedence over the config file.
    fn apply_overrides(&self, mut config: RenderConfig) -> RenderConfig {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(spp) = self.spp {
            config.samples_per_pixel = spp;
        }
        if let Some(integrator) = self.integrator {
            config.integrator = integrator.into();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

fn parse_config(json: &str) -> Result<RenderConfig> {
    serde_json::from_str(json).context("Invalid render configuration")
}

fn load_config(path: &Path) -> Result<RenderConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&json).with_context(|| format!("In {}", path.display()))
}

fn save_png(frame: &Framebuffer, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(frame.width(), frame.height(), frame.to_rgba())
        .context("Framebuffer size does not match its dimensions")?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RenderConfig::default(),
    };
    let config = args.apply_overrides(config);
    log::debug!("Render configuration: {config:?}");

    log::info!("Building scene '{}'", args.scene.name());
    let scene = args.scene.build().context("Failed to build scene")?;

    let frame = Renderer::new(config)
        .render(Arc::new(scene))
        .context("Render failed")?;

    save_png(&frame, &args.output)?;
    log::info!("Wrote {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "lumen",
            "--width",
            "64",
            "--threads",
            "2",
            "--integrator",
            "whitted",
            "--scene",
            "cornell",
        ]);
        assert_eq!(args.scene, DemoScene::Cornell);
        let base = parse_config(r#"{ "width": 800, "height": 600, "samples_per_pixel": 9 }"#).unwrap();
        let config = args.apply_overrides(base);
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 600);
        assert_eq!(config.threads, 2);
        assert_eq!(config.samples_per_pixel, 9);
        assert_eq!(config.integrator, Integrator::Whitted);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["lumen"]);
        assert_eq!(args.output, PathBuf::from("render.png"));
        assert_eq!(args.apply_overrides(RenderConfig::default()), RenderConfig::default());
    }

    #[test]
    fn test_bad_config_is_reported() {
        let err = parse_config(r#"{ "width": "wide" }"#).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid render configuration"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config(Path::new("/nonexistent/lumen.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
