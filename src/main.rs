//! # Laurel CLI
//!
//! Command-line interface for rendering certificate designs.
//!
//! ## Usage
//!
//! ```bash
//! # Render a design to PNG
//! laurel render design.json --out certificate.png
//!
//! # Render at 2x with preview data and debug borders
//! laurel render design.json --data student.json --scale 2 --debug-borders --out preview.png
//!
//! # Print the content hash of a design
//! laurel key design.json
//!
//! # Serve the HTTP preview API
//! laurel serve --listen 0.0.0.0:8080 --fonts ./fonts
//! ```
//!
//! Set `RUST_LOG=debug` for cache and timing details.

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use laurel::{
    LaurelError, RenderOptions, Renderer,
    assets::{DefaultImageSource, ImageCache},
    document::{Design, RenderData},
    font::FontRegistry,
    render::DrawRequest,
    server::{self, ServerConfig},
};

/// Laurel - certificate design renderer
#[derive(Parser, Debug)]
#[command(name = "laurel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Renderer settings shared by every subcommand.
#[derive(Args, Debug)]
struct RendererArgs {
    /// JSON file with renderer options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of .ttf/.otf files to register
    #[arg(long, value_name = "DIR")]
    fonts: Option<PathBuf>,

    /// Font family used when an element's family is not loaded
    #[arg(long)]
    default_font: Option<String>,
}

/// What to draw and how.
#[derive(Args, Debug)]
struct FrameArgs {
    /// Design JSON file
    design: PathBuf,

    /// Preview data JSON file
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Device pixels per logical unit
    #[arg(long, default_value = "1.0")]
    scale: f32,

    /// Outline every element's box
    #[arg(long)]
    debug_borders: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a design to a PNG file
    Render {
        #[command(flatten)]
        frame: FrameArgs,

        /// Output PNG file
        #[arg(long, short, value_name = "FILE", default_value = "certificate.png")]
        out: PathBuf,

        #[command(flatten)]
        renderer: RendererArgs,
    },
    /// Print the content hash of a design
    Key {
        #[command(flatten)]
        frame: FrameArgs,
    },
    /// Start the HTTP preview server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        #[command(flatten)]
        renderer: RendererArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), LaurelError> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Render { frame, out, renderer } => {
            let renderer = build_renderer(&renderer)?;
            let (design, data) = load_frame(&frame)?;
            let request = DrawRequest {
                elements: &design.elements,
                config: &design.config,
                data: &data,
                show_debug_borders: frame.debug_borders,
                render_scale: frame.scale,
            };

            let frame = runtime.block_on(renderer.render_png(&request))?;
            for failed in &frame.images.failed {
                warn!("drawn without image: {}", failed);
            }
            let raster = frame.raster;
            std::fs::write(&out, &raster.png)?;
            info!(
                "wrote {} ({}x{}, drawn in {:?})",
                out.display(),
                raster.width,
                raster.height,
                renderer.last_draw_duration().unwrap_or_default()
            );
            Ok(())
        }
        Commands::Key { frame } => {
            let (design, data) = load_frame(&frame)?;
            let request = DrawRequest {
                elements: &design.elements,
                config: &design.config,
                data: &data,
                show_debug_borders: frame.debug_borders,
                render_scale: frame.scale,
            };
            let hash = laurel::render::content_hash(&request.hash_inputs())?;
            println!("{}", hash.key);
            Ok(())
        }
        Commands::Serve { listen, renderer } => {
            let renderer = build_renderer(&renderer)?;
            runtime.block_on(server::serve(ServerConfig { listen_addr: listen }, renderer))
        }
    }
}

/// Options file first, then CLI overrides.
fn build_renderer(args: &RendererArgs) -> Result<Renderer, LaurelError> {
    let mut options = match &args.config {
        Some(path) => RenderOptions::from_file(path)?,
        None => RenderOptions::default(),
    };
    if let Some(dir) = &args.fonts {
        options.fonts_dir = Some(dir.clone());
    }
    if let Some(family) = &args.default_font {
        options.default_font_family = family.clone();
    }

    let mut fonts = FontRegistry::new(options.default_font_family.clone());
    if let Some(dir) = &options.fonts_dir {
        fonts.load_dir(dir)?;
    }
    let images = ImageCache::new(Arc::new(DefaultImageSource::new()?));
    Ok(Renderer::new(Arc::new(fonts), images, options))
}

fn load_frame(args: &FrameArgs) -> Result<(Design, RenderData), LaurelError> {
    let design = Design::from_json(&std::fs::read_to_string(&args.design)?)?;
    let data = match &args.data {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => RenderData::default(),
    };
    Ok((design, data))
}
