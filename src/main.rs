use clap::{Parser, Subcommand};
use exif_frame::config::{self, AppConfig};
use exif_frame::exif_adapter::ExifAdapter;
use exif_frame::geometry::{self, ContainerSize, DerivedLayout};
use exif_frame::metadata::{self, ImageInfo};
use exif_frame::overlay::{self, BlockDraft};
use exif_frame::render::{self, HtmlExporter};
use exif_frame::output;
use exif_frame::style::StyleOptions;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that lay out one photo.
#[derive(clap::Args, Clone)]
struct LayoutArgs {
    /// Photo to lay out (jpeg, png, tiff, heic, heif)
    file: PathBuf,

    /// Viewport as WIDTHxHEIGHT; defaults to [container] in config.toml
    #[arg(long, value_parser = parse_container)]
    container: Option<ContainerSize>,

    /// Override one style value, e.g. --set background.mode=blurred_image
    #[arg(long = "set", value_name = "PATH=VALUE", value_parser = parse_patch)]
    set: Vec<(String, toml::Value)>,

    /// Add a text block from the photo's camera metadata
    #[arg(long)]
    exif: bool,

    /// Add a freeform text block (repeatable)
    #[arg(long)]
    text: Vec<String>,
}

#[derive(Parser)]
#[command(name = "exif-frame")]
#[command(about = "Lay out photos on decorated canvases with EXIF overlays")]
#[command(long_about = "\
Lay out photos on decorated canvases with EXIF overlays

A photo is placed on a canvas with margins (percent of the photo's own
size), rounded corners, a drop shadow and a solid or image-derived
background. Text blocks show camera metadata or your own text.

Style comes from config.toml and can be adjusted per run:

  exif-frame layout photo.jpg --set margins.bottom=40 --exif
  exif-frame preview photo.jpg --set background.mode=blurred_image

Run 'exif-frame gen-config' to generate a documented config.toml.
Set RUST_LOG=debug to see layout decisions.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the camera metadata of one or more photos
    Inspect {
        files: Vec<PathBuf>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compute and print the canvas layout for a photo
    Layout {
        #[command(flatten)]
        args: LayoutArgs,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write a standalone HTML preview of the decorated photo
    Preview {
        #[command(flatten)]
        args: LayoutArgs,
        /// Output HTML file; defaults to the photo's name with .html
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { files, json } => {
            let adapter = ExifAdapter::new();
            let results: Vec<_> = files
                .par_iter()
                .map(|path| metadata::load(&adapter, path))
                .collect();

            if json {
                let entries: Vec<_> = files
                    .iter()
                    .zip(&results)
                    .map(|(path, result)| match result {
                        Ok(info) => serde_json::json!({ "file": path, "info": info }),
                        Err(e) => serde_json::json!({ "file": path, "error": e.to_string() }),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for (i, (path, result)) in files.iter().zip(&results).enumerate() {
                    output::print_inspect(i + 1, path, result);
                }
            }
        }
        Command::Layout { args, json } => {
            let app_config = config::load_config(&cli.config)?;
            let (_, style, layout) = prepare(&app_config, &args)?;
            if json {
                let doc = serde_json::json!({ "style": style, "layout": layout });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                output::print_layout(&args.file, &layout, &style);
            }
        }
        Command::Preview { args, output } => {
            let app_config = config::load_config(&cli.config)?;
            let (_, style, layout) = prepare(&app_config, &args)?;
            let image_url = file_url(&args.file.canonicalize()?)?;
            let bytes = render::export(&HtmlExporter, &layout, &style, &image_url)?;
            let output = output.unwrap_or_else(|| preview_path(&args.file));
            std::fs::write(&output, bytes)?;
            println!("{} → {}", args.file.display(), output.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the photo, apply CLI style edits and text blocks, and lay it out.
fn prepare(
    app_config: &AppConfig,
    args: &LayoutArgs,
) -> Result<(ImageInfo, StyleOptions, DerivedLayout), Box<dyn std::error::Error>> {
    let info = metadata::load(&ExifAdapter::new(), &args.file)?;
    if info.needs_confirmation() {
        eprintln!(
            "note: {} has no camera metadata; only freeform text is available",
            args.file.display()
        );
    }

    let mut style = app_config
        .style
        .patch_all(args.set.iter().map(|(path, value)| (path.as_str(), value.clone())))?;
    style.validate()?;

    let limit = app_config.limits.new_block;
    if args.exif && !info.needs_confirmation() {
        let items = info.fields().iter().map(|f| f.value.clone()).collect();
        style = overlay::add_block(&style, BlockDraft::metadata(items), limit)?.style;
    }
    for text in &args.text {
        style = overlay::add_block(&style, BlockDraft::freeform(text.clone()), limit)?.style;
    }

    let container = args.container.unwrap_or_else(|| app_config.container.size());
    let layout = geometry::compute_layout(container, info.dimensions(), &style);
    Ok((info, style, layout))
}

/// Percent-encoded `file://` URL for an absolute path.
fn file_url(path: &Path) -> Result<String, String> {
    url::Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| format!("cannot build a file URL for {}", path.display()))
}

/// `photo.jpg` previews to `photo.html` beside it.
fn preview_path(photo: &Path) -> PathBuf {
    photo.with_extension("html")
}

/// Parse `WIDTHxHEIGHT` into a container size.
fn parse_container(s: &str) -> Result<ContainerSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    let size = ContainerSize::new(width, height);
    if !size.is_measured() {
        return Err("container width and height must be positive".to_string());
    }
    Ok(size)
}

/// Parse `path=value`. The value is read as a TOML literal when it is one
/// (`40`, `true`, `"#333"`), otherwise taken as a bare string.
fn parse_patch(s: &str) -> Result<(String, toml::Value), String> {
    let (path, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=VALUE, got '{s}'"))?;
    let value = toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()));
    Ok((path.trim().to_string(), value))
}
