use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use snafu::ResultExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roadscan_core::consts::*;
use roadscan_core::error::{ImageWriteSnafu, IoWriteSnafu, ReadInputSnafu, ResponseJsonSnafu};
use roadscan_core::report::{PageRasterWriter, PdfDocumentWriter, report_file_name};
use roadscan_core::{
    BoundaryPolicy, DetectionResult, GeminiClient, Geocoder, InspectionReport,
    LocationData, OverlayRenderer, PageSpec, ReportBuilder, ReportOptionsBuilder, SourceImage,
    VisionService, paginate,
};

#[derive(Parser)]
#[command(name = "roadscan")]
#[command(about = "Road surface hazard overlay and inspection report tool")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draw detection boxes and labels over a photo
    Overlay {
        #[arg(help = "Input image path")]
        image: PathBuf,

        #[arg(short, long, help = "Detection result JSON")]
        detections: PathBuf,

        #[arg(short, long, default_value_t = 800, help = "Display width in pixels")]
        width: u32,

        #[arg(short, long, default_value = "overlay.png", help = "Output image path")]
        output: PathBuf,
    },
    /// Print the page placements for an image of the given size
    Paginate {
        #[arg(long, help = "Source width in pixels")]
        width: u32,

        #[arg(long, help = "Source height in pixels")]
        height: u32,

        #[arg(long, default_value_t = A4_WIDTH_MM)]
        page_width: f64,

        #[arg(long, default_value_t = A4_HEIGHT_MM)]
        page_height: f64,

        #[arg(long, value_enum, default_value_t = BoundaryPolicy::ExactFit)]
        boundary: BoundaryPolicy,
    },
    /// Send a photo to the vision model and print the detections
    Analyze {
        #[arg(help = "Input image path")]
        image: PathBuf,
    },
    /// Resolve a place description to coordinates
    Locate {
        #[arg(help = "Address, city or landmark")]
        query: String,
    },
    /// Build the inspection report for a photo
    Report {
        #[arg(help = "Input image path")]
        image: PathBuf,

        #[arg(
            short,
            long,
            help = "Detection result JSON, the vision model is asked when omitted"
        )]
        detections: Option<PathBuf>,

        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,

        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,

        #[arg(
            long,
            conflicts_with = "latitude",
            help = "Place description resolved through the geocoder"
        )]
        address: Option<String>,

        #[arg(long, value_enum, default_value_t = BoundaryPolicy::ExactFit)]
        boundary: BoundaryPolicy,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pdf)]
        format: OutputFormat,

        #[arg(
            short,
            long,
            help = "Output file (pdf) or directory (png), defaults to the current directory"
        )]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pdf,
    Png,
}

fn load_detections(path: &Path) -> Result<DetectionResult, Box<dyn Error>> {
    let text = std::fs::read_to_string(path).context(ReadInputSnafu {
        path: path.to_string_lossy(),
    })?;
    let result = serde_json::from_str(&text).context(ResponseJsonSnafu {
        service: path.to_string_lossy(),
    })?;
    Ok(result)
}

async fn analyze(source: &SourceImage) -> Result<DetectionResult, Box<dyn Error>> {
    let client = GeminiClient::from_env()?;
    info!("Analyzing image with {}", client.model());
    let result = client
        .analyze(source)
        .await
        .map_err(|err| err.user_message())?;
    Ok(result)
}

async fn locate(query: &str) -> Result<LocationData, Box<dyn Error>> {
    let client = GeminiClient::from_env()?;
    let location = client
        .resolve(query)
        .await
        .map_err(|err| err.user_message())?;
    Ok(location)
}

fn write_pages(pages: &[image::RgbImage], dir: &Path) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(dir).context(IoWriteSnafu {
        path: dir.to_string_lossy(),
    })?;
    for (index, page) in pages.iter().enumerate() {
        let path = dir.join(format!("page-{:03}.png", index + 1));
        page.save(&path).context(ImageWriteSnafu {
            path: path.to_string_lossy(),
        })?;
        info!("Saved page {} to {}", index + 1, path.display());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn report(
    image: &Path,
    detections: Option<&Path>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<&str>,
    boundary: BoundaryPolicy,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let source = SourceImage::open(image)?;
    let photo = source.decode_async().await?;

    let result = match detections {
        Some(path) => load_detections(path)?,
        None => analyze(&source).await?,
    };

    let location = match (latitude, longitude, address) {
        (Some(lat), Some(lon), _) => Some(LocationData::from_device(lat, lon)),
        (_, _, Some(query)) => match locate(query).await {
            Ok(location) => Some(location),
            Err(err) => {
                warn!("{err}");
                None
            }
        },
        _ => None,
    };

    let options = ReportOptionsBuilder::default().boundary(boundary).build()?;
    let builder = ReportBuilder::new(options)?;
    let report = InspectionReport::new(result, location);
    info!("Building report {}", report.reference);

    match format {
        OutputFormat::Pdf => {
            let path = output.unwrap_or_else(|| {
                PathBuf::from(report_file_name(chrono::Utc::now()))
            });
            let writer = PdfDocumentWriter::new(builder.options().jpeg_quality);
            let bytes = builder.build(&photo, &report, &writer)?;
            std::fs::write(&path, bytes).context(IoWriteSnafu {
                path: path.to_string_lossy(),
            })?;
            info!("Saved report to {}", path.display());
        }
        OutputFormat::Png => {
            let dir = output.unwrap_or_else(|| PathBuf::from("."));
            let pages = builder.build(&photo, &report, &PageRasterWriter::new())?;
            write_pages(&pages, &dir)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Overlay {
            image,
            detections,
            width,
            output,
        } => {
            let source = SourceImage::open(&image)?;
            let photo = source.decode_async().await?;
            let result = load_detections(&detections)?;

            let renderer = OverlayRenderer::new()?;
            let annotated = renderer.render(&photo, width, &result.potholes)?;
            annotated.save(&output).context(ImageWriteSnafu {
                path: output.to_string_lossy(),
            })?;
            info!(
                "Saved {}x{} overlay with {} detections to {}",
                annotated.width(),
                annotated.height(),
                result.potholes.len(),
                output.display()
            );
        }
        Command::Paginate {
            width,
            height,
            page_width,
            page_height,
            boundary,
        } => {
            let spec = PageSpec::new(page_width, page_height)?;
            let placements = paginate(width, height, spec, boundary)?.collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&placements)?);
        }
        Command::Analyze { image } => {
            let source = SourceImage::open(&image)?;
            let result = analyze(&source).await?;
            let counts = result.counts();
            info!(
                "Found {} hazards: {} high, {} medium, {} low",
                counts.total(),
                counts.high,
                counts.medium,
                counts.low
            );
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Locate { query } => {
            let location = locate(&query).await?;
            println!("{}", serde_json::to_string_pretty(&location)?);
        }
        Command::Report {
            image,
            detections,
            latitude,
            longitude,
            address,
            boundary,
            format,
            output,
        } => {
            report(
                &image,
                detections.as_deref(),
                latitude,
                longitude,
                address.as_deref(),
                boundary,
                format,
                output,
            )
            .await?;
        }
    }

    Ok(())
}
