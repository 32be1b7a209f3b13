use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitereport::config::SiteReportConfig;
use sitereport::digitizer::FrameDigitizer;
use sitereport::negotiator::CaptureNegotiator;
use sitereport::platform::{self, NativeMediaDevices};
use sitereport::report::{format_report, ReportRecord};
use sitereport::types::Facing;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sitereport-cli")]
#[command(version, about = "Field report camera tools", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./sitereport.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List video input devices
    ListDevices {
        #[arg(long)]
        json: bool,
    },
    /// Capture one still to a JPEG file
    Capture {
        #[arg(short, long)]
        output: PathBuf,
        /// Bind to an explicit device id instead of negotiating by facing
        #[arg(short, long)]
        device: Option<String>,
        /// Prefer the user-facing camera
        #[arg(long)]
        front: bool,
    },
    /// Print a formatted report
    Report {
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        requester: String,
        #[arg(long, default_value = "")]
        worker: String,
        /// antes, durante or depois
        #[arg(long, default_value = "")]
        stage: String,
        #[arg(long, default_value = "")]
        area: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    sitereport::init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SiteReportConfig::load_from_file(path)?,
        None => SiteReportConfig::load_or_default(),
    };
    config.validate().map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::ListDevices { json } => list_devices(json).await,
        Command::Capture {
            output,
            device,
            front,
        } => capture(&config, output, device, front).await,
        Command::Report {
            company,
            requester,
            worker,
            stage,
            area,
            location,
            description,
            json,
        } => {
            let mut record = ReportRecord {
                company,
                requester,
                worker,
                stage,
                area,
                location,
                description,
                ..Default::default()
            };
            let now = chrono::Local::now();
            record.stamp_times(now.time());
            let text = format_report(&record, now.date_naive());
            if json {
                let value = serde_json::json!({ "record": record, "text": text });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", text);
            }
            Ok(())
        }
    }
}

async fn list_devices(json: bool) -> Result<()> {
    let devices = tokio::task::spawn_blocking(platform::list_cameras).await??;
    if json {
        println!("{}", serde_json::to_string(&devices)?);
    } else {
        for d in devices {
            println!("{}: {}", d.device_id, d.display_label());
        }
    }
    Ok(())
}

async fn capture(
    config: &SiteReportConfig,
    output: PathBuf,
    device: Option<String>,
    front: bool,
) -> Result<()> {
    let mut negotiator =
        CaptureNegotiator::new(Arc::new(NativeMediaDevices::new()), config.camera.clone());

    match device {
        Some(id) => negotiator.switch_device(&id).await?,
        None => {
            let facing = if front { Facing::User } else { Facing::Environment };
            negotiator.open(facing).await?
        }
    };

    let session = negotiator
        .session()
        .context("camera session closed unexpectedly")?;
    let digitizer =
        FrameDigitizer::from_config(&config.capture, session.profile().capture_quality());
    let artifact = digitizer.capture_frame(session.track())?;
    let (_, bytes) = artifact.to_bytes()?;

    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Captured {}x{} (quality {}) to {}",
        artifact.width,
        artifact.height,
        artifact.quality,
        output.display()
    );

    negotiator.close();
    Ok(())
}
