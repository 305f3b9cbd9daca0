use anyhow::bail;
use clap::Parser;
use fmcwcore::model::{PartialConfig, RangePreset};
use gui_bridge::model::LatestView;
use std::net::SocketAddr;
use std::path::PathBuf;
use workflow::config::ServiceConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "FMCW presence radar service driven by a simulated sensor")]
struct Args {
    /// Acquire a fixed number of frames without pacing and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Frames to acquire in offline mode
    #[arg(long, default_value_t = 50)]
    frames: usize,
    /// Run the acquisition service with watchdog and HTTP bridge until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Load a service config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Range preset (0.5m, 1.6m, 3m, 5m, 8m, 10m, 12m, 15m)
    #[arg(long)]
    range_preset: Option<RangePreset>,
    #[arg(long)]
    frame_rate: Option<f64>,
    #[arg(long)]
    chirps: Option<u32>,
    #[arg(long)]
    threshold: Option<f64>,
    /// Address for the HTTP bridge
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !args.offline && !args.serve {
        bail!("nothing to do: pass --offline or --serve");
    }

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    config.override_acquisition(PartialConfig {
        range_preset: args.range_preset,
        frame_rate_hz: args.frame_rate,
        chirps_per_frame: args.chirps,
        peak_threshold: args.threshold,
        ..Default::default()
    });
    if let Some(bind) = args.bind {
        config.bridge.bind = bind;
    }

    if args.offline {
        let mut offline = config.clone();
        offline.device.pace_frames = false;
        let summary = Runner::new(offline).execute(args.frames)?;
        let view = LatestView::from(summary.latest);

        println!(
            "Offline run -> frames {}, steps {}, history {}, faults {}",
            view.metrics.frames, summary.steps, summary.history_len, view.metrics.faults
        );
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    if args.serve {
        Runner::new(config).serve()?;
    }

    Ok(())
}
