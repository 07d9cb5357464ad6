//! Gridcam binary: wires the V4L2 source into the acquisition scheduler.

use flexi_logger::{colored_opt_format, Cleanup, Criterion, Naming};
use gridcam::source::{CaptureError, Result};
use gridcam::stages::GammaStage;
use gridcam::{AcquisitionScheduler, CaptureConfig, FrameStore, V4l2Source};
use log::info;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let _logger = flexi_logger::Logger::with_str("info")
        .format(colored_opt_format)
        .log_to_file()
        .directory("./logs")
        .rotate(
            Criterion::Size(500_000),
            Naming::Numbers,
            Cleanup::KeepLogFiles(2),
        )
        .start()
        .map_err(|err| CaptureError::Config(format!("failed to start logger: {err}")))?;
    log_panics::init();
    info!("Starting up...");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_owned());
    let config = CaptureConfig::from_yaml_file(Path::new(&config_path))?;

    let root = dirs::home_dir()
        .ok_or_else(|| CaptureError::Config("could not resolve home directory".to_owned()))?;
    config.prepare_output_dirs(&root)?;

    let store = FrameStore::new(root);
    let mut scheduler = AcquisitionScheduler::new(config.clone(), V4l2Source::new(), store);
    if let Some(gamma) = config.gamma {
        scheduler = scheduler.with_stage(Box::new(GammaStage::new(gamma)));
    }

    scheduler.run()
}
