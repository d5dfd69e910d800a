use anyhow::Result;

use tricolor_engine::device::GpuInit;
use tricolor_engine::logging::{init_logging, LoggingConfig};
use tricolor_engine::render::SceneConfig;
use tricolor_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig::default();
    log::info!("starting \"{}\"", config.title);

    Runtime::run(config, GpuInit::default(), SceneConfig::default())
}
