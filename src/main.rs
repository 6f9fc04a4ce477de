use anyhow::Result;
use log::info;
use simple_logger::SimpleLogger;

use jade::{EngineConfig, Window};

fn main() -> Result<()> {
    let (config, source) = EngineConfig::discover()?;
    SimpleLogger::new().with_level(config.log_level).init()?;

    match source {
        Some(path) => info!("Loaded config from '{}'", path.display()),
        None => info!("No config file found, using defaults"),
    }

    Window::new(config).run()
}
