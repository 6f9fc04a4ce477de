pub mod core;
pub mod rendering;
pub mod window;

pub use self::core::{ConfigError, EngineConfig, CONFIG_FILE_NAME};
pub use rendering::RenderConfig;
pub use window::WindowConfig;
