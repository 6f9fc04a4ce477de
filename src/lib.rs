pub mod config;
pub mod render;
pub mod scene;
pub mod window;

// Re-export commonly used types
pub use config::core::EngineConfig;
pub use render::context::RenderContext;
pub use render::shaders::{Shader, ShaderErrorKind, ShaderLoadError};
pub use render::shader_source::ShaderSource;
pub use scene::{LevelEditorScene, Scene, SceneError};
pub use window::Window;
