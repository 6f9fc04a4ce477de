use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub shader_path: PathBuf,
    pub clear_color: [f32; 4],
    /// Use the embedded default shader when `shader_path` fails to load
    pub fallback_to_builtin_shader: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shader_path: PathBuf::from("assets/shaders/default.glsl"),
            clear_color: [1.0, 1.0, 1.0, 1.0],
            fallback_to_builtin_shader: true,
        }
    }
}
