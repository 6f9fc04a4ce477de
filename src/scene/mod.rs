pub mod level_editor;

pub use level_editor::{LevelEditorScene, ScenePhase};

use crate::render::{GraphicsDevice, MeshError, RenderContext, ShaderLoadError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderLoadError),
    #[error("mesh upload failed: {0}")]
    Mesh(#[from] MeshError),
    #[error("scene is already initialized")]
    AlreadyInitialized,
}

/// A screen's worth of content driven by the frame loop.
///
/// `init` runs once before the first frame, `update` once per frame with the
/// elapsed time in seconds, and `teardown` gives every GPU object back.
pub trait Scene<D: GraphicsDevice> {
    fn init(&mut self, ctx: &mut RenderContext<D>) -> Result<(), SceneError>;

    fn update(&mut self, ctx: &mut RenderContext<D>, dt: f32);

    fn teardown(&mut self, ctx: &mut RenderContext<D>);
}
