use super::{Scene, SceneError};
use crate::render::{GpuMesh, GraphicsDevice, Mesh, RenderContext, Shader, ShaderSource};
use std::mem;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    Uninitialized,
    Ready,
    Released,
}

enum ShaderOrigin {
    File(PathBuf),
    Source(ShaderSource),
}

enum State {
    Uninitialized,
    Ready { shader: Shader, mesh: GpuMesh },
    Released,
}

/// Draws one colored quad with a single shader.
pub struct LevelEditorScene {
    origin: ShaderOrigin,
    mesh: Mesh,
    state: State,
}

impl LevelEditorScene {
    /// The shader file is read when the scene is initialized, not here.
    pub fn new(shader_path: impl AsRef<Path>) -> Self {
        Self {
            origin: ShaderOrigin::File(shader_path.as_ref().to_path_buf()),
            mesh: Mesh::quad(),
            state: State::Uninitialized,
        }
    }

    pub fn with_source(source: ShaderSource) -> Self {
        Self {
            origin: ShaderOrigin::Source(source),
            mesh: Mesh::quad(),
            state: State::Uninitialized,
        }
    }

    pub fn phase(&self) -> ScenePhase {
        match self.state {
            State::Uninitialized => ScenePhase::Uninitialized,
            State::Ready { .. } => ScenePhase::Ready,
            State::Released => ScenePhase::Released,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn build_shader(&self) -> Result<Shader, SceneError> {
        Ok(match &self.origin {
            ShaderOrigin::File(path) => Shader::load(path)?,
            ShaderOrigin::Source(source) => Shader::from_source(source.clone()),
        })
    }
}

impl<D: GraphicsDevice> Scene<D> for LevelEditorScene {
    fn init(&mut self, ctx: &mut RenderContext<D>) -> Result<(), SceneError> {
        if !matches!(self.state, State::Uninitialized) {
            return Err(SceneError::AlreadyInitialized);
        }

        let mut shader = self.build_shader()?;
        shader.compile_and_link(ctx)?;

        let mesh = match GpuMesh::upload(ctx, &self.mesh) {
            Ok(mesh) => mesh,
            Err(e) => {
                shader.release(ctx);
                return Err(e.into());
            }
        };

        log::info!("Level editor scene ready ({})", shader.path().display());
        self.state = State::Ready { shader, mesh };
        Ok(())
    }

    fn update(&mut self, ctx: &mut RenderContext<D>, _dt: f32) {
        let State::Ready { shader, mesh } = &self.state else {
            log::trace!("Skipping update of a scene that is not ready");
            return;
        };

        shader.use_program(ctx);
        mesh.draw(ctx);
        shader.detach(ctx);
    }

    fn teardown(&mut self, ctx: &mut RenderContext<D>) {
        if let State::Ready { mut shader, mesh } = mem::replace(&mut self.state, State::Released)
        {
            mesh.release(ctx);
            shader.release(ctx);
            log::info!("Level editor scene released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mock::{DeviceCall, MockDevice};
    use crate::render::{IndexType, Topology};
    use std::io::Write;

    fn ready_scene() -> (LevelEditorScene, RenderContext<MockDevice>) {
        let mut ctx = RenderContext::new(MockDevice::new());
        let mut scene = LevelEditorScene::with_source(ShaderSource::builtin().unwrap());
        scene.init(&mut ctx).unwrap();
        (scene, ctx)
    }

    #[test]
    fn test_init_reaches_ready() {
        let (mut scene, mut ctx) = ready_scene();
        assert_eq!(scene.phase(), ScenePhase::Ready);
        assert_eq!(ctx.device().live_programs(), 1);
        assert_eq!(ctx.device().live_vertex_arrays(), 1);
        assert_eq!(ctx.device().live_buffers(), 2);
        scene.teardown(&mut ctx);
    }

    #[test]
    fn test_update_draws_quad_once() {
        let (mut scene, mut ctx) = ready_scene();
        ctx.device_mut().clear_calls();

        scene.update(&mut ctx, 1.0 / 60.0);

        let State::Ready { shader, mesh } = &scene.state else {
            panic!("scene not ready");
        };
        let program = shader.program().unwrap();
        assert_eq!(
            ctx.device().calls,
            vec![
                DeviceCall::UseProgram(Some(program)),
                DeviceCall::BindVertexArray(Some(mesh.vertex_array())),
                DeviceCall::DrawElements {
                    topology: Topology::Triangles,
                    count: 6,
                    index_type: IndexType::U32,
                },
                DeviceCall::BindVertexArray(None),
                DeviceCall::UseProgram(None),
            ]
        );
        assert_eq!(ctx.bound_program(), None);
        assert_eq!(ctx.bound_vertex_array(), None);

        scene.teardown(&mut ctx);
    }

    #[test]
    fn test_each_update_draws_again() {
        let (mut scene, mut ctx) = ready_scene();
        ctx.device_mut().clear_calls();
        for _ in 0..3 {
            scene.update(&mut ctx, 0.016);
        }
        assert_eq!(ctx.device().draw_calls().len(), 3);
        scene.teardown(&mut ctx);
    }

    #[test]
    fn test_update_before_init_is_noop() {
        let mut ctx = RenderContext::new(MockDevice::new());
        let mut scene = LevelEditorScene::new("assets/shaders/default.glsl");
        scene.update(&mut ctx, 0.016);
        assert!(ctx.device().calls.is_empty());
        assert_eq!(scene.phase(), ScenePhase::Uninitialized);
    }

    #[test]
    fn test_double_init_is_rejected() {
        let (mut scene, mut ctx) = ready_scene();
        assert!(matches!(
            scene.init(&mut ctx),
            Err(SceneError::AlreadyInitialized)
        ));
        scene.teardown(&mut ctx);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let (mut scene, mut ctx) = ready_scene();
        scene.update(&mut ctx, 0.016);
        scene.teardown(&mut ctx);

        assert_eq!(scene.phase(), ScenePhase::Released);
        assert_eq!(ctx.device().live_programs(), 0);
        assert_eq!(ctx.device().live_vertex_arrays(), 0);
        assert_eq!(ctx.device().live_buffers(), 0);

        ctx.device_mut().clear_calls();
        scene.update(&mut ctx, 0.016);
        scene.teardown(&mut ctx);
        assert!(ctx.device().calls.is_empty());
        assert!(matches!(
            scene.init(&mut ctx),
            Err(SceneError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_init_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(include_str!("../../assets/shaders/default.glsl").as_bytes())
            .unwrap();

        let mut ctx = RenderContext::new(MockDevice::new());
        let mut scene = LevelEditorScene::new(file.path());
        scene.init(&mut ctx).unwrap();
        assert_eq!(scene.phase(), ScenePhase::Ready);
        scene.teardown(&mut ctx);
    }

    #[test]
    fn test_missing_shader_file_leaves_scene_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = RenderContext::new(MockDevice::new());
        let mut scene = LevelEditorScene::new(dir.path().join("nope.glsl"));

        assert!(matches!(scene.init(&mut ctx), Err(SceneError::Shader(_))));
        assert_eq!(scene.phase(), ScenePhase::Uninitialized);
        assert!(ctx.device().calls.is_empty());
    }

    #[test]
    fn test_mesh_failure_releases_shader() {
        let mut ctx = RenderContext::new(MockDevice::new());
        // two shader objects and the program succeed, the vertex array fails
        ctx.device_mut().fail_create_after = Some(3);
        let mut scene = LevelEditorScene::with_source(ShaderSource::builtin().unwrap());

        assert!(matches!(scene.init(&mut ctx), Err(SceneError::Mesh(_))));
        assert_eq!(scene.phase(), ScenePhase::Uninitialized);
        assert_eq!(ctx.device().live_programs(), 0);
        assert_eq!(ctx.device().live_shaders(), 0);

        scene.init(&mut ctx).unwrap();
        scene.teardown(&mut ctx);
    }
}
