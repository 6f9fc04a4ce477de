use crate::config::{EngineConfig, RenderConfig};
use crate::render::{GlDevice, GraphicsDevice, RenderContext, ShaderSource};
use crate::scene::{LevelEditorScene, Scene, SceneError};
use anyhow::{anyhow, Context, Result};
use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, GlProfile, Version},
    display::{GetGlDisplay, GlDisplay},
    prelude::*,
    surface::SwapInterval,
};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use std::{ffi::CString, num::NonZeroU32, ptr, time::Instant};
use winit::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

/// Seconds between consecutive ticks; the first tick reports zero.
#[derive(Debug, Default)]
pub struct FrameTimer {
    last: Option<Instant>,
}

impl FrameTimer {
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f32());
        self.last = Some(now);
        dt
    }
}

/// Builds and initializes the level editor scene from `config`.
///
/// A shader file that fails to load, compile or link is replaced by the
/// built-in shader when `fallback_to_builtin_shader` is set.
pub fn init_scene<D: GraphicsDevice>(
    config: &RenderConfig,
    ctx: &mut RenderContext<D>,
) -> Result<LevelEditorScene, SceneError> {
    let mut scene = LevelEditorScene::new(&config.shader_path);
    match scene.init(ctx) {
        Ok(()) => Ok(scene),
        Err(SceneError::Shader(e)) if config.fallback_to_builtin_shader => {
            log::error!("{e}");
            log::warn!("Falling back to the built-in shader");
            let mut scene = LevelEditorScene::with_source(ShaderSource::builtin()?);
            scene.init(ctx)?;
            Ok(scene)
        }
        Err(e) => Err(e),
    }
}

pub struct Window {
    config: EngineConfig,
}

impl Window {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Opens the window and runs the frame loop until it is closed.
    pub fn run(self) -> Result<()> {
        let window_config = &self.config.window;
        let event_loop = EventLoop::new()?;
        let window_builder = WindowBuilder::new()
            .with_title(window_config.title.as_str())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));

        let template = ConfigTemplateBuilder::new().with_alpha_size(8);
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .expect("display offered no OpenGL configs")
            })
            .map_err(|e| anyhow!("failed to create OpenGL display: {e}"))?;
        let window = window.ok_or_else(|| anyhow!("failed to create window"))?;

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(window.raw_window_handle()));

        let gl_display = gl_config.display();
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("failed to create OpenGL context")?;

        let attrs = window.build_surface_attributes(Default::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
            .context("failed to create GL surface")?;
        let gl_context = not_current
            .make_current(&gl_surface)
            .context("failed to make context current")?;

        if window_config.vsync {
            if let Err(e) =
                gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                log::warn!("Could not enable vsync: {e}");
            }
        }

        let device = GlDevice::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => gl_display.get_proc_address(&symbol),
            Err(_) => ptr::null(),
        });
        let mut ctx = RenderContext::new(device);
        let size = window.inner_size();
        ctx.device_mut().viewport(size.width, size.height);

        let mut scene = init_scene(&self.config.render, &mut ctx)?;
        let clear_color = self.config.render.clear_color;
        let mut timer = FrameTimer::default();
        log::info!("Window '{}' open", window_config.title);

        event_loop.run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => {
                    if let (Some(width), Some(height)) =
                        (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                    {
                        gl_surface.resize(&gl_context, width, height);
                        ctx.device_mut().viewport(size.width, size.height);
                    }
                }
                WindowEvent::RedrawRequested => {
                    let dt = timer.tick();
                    ctx.device_mut().clear(clear_color);
                    scene.update(&mut ctx, dt);
                    if let Err(e) = gl_surface.swap_buffers(&gl_context) {
                        log::error!("Failed to swap buffers: {e}");
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                scene.teardown(&mut ctx);
                log::info!("Window closed");
            }
            _ => {}
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mock::MockDevice;
    use crate::scene::level_editor::ScenePhase;
    use std::time::Duration;

    #[test]
    fn test_frame_timer() {
        let start = Instant::now();
        let mut timer = FrameTimer::default();
        assert_eq!(timer.tick_at(start), 0.0);
        let dt = timer.tick_at(start + Duration::from_millis(250));
        assert!((dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_init_scene_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            shader_path: dir.path().join("missing.glsl"),
            ..RenderConfig::default()
        };
        let mut ctx = RenderContext::new(MockDevice::new());

        let mut scene = init_scene(&config, &mut ctx).unwrap();
        assert_eq!(scene.phase(), ScenePhase::Ready);
        scene.teardown(&mut ctx);
    }

    #[test]
    fn test_init_scene_without_fallback_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            shader_path: dir.path().join("missing.glsl"),
            fallback_to_builtin_shader: false,
            ..RenderConfig::default()
        };
        let mut ctx = RenderContext::new(MockDevice::new());

        assert!(matches!(
            init_scene(&config, &mut ctx),
            Err(SceneError::Shader(_))
        ));
    }

    #[test]
    fn test_init_scene_from_shipped_shader() {
        let config = RenderConfig {
            shader_path: concat!(env!("CARGO_MANIFEST_DIR"), "/assets/shaders/default.glsl").into(),
            fallback_to_builtin_shader: false,
            ..RenderConfig::default()
        };
        let mut ctx = RenderContext::new(MockDevice::new());
        let mut scene = init_scene(&config, &mut ctx).unwrap();
        scene.teardown(&mut ctx);
    }
}
