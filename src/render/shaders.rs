// shaders.rs - Shader loading, compile/link and binding

use super::context::RenderContext;
use super::device::{GraphicsDevice, ProgramId, ShaderId, ShaderStage};
use super::shader_source::{ShaderParseError, ShaderSource};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderErrorKind {
    #[error("could not read file: {0}")]
    Io(#[source] std::io::Error),
    #[error("invalid shader file: {0}")]
    Parse(#[from] ShaderParseError),
    #[error("{stage} shader compilation failed:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program linking failed:\n{log}")]
    Link { log: String },
    #[error("program was released and its source discarded")]
    Released,
}

/// Any failure turning a shader file into a linked program.
#[derive(Debug)]
pub struct ShaderLoadError {
    path: PathBuf,
    kind: ShaderErrorKind,
}

impl ShaderLoadError {
    pub fn new(path: impl Into<PathBuf>, kind: ShaderErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &ShaderErrorKind {
        &self.kind
    }

}

impl fmt::Display for ShaderLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shader '{}': {}", self.path.display(), self.kind)
    }
}

impl std::error::Error for ShaderLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

/// A GPU program built from one tagged GLSL file.
///
/// The parsed text is held until [`Shader::compile_and_link`] succeeds and
/// is dropped afterwards; from then on only the program handle remains. The
/// program must be given back with [`Shader::release`].
pub struct Shader {
    path: PathBuf,
    source: Option<ShaderSource>,
    program: Option<ProgramId>,
}

impl Shader {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShaderLoadError> {
        Ok(Self::from_source(ShaderSource::load(path)?))
    }

    pub fn from_source(source: ShaderSource) -> Self {
        Self {
            path: source.path().to_path_buf(),
            source: Some(source),
            program: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn is_linked(&self) -> bool {
        self.program.is_some()
    }

    pub fn compile_and_link<D: GraphicsDevice>(
        &mut self,
        ctx: &mut RenderContext<D>,
    ) -> Result<(), ShaderLoadError> {
        if self.program.is_some() {
            log::debug!("Shader '{}' is already linked", self.path.display());
            return Ok(());
        }
        let Some(source) = self.source.as_ref() else {
            log::error!(
                "Shader '{}' was released and cannot be linked again",
                self.path.display()
            );
            return Err(ShaderLoadError::new(&self.path, ShaderErrorKind::Released));
        };

        let device = ctx.device_mut();
        let vertex = self.compile_stage(device, source, ShaderStage::Vertex)?;
        let fragment = match self.compile_stage(device, source, ShaderStage::Fragment) {
            Ok(fragment) => fragment,
            Err(e) => {
                device.delete_shader(vertex);
                return Err(e);
            }
        };

        let result = self.link(device, vertex, fragment);
        device.delete_shader(vertex);
        device.delete_shader(fragment);
        let program = result?;

        log::info!("Linked shader '{}'", self.path.display());
        self.program = Some(program);
        self.source = None;
        Ok(())
    }

    fn compile_stage<D: GraphicsDevice>(
        &self,
        device: &mut D,
        source: &ShaderSource,
        stage: ShaderStage,
    ) -> Result<ShaderId, ShaderLoadError> {
        let shader = device
            .create_shader(stage)
            .map_err(|log| self.compile_error(stage, log))?;
        device.shader_source(shader, source.stage(stage));
        device.compile_shader(shader);

        if !device.shader_compile_status(shader) {
            let log = device.shader_info_log(shader);
            device.delete_shader(shader);
            return Err(self.compile_error(stage, log));
        }

        log::debug!("Compiled {stage} stage of '{}'", self.path.display());
        Ok(shader)
    }

    fn link<D: GraphicsDevice>(
        &self,
        device: &mut D,
        vertex: ShaderId,
        fragment: ShaderId,
    ) -> Result<ProgramId, ShaderLoadError> {
        let program = device
            .create_program()
            .map_err(|log| self.link_error(log))?;
        device.attach_shader(program, vertex);
        device.attach_shader(program, fragment);
        device.link_program(program);

        if !device.program_link_status(program) {
            let log = device.program_info_log(program);
            device.delete_program(program);
            return Err(self.link_error(log));
        }
        Ok(program)
    }

    fn compile_error(&self, stage: ShaderStage, log: String) -> ShaderLoadError {
        log::error!(
            "'{}': {stage} shader compilation failed\n\t{log}",
            self.path.display()
        );
        ShaderLoadError::new(&self.path, ShaderErrorKind::Compile { stage, log })
    }

    fn link_error(&self, log: String) -> ShaderLoadError {
        log::error!("'{}': shader linking failed\n\t{log}", self.path.display());
        ShaderLoadError::new(&self.path, ShaderErrorKind::Link { log })
    }

    /// Makes this program current for subsequent draws.
    pub fn use_program<D: GraphicsDevice>(&self, ctx: &mut RenderContext<D>) {
        match self.program {
            Some(program) => ctx.bind_program(program),
            None => log::warn!(
                "Shader '{}' used before it was linked",
                self.path.display()
            ),
        }
    }

    /// Leaves no program current if this shader's program is the bound one.
    pub fn detach<D: GraphicsDevice>(&self, ctx: &mut RenderContext<D>) {
        if self.program.is_some() && ctx.bound_program() == self.program {
            ctx.unbind_program();
        }
    }

    pub fn release<D: GraphicsDevice>(&mut self, ctx: &mut RenderContext<D>) {
        if let Some(program) = self.program.take() {
            ctx.forget_program(program);
            ctx.device_mut().delete_program(program);
            log::debug!("Released shader '{}'", self.path.display());
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        if let Some(program) = self.program {
            log::warn!(
                "Shader '{}' dropped without release; program {} leaked",
                self.path.display(),
                program.0
            );
        }
    }
}
