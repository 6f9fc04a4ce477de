pub mod context;
pub mod device;
pub mod gl_device;
pub mod mesh;
pub mod mock;
pub mod shader_source;
pub mod shaders;

pub use context::RenderContext;
pub use device::{
    BufferId, BufferTarget, BufferUsage, GraphicsDevice, IndexType, ProgramId, ShaderId,
    ShaderStage, Topology, VertexArrayId, VertexAttribute,
};
pub use gl_device::GlDevice;
pub use mesh::{GpuMesh, Mesh, MeshError, Vertex};
pub use shader_source::{ShaderParseError, ShaderSource};
pub use shaders::{Shader, ShaderErrorKind, ShaderLoadError};
