// device.rs - Graphics driver capability surface

use std::fmt;
use std::str::FromStr;

/// Pipeline stage a GLSL source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Fragment];

    pub fn as_str(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShaderStage {
    type Err = ();

    /// Case-sensitive: only `vertex` and `fragment` are stage names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertex" => Ok(ShaderStage::Vertex),
            "fragment" => Ok(ShaderStage::Fragment),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U32,
}

/// Float vertex attribute as handed to `glVertexAttribPointer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset: usize,
}

/// Everything the engine asks of the graphics driver.
///
/// Methods map one-to-one onto driver entry points so that the OpenGL
/// implementation stays a thin passthrough and a recording implementation
/// can stand in for it in tests. Object creation can fail when the driver
/// hands back no name; those failures are reported as plain messages.
pub trait GraphicsDevice {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderId, String>;
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    fn compile_shader(&mut self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> Result<ProgramId, String>;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn link_program(&mut self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn use_program(&mut self, program: Option<ProgramId>);
    fn delete_program(&mut self, program: ProgramId);

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, String>;
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    fn create_buffer(&mut self) -> Result<BufferId, String>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&mut self, buffer: BufferId);

    fn vertex_attrib_pointer(&mut self, attribute: VertexAttribute, stride: usize);
    fn enable_vertex_attrib_array(&mut self, location: u32);

    fn draw_elements(&mut self, topology: Topology, count: usize, index_type: IndexType);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_are_case_sensitive() {
        assert_eq!("vertex".parse::<ShaderStage>(), Ok(ShaderStage::Vertex));
        assert_eq!("fragment".parse::<ShaderStage>(), Ok(ShaderStage::Fragment));
        assert!("Vertex".parse::<ShaderStage>().is_err());
        assert!("FRAGMENT".parse::<ShaderStage>().is_err());
        assert!("geometry".parse::<ShaderStage>().is_err());
    }

    #[test]
    fn test_stage_display_round_trips() {
        for stage in ShaderStage::ALL {
            assert_eq!(stage.to_string().parse::<ShaderStage>(), Ok(stage));
        }
    }
}
