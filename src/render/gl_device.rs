// gl_device.rs - OpenGL implementation of the device surface

use super::device::{
    BufferId, BufferTarget, BufferUsage, GraphicsDevice, IndexType, ProgramId, ShaderId,
    ShaderStage, Topology, VertexArrayId, VertexAttribute,
};
use gl::types::*;
use std::ffi::c_void;
use std::ptr;

/// Talks to whatever OpenGL context is current on the calling thread.
///
/// Function pointers must have been loaded with `gl::load_with` before the
/// first call; see [`GlDevice::load_with`].
pub struct GlDevice {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl GlDevice {
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self {
            _not_send: std::marker::PhantomData,
        }
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            gl::ClearColor(color[0], color[1], color[2], color[3]);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    pub fn viewport(&mut self, width: u32, height: u32) {
        unsafe {
            gl::Viewport(0, 0, width as GLsizei, height as GLsizei);
        }
    }

    fn read_info_log(len: GLint, fill: impl FnOnce(GLsizei, *mut GLchar)) -> String {
        if len <= 0 {
            return String::new();
        }
        let mut buffer: Vec<u8> = vec![0; len as usize];
        fill(len, buffer.as_mut_ptr() as *mut GLchar);
        // Drop the terminating NUL the driver writes.
        while buffer.last() == Some(&0) {
            buffer.pop();
        }
        String::from_utf8_lossy(&buffer).trim_end().to_string()
    }
}

fn stage_enum(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn target_enum(target: BufferTarget) -> GLenum {
    match target {
        BufferTarget::Array => gl::ARRAY_BUFFER,
        BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
    }
}

fn usage_enum(usage: BufferUsage) -> GLenum {
    match usage {
        BufferUsage::StaticDraw => gl::STATIC_DRAW,
        BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
    }
}

impl GraphicsDevice for GlDevice {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderId, String> {
        let shader = unsafe { gl::CreateShader(stage_enum(stage)) };
        if shader == 0 {
            return Err(format!("glCreateShader({stage}) returned no shader object"));
        }
        Ok(ShaderId(shader))
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe {
            gl::ShaderSource(shader.0, 1, &ptr, &len);
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        unsafe {
            gl::CompileShader(shader.0);
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        let mut success = gl::FALSE as GLint;
        unsafe {
            gl::GetShaderiv(shader.0, gl::COMPILE_STATUS, &mut success);
        }
        success != gl::FALSE as GLint
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(shader.0, gl::INFO_LOG_LENGTH, &mut len);
        }
        Self::read_info_log(len, |len, buf| unsafe {
            gl::GetShaderInfoLog(shader.0, len, ptr::null_mut(), buf);
        })
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        unsafe {
            gl::DeleteShader(shader.0);
        }
    }

    fn create_program(&mut self) -> Result<ProgramId, String> {
        let program = unsafe { gl::CreateProgram() };
        if program == 0 {
            return Err("glCreateProgram returned no program object".to_string());
        }
        Ok(ProgramId(program))
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        unsafe {
            gl::AttachShader(program.0, shader.0);
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        unsafe {
            gl::LinkProgram(program.0);
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        let mut success = gl::FALSE as GLint;
        unsafe {
            gl::GetProgramiv(program.0, gl::LINK_STATUS, &mut success);
        }
        success != gl::FALSE as GLint
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let mut len = 0;
        unsafe {
            gl::GetProgramiv(program.0, gl::INFO_LOG_LENGTH, &mut len);
        }
        Self::read_info_log(len, |len, buf| unsafe {
            gl::GetProgramInfoLog(program.0, len, ptr::null_mut(), buf);
        })
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        unsafe {
            gl::UseProgram(program.map_or(0, |p| p.0));
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe {
            gl::DeleteProgram(program.0);
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, String> {
        let mut vao: GLuint = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
        }
        if vao == 0 {
            return Err("glGenVertexArrays returned no vertex array".to_string());
        }
        Ok(VertexArrayId(vao))
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        unsafe {
            gl::BindVertexArray(vertex_array.map_or(0, |v| v.0));
        }
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        unsafe {
            gl::DeleteVertexArrays(1, &vertex_array.0);
        }
    }

    fn create_buffer(&mut self) -> Result<BufferId, String> {
        let mut buffer: GLuint = 0;
        unsafe {
            gl::GenBuffers(1, &mut buffer);
        }
        if buffer == 0 {
            return Err("glGenBuffers returned no buffer".to_string());
        }
        Ok(BufferId(buffer))
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        unsafe {
            gl::BindBuffer(target_enum(target), buffer.map_or(0, |b| b.0));
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            gl::BufferData(
                target_enum(target),
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                usage_enum(usage),
            );
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        unsafe {
            gl::DeleteBuffers(1, &buffer.0);
        }
    }

    fn vertex_attrib_pointer(&mut self, attribute: VertexAttribute, stride: usize) {
        unsafe {
            gl::VertexAttribPointer(
                attribute.location,
                attribute.components,
                gl::FLOAT,
                gl::FALSE,
                stride as GLsizei,
                attribute.offset as *const c_void,
            );
        }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe {
            gl::EnableVertexAttribArray(location);
        }
    }

    fn draw_elements(&mut self, topology: Topology, count: usize, index_type: IndexType) {
        let mode = match topology {
            Topology::Triangles => gl::TRIANGLES,
        };
        let ty = match index_type {
            IndexType::U32 => gl::UNSIGNED_INT,
        };
        unsafe {
            gl::DrawElements(mode, count as GLsizei, ty, ptr::null());
        }
    }
}
