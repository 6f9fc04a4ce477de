//! Recording graphics device for tests
//!
//! `MockDevice` implements [`GraphicsDevice`] without a GPU. Every call is
//! recorded as a [`DeviceCall`] so tests can assert on the exact sequence a
//! shader or scene issues, and a small GLSL checker stands in for the
//! driver's compiler and linker so failure paths can be exercised too.

use super::device::{
    BufferId, BufferTarget, BufferUsage, GraphicsDevice, IndexType, ProgramId, ShaderId,
    ShaderStage, Topology, VertexArrayId, VertexAttribute,
};
use std::collections::{HashMap, HashSet};

/// Record of a driver call for test inspection
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateShader(ShaderStage, ShaderId),
    ShaderSource(ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    DeleteProgram(ProgramId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData {
        target: BufferTarget,
        len: usize,
        usage: BufferUsage,
    },
    DeleteBuffer(BufferId),
    VertexAttribPointer {
        attribute: VertexAttribute,
        stride: usize,
    },
    EnableVertexAttribArray(u32),
    DrawElements {
        topology: Topology,
        count: usize,
        index_type: IndexType,
    },
}

#[derive(Debug)]
struct MockShader {
    stage: ShaderStage,
    source: String,
    compiled: Option<Result<(), String>>,
}

#[derive(Debug, Default)]
struct MockProgram {
    attached: Vec<ShaderId>,
    linked: Option<Result<(), String>>,
}

/// A device that records calls instead of rendering
#[derive(Debug, Default)]
pub struct MockDevice {
    /// All driver calls, in order
    pub calls: Vec<DeviceCall>,
    /// Object creations that still succeed before one fails
    pub fail_create_after: Option<usize>,
    next_id: u32,
    shaders: HashMap<ShaderId, MockShader>,
    programs: HashMap<ProgramId, MockProgram>,
    vertex_arrays: HashSet<VertexArrayId>,
    buffers: HashSet<BufferId>,
    uploads: HashMap<BufferTarget, Vec<u8>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Bytes last uploaded to `target`
    pub fn uploaded(&self, target: BufferTarget) -> Option<&[u8]> {
        self.uploads.get(&target).map(Vec::as_slice)
    }

    pub fn draw_calls(&self) -> Vec<&DeviceCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::DrawElements { .. }))
            .collect()
    }

    fn next_name(&mut self) -> Result<u32, String> {
        match self.fail_create_after {
            Some(0) => {
                self.fail_create_after = None;
                return Err("mock driver refused to create object".to_string());
            }
            Some(n) => self.fail_create_after = Some(n - 1),
            None => {}
        }
        self.next_id += 1;
        Ok(self.next_id)
    }
}

impl GraphicsDevice for MockDevice {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderId, String> {
        let id = ShaderId(self.next_name()?);
        self.shaders.insert(
            id,
            MockShader {
                stage,
                source: String::new(),
                compiled: None,
            },
        );
        self.calls.push(DeviceCall::CreateShader(stage, id));
        Ok(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(s) = self.shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
        self.calls.push(DeviceCall::ShaderSource(shader));
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        if let Some(s) = self.shaders.get_mut(&shader) {
            s.compiled = Some(check_syntax(&s.source));
        }
        self.calls.push(DeviceCall::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        matches!(
            self.shaders.get(&shader).and_then(|s| s.compiled.as_ref()),
            Some(Ok(()))
        )
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        match self.shaders.get(&shader).and_then(|s| s.compiled.as_ref()) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
        self.calls.push(DeviceCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> Result<ProgramId, String> {
        let id = ProgramId(self.next_name()?);
        self.programs.insert(id, MockProgram::default());
        self.calls.push(DeviceCall::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(p) = self.programs.get_mut(&program) {
            p.attached.push(shader);
        }
        self.calls.push(DeviceCall::AttachShader(program, shader));
    }

    fn link_program(&mut self, program: ProgramId) {
        let result = match self.programs.get(&program) {
            Some(p) => self.check_link(&p.attached),
            None => Err("ERROR: invalid program object".to_string()),
        };
        if let Some(p) = self.programs.get_mut(&program) {
            p.linked = Some(result);
        }
        self.calls.push(DeviceCall::LinkProgram(program));
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        matches!(
            self.programs.get(&program).and_then(|p| p.linked.as_ref()),
            Some(Ok(()))
        )
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        match self.programs.get(&program).and_then(|p| p.linked.as_ref()) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.calls.push(DeviceCall::DeleteProgram(program));
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, String> {
        let id = VertexArrayId(self.next_name()?);
        self.vertex_arrays.insert(id);
        self.calls.push(DeviceCall::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.calls.push(DeviceCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array);
        self.calls.push(DeviceCall::DeleteVertexArray(vertex_array));
    }

    fn create_buffer(&mut self) -> Result<BufferId, String> {
        let id = BufferId(self.next_name()?);
        self.buffers.insert(id);
        self.calls.push(DeviceCall::CreateBuffer(id));
        Ok(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.calls.push(DeviceCall::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.uploads.insert(target, data.to_vec());
        self.calls.push(DeviceCall::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.calls.push(DeviceCall::DeleteBuffer(buffer));
    }

    fn vertex_attrib_pointer(&mut self, attribute: VertexAttribute, stride: usize) {
        self.calls
            .push(DeviceCall::VertexAttribPointer { attribute, stride });
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.calls.push(DeviceCall::EnableVertexAttribArray(location));
    }

    fn draw_elements(&mut self, topology: Topology, count: usize, index_type: IndexType) {
        self.calls.push(DeviceCall::DrawElements {
            topology,
            count,
            index_type,
        });
    }
}

impl MockDevice {
    /// Every fragment `in` must be fed by a vertex `out` of the same name.
    fn check_link(&self, attached: &[ShaderId]) -> Result<(), String> {
        let mut vertex = None;
        let mut fragment = None;
        for id in attached {
            let shader = self
                .shaders
                .get(id)
                .ok_or_else(|| "ERROR: attached shader was deleted".to_string())?;
            if shader.compiled != Some(Ok(())) {
                return Err("ERROR: attached shader is not compiled".to_string());
            }
            match shader.stage {
                ShaderStage::Vertex => vertex = Some(shader),
                ShaderStage::Fragment => fragment = Some(shader),
            }
        }
        let (vertex, fragment) = match (vertex, fragment) {
            (Some(v), Some(f)) => (v, f),
            _ => return Err("ERROR: program needs a vertex and a fragment stage".to_string()),
        };

        let outputs = interface_names(&vertex.source, "out");
        for input in interface_names(&fragment.source, "in") {
            if !outputs.contains(&input) {
                return Err(format!(
                    "ERROR: fragment shader input '{input}' is not written by the vertex shader"
                ));
            }
        }
        Ok(())
    }
}

fn check_syntax(source: &str) -> Result<(), String> {
    let mut depth: [i32; 2] = [0, 0];
    for (line_no, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth[0] += 1,
                '}' => depth[0] -= 1,
                '(' => depth[1] += 1,
                ')' => depth[1] -= 1,
                _ => {}
            }
            if depth[0] < 0 || depth[1] < 0 {
                return Err(format!("ERROR: 0:{}: syntax error: unexpected '{c}'", line_no + 1));
            }
        }
    }
    if depth != [0, 0] {
        return Err("ERROR: 0:0: syntax error: unexpected end of file".to_string());
    }
    if !source.contains("void main") {
        return Err("ERROR: 0:0: 'main' : function not defined".to_string());
    }
    Ok(())
}

/// Names declared with the given storage qualifier (`in` or `out`).
fn interface_names(source: &str, qualifier: &str) -> Vec<String> {
    let code: String = source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");
    let mut names = Vec::new();
    for statement in code.split(|c| c == ';' || c == '{' || c == '}') {
        let mut decl = statement.trim();
        if let Some(rest) = decl.strip_prefix("layout") {
            match rest.find(')') {
                Some(end) => decl = rest[end + 1..].trim(),
                None => continue,
            }
        }
        let tokens: Vec<&str> = decl.split_whitespace().collect();
        let Some(pos) = tokens.iter().position(|t| *t == qualifier) else {
            continue;
        };
        // interpolation qualifiers may precede the storage qualifier
        if !tokens[..pos]
            .iter()
            .all(|t| matches!(*t, "flat" | "smooth" | "noperspective"))
        {
            continue;
        }
        if let Some(&name) = tokens.get(pos + 2) {
            let name = name.split('[').next().unwrap_or(name);
            names.push(name.to_string());
        }
    }
    names
}
