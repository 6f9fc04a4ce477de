// context.rs - Explicit "currently bound" state for the render loop

use super::device::{GraphicsDevice, ProgramId, VertexArrayId};

/// Owns the graphics device and remembers what is bound on it.
///
/// OpenGL keeps the active program and vertex array as hidden global state;
/// routing every bind through here keeps bind/unbind pairs visible and lets
/// tests check them against a recording device.
pub struct RenderContext<D: GraphicsDevice> {
    device: D,
    bound_program: Option<ProgramId>,
    bound_vertex_array: Option<VertexArrayId>,
}

impl<D: GraphicsDevice> RenderContext<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            bound_program: None,
            bound_vertex_array: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.bound_program
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.bound_vertex_array
    }

    pub fn bind_program(&mut self, program: ProgramId) {
        self.device.use_program(Some(program));
        self.bound_program = Some(program);
    }

    pub fn unbind_program(&mut self) {
        if self.bound_program.take().is_some() {
            self.device.use_program(None);
        }
    }

    pub fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.device.bind_vertex_array(Some(vertex_array));
        self.bound_vertex_array = Some(vertex_array);
    }

    pub fn unbind_vertex_array(&mut self) {
        if self.bound_vertex_array.take().is_some() {
            self.device.bind_vertex_array(None);
        }
    }

    /// Drops the binding record for a program that is about to be deleted.
    pub(crate) fn forget_program(&mut self, program: ProgramId) {
        if self.bound_program == Some(program) {
            self.unbind_program();
        }
    }

    pub(crate) fn forget_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if self.bound_vertex_array == Some(vertex_array) {
            self.unbind_vertex_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mock::{DeviceCall, MockDevice};

    #[test]
    fn test_bind_and_unbind_program() {
        let mut ctx = RenderContext::new(MockDevice::new());
        let program = ctx.device_mut().create_program().unwrap();
        ctx.device_mut().clear_calls();

        ctx.bind_program(program);
        assert_eq!(ctx.bound_program(), Some(program));
        ctx.unbind_program();
        assert_eq!(ctx.bound_program(), None);

        assert_eq!(
            ctx.device().calls,
            vec![
                DeviceCall::UseProgram(Some(program)),
                DeviceCall::UseProgram(None),
            ]
        );
    }

    #[test]
    fn test_unbind_is_idempotent() {
        let mut ctx = RenderContext::new(MockDevice::new());
        ctx.unbind_program();
        ctx.unbind_vertex_array();
        ctx.unbind_program();
        assert!(ctx.device().calls.is_empty());
    }

    #[test]
    fn test_forget_only_clears_matching_binding() {
        let mut ctx = RenderContext::new(MockDevice::new());
        let vao = ctx.device_mut().create_vertex_array().unwrap();
        let other = ctx.device_mut().create_vertex_array().unwrap();
        ctx.bind_vertex_array(vao);

        ctx.forget_vertex_array(other);
        assert_eq!(ctx.bound_vertex_array(), Some(vao));
        ctx.forget_vertex_array(vao);
        assert_eq!(ctx.bound_vertex_array(), None);
    }
}
