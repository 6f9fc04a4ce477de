use super::context::RenderContext;
use super::device::{
    BufferId, BufferTarget, BufferUsage, GraphicsDevice, IndexType, Topology, VertexArrayId,
    VertexAttribute,
};
use bytemuck::{Pod, Zeroable};
use std::mem::{offset_of, size_of};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("index count {0} is not a non-zero multiple of 3")]
    IndexCount(usize),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("failed to create GPU object: {0}")]
    Device(String),
}

/// Interleaved position + color vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const STRIDE: usize = size_of::<Vertex>();

    pub const ATTRIBUTES: [VertexAttribute; 2] = [
        VertexAttribute {
            location: 0,
            components: 3,
            offset: offset_of!(Vertex, position),
        },
        VertexAttribute {
            location: 1,
            components: 4,
            offset: offset_of!(Vertex, color),
        },
    ];

    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Triangle-list geometry held on the CPU side.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    /// Unit quad centered on the origin, one color per corner.
    ///
    /// ```text
    ///  1        2
    ///
    ///  3        0
    /// ```
    pub fn quad() -> Self {
        Self {
            vertices: vec![
                Vertex::new([0.5, -0.5, 0.0], [1.0, 0.0, 0.0, 1.0]), // bottom right
                Vertex::new([-0.5, 0.5, 0.0], [0.0, 1.0, 0.0, 1.0]), // top left
                Vertex::new([0.5, 0.5, 0.0], [0.0, 0.0, 1.0, 1.0]),  // top right
                Vertex::new([-0.5, -0.5, 0.0], [1.0, 1.0, 0.0, 1.0]), // bottom left
            ],
            // counter-clockwise
            indices: vec![2, 1, 0, 0, 1, 3],
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// A mesh uploaded into a vertex array with its vertex and index buffers.
#[derive(Debug)]
pub struct GpuMesh {
    vertex_array: VertexArrayId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    index_count: usize,
}

impl GpuMesh {
    pub fn upload<D: GraphicsDevice>(
        ctx: &mut RenderContext<D>,
        mesh: &Mesh,
    ) -> Result<Self, MeshError> {
        let device = ctx.device_mut();
        let vertex_array = device.create_vertex_array().map_err(MeshError::Device)?;
        let vertex_buffer = match device.create_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                device.delete_vertex_array(vertex_array);
                return Err(MeshError::Device(e));
            }
        };
        let index_buffer = match device.create_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                device.delete_buffer(vertex_buffer);
                device.delete_vertex_array(vertex_array);
                return Err(MeshError::Device(e));
            }
        };

        ctx.bind_vertex_array(vertex_array);
        let device = ctx.device_mut();

        device.bind_buffer(BufferTarget::Array, Some(vertex_buffer));
        device.buffer_data(
            BufferTarget::Array,
            bytemuck::cast_slice(&mesh.vertices),
            BufferUsage::StaticDraw,
        );

        device.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
        device.buffer_data(
            BufferTarget::ElementArray,
            bytemuck::cast_slice(&mesh.indices),
            BufferUsage::StaticDraw,
        );

        for attribute in Vertex::ATTRIBUTES {
            device.vertex_attrib_pointer(attribute, Vertex::STRIDE);
            device.enable_vertex_attrib_array(attribute.location);
        }

        ctx.unbind_vertex_array();
        log::debug!(
            "Uploaded mesh: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len(),
        })
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Binds the vertex array, draws every index, unbinds.
    pub fn draw<D: GraphicsDevice>(&self, ctx: &mut RenderContext<D>) {
        ctx.bind_vertex_array(self.vertex_array);
        ctx.device_mut()
            .draw_elements(Topology::Triangles, self.index_count, IndexType::U32);
        ctx.unbind_vertex_array();
    }

    pub fn release<D: GraphicsDevice>(self, ctx: &mut RenderContext<D>) {
        ctx.forget_vertex_array(self.vertex_array);
        let device = ctx.device_mut();
        device.delete_buffer(self.index_buffer);
        device.delete_buffer(self.vertex_buffer);
        device.delete_vertex_array(self.vertex_array);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mock::{DeviceCall, MockDevice};

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::STRIDE, 28);
        assert_eq!(Vertex::ATTRIBUTES[0].offset, 0);
        assert_eq!(Vertex::ATTRIBUTES[0].components, 3);
        assert_eq!(Vertex::ATTRIBUTES[1].offset, 12);
        assert_eq!(Vertex::ATTRIBUTES[1].components, 4);
    }

    #[test]
    fn test_quad_is_two_triangles() {
        let quad = Mesh::quad();
        assert_eq!(quad.vertices().len(), 4);
        assert_eq!(quad.indices(), &[2, 1, 0, 0, 1, 3]);
        assert_eq!(Mesh::new(quad.vertices().to_vec(), quad.indices().to_vec()), Ok(quad));
    }

    #[test]
    fn test_mesh_validation() {
        let vertices = Mesh::quad().vertices().to_vec();
        assert_eq!(
            Mesh::new(vertices.clone(), vec![]),
            Err(MeshError::IndexCount(0))
        );
        assert_eq!(
            Mesh::new(vertices.clone(), vec![0, 1]),
            Err(MeshError::IndexCount(2))
        );
        assert_eq!(
            Mesh::new(vertices, vec![0, 1, 4]),
            Err(MeshError::IndexOutOfRange {
                index: 4,
                vertex_count: 4
            })
        );
    }

    #[test]
    fn test_upload_quad() {
        let mut ctx = RenderContext::new(MockDevice::new());
        let quad = Mesh::quad();
        let mesh = GpuMesh::upload(&mut ctx, &quad).unwrap();

        assert_eq!(mesh.index_count(), 6);
        assert_eq!(ctx.bound_vertex_array(), None);
        let device = ctx.device();
        assert_eq!(
            device.uploaded(BufferTarget::Array),
            Some(bytemuck::cast_slice::<Vertex, u8>(quad.vertices()))
        );
        assert_eq!(device.uploaded(BufferTarget::ElementArray).map(<[u8]>::len), Some(24));
        assert!(device.calls.contains(&DeviceCall::VertexAttribPointer {
            attribute: Vertex::ATTRIBUTES[1],
            stride: 28,
        }));
        assert!(device.calls.contains(&DeviceCall::EnableVertexAttribArray(0)));
        assert!(device.calls.contains(&DeviceCall::EnableVertexAttribArray(1)));

        mesh.release(&mut ctx);
        assert_eq!(ctx.device().live_buffers(), 0);
        assert_eq!(ctx.device().live_vertex_arrays(), 0);
    }

    #[test]
    fn test_upload_failure_cleans_up() {
        for succeeding in 0..3 {
            let mut ctx = RenderContext::new(MockDevice::new());
            ctx.device_mut().fail_create_after = Some(succeeding);
            assert!(matches!(
                GpuMesh::upload(&mut ctx, &Mesh::quad()),
                Err(MeshError::Device(_))
            ));
            assert_eq!(ctx.device().live_vertex_arrays(), 0);
            assert_eq!(ctx.device().live_buffers(), 0);
        }
    }

    #[test]
    fn test_draw_issues_one_indexed_call() {
        let mut ctx = RenderContext::new(MockDevice::new());
        let mesh = GpuMesh::upload(&mut ctx, &Mesh::quad()).unwrap();
        ctx.device_mut().clear_calls();

        mesh.draw(&mut ctx);
        assert_eq!(
            ctx.device().calls,
            vec![
                DeviceCall::BindVertexArray(Some(mesh.vertex_array())),
                DeviceCall::DrawElements {
                    topology: Topology::Triangles,
                    count: 6,
                    index_type: IndexType::U32,
                },
                DeviceCall::BindVertexArray(None),
            ]
        );

        mesh.release(&mut ctx);
    }
}
