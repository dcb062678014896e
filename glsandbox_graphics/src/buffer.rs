//! Vertex and index buffers.
//!
//! A [vertex buffer object (VBO)](vbo) holds the per-vertex data sent to the graphics card. An
//! index buffer (also called an element buffer) is a list of vertex IDs, which lets shared
//! vertices be stored once: a rectangle is two triangles but only four vertices. Both are filled
//! once at construction with `GL_STATIC_DRAW` data and never written again.
//!
//! [vbo]: https://en.wikipedia.org/wiki/Vertex_buffer_object

use std::rc::Rc;

use bytemuck::Pod;
use gl::types::*;
use log::trace;

use crate::api::GlApi;
use crate::context::{Context, Slot};
use crate::error::{GraphicsError, Result};

/// A buffer object bound to a single target for its whole life.
struct Buffer<A: GlApi> {
    ctx: Rc<Context<A>>,
    id: GLuint,
    slot: Slot,
    size: usize,
}

impl<A: GlApi> Buffer<A> {
    fn upload(ctx: &Rc<Context<A>>, slot: Slot, data: &[u8], what: &'static str) -> Result<Self> {
        let id = gl_call!(ctx, gl => gl.gen_buffer());
        if id == 0 {
            return Err(GraphicsError::ResourceCreation(what));
        }

        let buffer = Self { ctx: Rc::clone(ctx), id, slot, size: data.len() };
        buffer.bind();
        gl_call!(ctx, gl => gl.buffer_data(buffer.target(), data, gl::STATIC_DRAW));
        trace!("uploaded {} bytes to {} {}", data.len(), what, id);

        Ok(buffer)
    }

    fn target(&self) -> GLenum {
        match self.slot {
            Slot::ElementBuffer => gl::ELEMENT_ARRAY_BUFFER,
            _ => gl::ARRAY_BUFFER,
        }
    }

    fn bind(&self) {
        self.ctx.bind(self.slot, self.id);
    }

    fn unbind(&self) {
        self.ctx.bind(self.slot, 0);
    }
}

impl<A: GlApi> Drop for Buffer<A> {
    fn drop(&mut self) {
        let id = self.id;
        gl_call!(self.ctx, gl => gl.delete_buffer(id));

        let slot = self.slot;
        self.ctx.release(id, |s| s == slot);
    }
}

pub struct VertexBuffer<A: GlApi>(Buffer<A>);

impl<A: GlApi> VertexBuffer<A> {
    /// Uploads `data` to a new buffer on `GL_ARRAY_BUFFER`, leaving it bound.
    pub fn new<T: Pod>(ctx: &Rc<Context<A>>, data: &[T]) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Buffer::upload(ctx, Slot::ArrayBuffer, bytes, "vertex buffer").map(VertexBuffer)
    }

    pub fn id(&self) -> GLuint { self.0.id }

    /// Size of the uploaded data in bytes.
    pub fn size(&self) -> usize { self.0.size }

    pub fn bind(&self) { self.0.bind() }

    pub fn unbind(&self) { self.0.unbind() }
}

pub struct IndexBuffer<A: GlApi> {
    buffer: Buffer<A>,
    count: usize,
}

impl<A: GlApi> IndexBuffer<A> {
    /// Uploads `indices` to a new buffer on `GL_ELEMENT_ARRAY_BUFFER`, leaving it bound.
    ///
    /// The element binding is part of vertex array state, so bind the vertex array these indices
    /// belong to first.
    pub fn new(ctx: &Rc<Context<A>>, indices: &[GLuint]) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let buffer = Buffer::upload(ctx, Slot::ElementBuffer, bytes, "index buffer")?;

        Ok(Self { buffer, count: indices.len() })
    }

    pub fn id(&self) -> GLuint { self.buffer.id }

    /// Number of indices.
    pub fn count(&self) -> usize { self.count }

    pub fn bind(&self) { self.buffer.bind() }

    pub fn unbind(&self) { self.buffer.unbind() }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::ErrorPolicy;
    use crate::mock::{Call, MockGl};

    fn context(gl: MockGl) -> Rc<Context<MockGl>> {
        Rc::new(Context::new(gl).with_error_policy(ErrorPolicy::Log))
    }

    #[test]
    fn vertex_buffer_uploads_once_as_static_data() {
        let ctx = context(MockGl::new());
        let positions: [f32; 6] = [-0.5, -0.5, 0.0, 0.5, 0.5, -0.5];

        let vb = VertexBuffer::new(&ctx, &positions).unwrap();

        assert_eq!(vb.size(), 24);
        assert_eq!(ctx.bound(Slot::ArrayBuffer), vb.id());
        assert_eq!(
            ctx.gl().calls(),
            vec![
                Call::GenBuffer(vb.id()),
                Call::BindBuffer(gl::ARRAY_BUFFER, vb.id()),
                Call::BufferData { target: gl::ARRAY_BUFFER, len: 24, usage: gl::STATIC_DRAW },
            ]
        );
    }

    #[test]
    fn index_buffer_keeps_its_count() {
        let ctx = context(MockGl::new());

        let ib = IndexBuffer::new(&ctx, &[0, 1, 2, 2, 3, 0]).unwrap();

        assert_eq!(ib.count(), 6);
        assert_eq!(ctx.gl().bound_buffer(gl::ELEMENT_ARRAY_BUFFER), ib.id());
        assert_eq!(
            ctx.gl().count(|c| *c == Call::BufferData {
                target: gl::ELEMENT_ARRAY_BUFFER,
                len: 24,
                usage: gl::STATIC_DRAW,
            }),
            1
        );
    }

    #[test]
    fn second_bind_wins() {
        let ctx = context(MockGl::new());
        let a = VertexBuffer::new(&ctx, &[0.0f32; 3]).unwrap();
        let b = VertexBuffer::new(&ctx, &[1.0f32; 3]).unwrap();

        a.bind();
        b.bind();
        assert_eq!(ctx.bound(Slot::ArrayBuffer), b.id());

        b.unbind();
        assert_eq!(ctx.bound(Slot::ArrayBuffer), 0);
    }

    #[test]
    fn dropping_releases_the_name_and_the_slot() {
        let ctx = context(MockGl::new());
        let vb = VertexBuffer::new(&ctx, &[0u8; 16]).unwrap();
        let id = vb.id();

        drop(vb);

        assert_eq!(ctx.gl().count(|c| *c == Call::DeleteBuffer(id)), 1);
        assert_eq!(ctx.bound(Slot::ArrayBuffer), 0);
    }

    #[test]
    fn dropping_an_unbound_buffer_leaves_the_slot_alone() {
        let ctx = context(MockGl::new());
        let a = VertexBuffer::new(&ctx, &[0u8; 4]).unwrap();
        let b = VertexBuffer::new(&ctx, &[0u8; 4]).unwrap();

        drop(a);

        assert_eq!(ctx.bound(Slot::ArrayBuffer), b.id());
    }

    #[test]
    fn missing_name_is_an_error() {
        let ctx = context(MockGl::new().refusing_names());

        let result = VertexBuffer::new(&ctx, &[0.0f32; 3]);

        assert!(matches!(result, Err(GraphicsError::ResourceCreation("vertex buffer"))));
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::BufferData { .. })), 0);
    }
}
