use std::rc::Rc;

use gl::types::*;
use log::debug;

use crate::api::GlApi;
use crate::buffer::VertexBuffer;
use crate::context::{Context, Slot};
use crate::error::{GraphicsError, Result};
use crate::layout::VertexBufferLayout;

/// A vertex array object (VAO), which remembers which buffers feed which attributes and how their
/// bytes should be read, so a single bind restores all of it before a draw.
pub struct VertexArray<A: GlApi> {
    ctx: Rc<Context<A>>,
    id: GLuint,
}

impl<A: GlApi> VertexArray<A> {
    pub fn new(ctx: &Rc<Context<A>>) -> Result<Self> {
        let id = gl_call!(ctx, gl => gl.gen_vertex_array());
        if id == 0 {
            return Err(GraphicsError::ResourceCreation("vertex array"));
        }

        Ok(Self { ctx: Rc::clone(ctx), id })
    }

    pub fn id(&self) -> GLuint { self.id }

    /// Points the attributes of this array at `vb`, read according to `layout`.
    ///
    /// Attribute `i` is the `i`th element pushed to the layout. Its offset is the sum of the sizes
    /// of the elements pushed before it, and every attribute shares the layout's stride. Leaves
    /// both this array and `vb` bound.
    pub fn add_buffer(&self, vb: &VertexBuffer<A>, layout: &VertexBufferLayout) {
        self.bind();
        vb.bind();

        let stride = layout.stride() as GLsizei;
        let mut offset = 0usize;

        for (index, element) in layout.elements().iter().enumerate() {
            let index = index as GLuint;

            gl_call!(self.ctx, gl => gl.enable_vertex_attrib_array(index));
            gl_call!(self.ctx, gl => gl.vertex_attrib_pointer(
                index,
                element.count as GLint,
                element.kind,
                element.normalized,
                stride,
                offset,
            ));

            offset += element.size() as usize;
        }

        debug!(
            "vertex array {}: {} attributes from buffer {} with stride {}",
            self.id,
            layout.elements().len(),
            vb.id(),
            stride
        );
    }

    pub fn bind(&self) {
        self.ctx.bind(Slot::VertexArray, self.id);
    }

    pub fn unbind(&self) {
        self.ctx.bind(Slot::VertexArray, 0);
    }
}

impl<A: GlApi> Drop for VertexArray<A> {
    fn drop(&mut self) {
        let id = self.id;
        gl_call!(self.ctx, gl => gl.delete_vertex_array(id));
        self.ctx.release(id, |slot| slot == Slot::VertexArray);
    }
}
