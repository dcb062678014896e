use std::rc::Rc;

use gl::types::*;

use crate::api::GlApi;
use crate::buffer::IndexBuffer;
use crate::context::Context;
use crate::shader::Shader;
use crate::vertex_array::VertexArray;

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Points = gl::POINTS as isize,
    Lines = gl::LINES as isize,
    LineStrip = gl::LINE_STRIP as isize,
    Triangles = gl::TRIANGLES as isize,
    TriangleStrip = gl::TRIANGLE_STRIP as isize,
    TriangleFan = gl::TRIANGLE_FAN as isize,
}

impl Primitive {
    pub fn gl_enum(self) -> GLenum { self as GLenum }
}

/// Which vertices one draw call covers.
pub enum DrawCall<'a, A: GlApi> {
    /// `count` consecutive vertices starting at `first`.
    Arrays { mode: Primitive, first: i32, count: i32 },
    /// Every index in `indices`.
    Indexed { mode: Primitive, indices: &'a IndexBuffer<A> },
}

/// Issues clears and draws against whatever state the wrappers have bound. Holds no state of its
/// own.
pub struct Renderer<A: GlApi> {
    ctx: Rc<Context<A>>,
}

impl<A: GlApi> Renderer<A> {
    pub fn new(ctx: &Rc<Context<A>>) -> Self {
        Self { ctx: Rc::clone(ctx) }
    }

    pub fn set_clear_color(&self, [r, g, b, a]: [f32; 4]) {
        gl_call!(self.ctx, gl => gl.clear_color(r, g, b, a));
    }

    pub fn enable_depth_test(&self) {
        gl_call!(self.ctx, gl => gl.enable(gl::DEPTH_TEST));
    }

    pub fn viewport(&self, width: u32, height: u32) {
        gl_call!(self.ctx, gl => gl.viewport(0, 0, width as GLsizei, height as GLsizei));
    }

    /// Clears the colour and depth buffers.
    pub fn clear(&self) {
        gl_call!(self.ctx, gl => gl.clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT));
    }

    /// Binds `shader` and `va` (and the index buffer, for indexed draws), then draws.
    pub fn draw(&self, va: &VertexArray<A>, shader: &Shader<A>, call: DrawCall<'_, A>) {
        shader.bind();
        va.bind();

        match call {
            DrawCall::Arrays { mode, first, count } => {
                gl_call!(self.ctx, gl => gl.draw_arrays(mode.gl_enum(), first, count));
            }
            DrawCall::Indexed { mode, indices } => {
                indices.bind();
                let count = indices.count() as GLsizei;
                gl_call!(self.ctx, gl => gl.draw_elements(mode.gl_enum(), count, gl::UNSIGNED_INT));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::VertexBuffer;
    use crate::context::{ErrorPolicy, Slot};
    use crate::layout::VertexBufferLayout;
    use crate::mock::{Call, MockGl};
    use crate::shader::{LinkPolicy, ShaderProgramSource};

    fn context() -> Rc<Context<MockGl>> {
        Rc::new(Context::new(MockGl::new()).with_error_policy(ErrorPolicy::Log))
    }

    fn shader(ctx: &Rc<Context<MockGl>>) -> Shader<MockGl> {
        let source = ShaderProgramSource::new("void main() {}", "void main() {}");
        Shader::new(ctx, &source, LinkPolicy::Always).unwrap()
    }

    #[test]
    fn clear_covers_colour_and_depth() {
        let ctx = context();

        Renderer::new(&ctx).clear();

        assert_eq!(ctx.gl().calls(), vec![Call::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT)]);
    }

    #[test]
    fn array_draw_uses_the_callers_count() {
        let ctx = context();
        let shader = shader(&ctx);
        let va = VertexArray::new(&ctx).unwrap();
        let vb = VertexBuffer::new(&ctx, &[0.0f32; 6]).unwrap();
        va.add_buffer(&vb, &VertexBufferLayout::new().with::<f32>(2));
        ctx.gl().clear_calls();

        Renderer::new(&ctx).draw(&va, &shader, DrawCall::Arrays {
            mode: Primitive::Triangles,
            first: 0,
            count: 3,
        });

        assert_eq!(
            ctx.gl().calls(),
            vec![
                Call::UseProgram(shader.id()),
                Call::BindVertexArray(va.id()),
                Call::DrawArrays(gl::TRIANGLES, 0, 3),
            ]
        );
    }

    #[test]
    fn indexed_draw_binds_the_indices() {
        let ctx = context();
        let shader = shader(&ctx);
        let va = VertexArray::new(&ctx).unwrap();
        let ib = IndexBuffer::new(&ctx, &[0, 1, 2, 2, 3, 0]).unwrap();
        ctx.gl().clear_calls();

        Renderer::new(&ctx).draw(&va, &shader, DrawCall::Indexed {
            mode: Primitive::Triangles,
            indices: &ib,
        });

        assert_eq!(ctx.bound(Slot::ElementBuffer), ib.id());
        assert_eq!(
            ctx.gl().calls().last(),
            Some(&Call::DrawElements(gl::TRIANGLES, 6, gl::UNSIGNED_INT))
        );
    }

    #[test]
    fn state_setters() {
        let ctx = context();
        let renderer = Renderer::new(&ctx);

        renderer.set_clear_color([0.1, 0.2, 0.3, 1.0]);
        renderer.enable_depth_test();
        renderer.viewport(640, 480);

        assert_eq!(
            ctx.gl().calls(),
            vec![
                Call::ClearColor([0.1, 0.2, 0.3, 1.0]),
                Call::Enable(gl::DEPTH_TEST),
                Call::Viewport(0, 0, 640, 480),
            ]
        );
    }
}
