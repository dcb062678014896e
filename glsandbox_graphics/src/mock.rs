//! A [`GlApi`] that records calls instead of talking to a driver.
//!
//! Names are handed out from a counter starting at 1. A shader compiles unless its source is blank
//! or contains the text `syntax error`; a program links when every attached shader compiled.
//! Uniform locations exist only for names registered with [`MockGl::with_uniforms`].

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use gl::types::*;

use crate::api::{GlApi, UNIFORM_NOT_FOUND};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GenBuffer(GLuint),
    DeleteBuffer(GLuint),
    BindBuffer(GLenum, GLuint),
    BufferData { target: GLenum, len: usize, usage: GLenum },
    GenVertexArray(GLuint),
    DeleteVertexArray(GLuint),
    BindVertexArray(GLuint),
    EnableVertexAttribArray(GLuint),
    VertexAttribPointer {
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    },
    CreateShader(GLenum, GLuint),
    ShaderSource(GLuint),
    CompileShader(GLuint),
    DeleteShader(GLuint),
    CreateProgram(GLuint),
    AttachShader(GLuint, GLuint),
    LinkProgram(GLuint),
    ValidateProgram(GLuint),
    UseProgram(GLuint),
    DeleteProgram(GLuint),
    UniformLocation(GLuint, String),
    Uniform1i(GLint, GLint),
    Uniform1f(GLint, GLfloat),
    Uniform4f(GLint, [GLfloat; 4]),
    UniformMatrix4fv(GLint, [GLfloat; 16]),
    GenTexture(GLuint),
    DeleteTexture(GLuint),
    ActiveTexture(GLenum),
    BindTexture(GLenum, GLuint),
    TexParameter(GLenum, GLenum, GLint),
    TexImage2D { width: GLsizei, height: GLsizei, len: usize },
    Enable(GLenum),
    Viewport(GLint, GLint, GLsizei, GLsizei),
    ClearColor([GLfloat; 4]),
    Clear(GLbitfield),
    DrawArrays(GLenum, GLint, GLsizei),
    DrawElements(GLenum, GLsizei, GLenum),
}

#[derive(Debug, Default)]
pub struct MockGl {
    next_name: Cell<GLuint>,
    refuse_names: Cell<bool>,
    fail_link: Cell<bool>,
    calls: RefCell<Vec<Call>>,
    errors: RefCell<VecDeque<GLenum>>,
    buffers: RefCell<HashMap<GLenum, GLuint>>,
    sources: RefCell<HashMap<GLuint, String>>,
    compiled: RefCell<HashSet<GLuint>>,
    attached: RefCell<HashMap<GLuint, Vec<GLuint>>>,
    uniforms: RefCell<HashMap<String, GLint>>,
}

impl MockGl {
    pub fn new() -> Self {
        let mock = Self::default();
        mock.next_name.set(1);
        mock
    }

    /// Makes every active uniform in `names` resolvable, at locations 0, 1, 2...
    pub fn with_uniforms(self, names: &[&str]) -> Self {
        {
            let mut uniforms = self.uniforms.borrow_mut();
            for name in names {
                let location = uniforms.len() as GLint;
                uniforms.insert((*name).to_owned(), location);
            }
        }
        self
    }

    /// Makes every subsequent link fail.
    pub fn failing_link(self) -> Self {
        self.fail_link.set(true);
        self
    }

    /// Makes every `glGen*`/`glCreate*` call return 0.
    pub fn refusing_names(self) -> Self {
        self.refuse_names.set(true);
        self
    }

    /// Queues an error code to be returned by the next `glGetError`.
    pub fn raise(&self, code: GLenum) {
        self.errors.borrow_mut().push_back(code);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&Call) -> bool,
    {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn uniform_queries(&self, name: &str) -> usize {
        self.count(|c| match c {
            Call::UniformLocation(_, n) => n == name,
            _ => false,
        })
    }

    pub fn bound_buffer(&self, target: GLenum) -> GLuint {
        self.buffers.borrow().get(&target).copied().unwrap_or(0)
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn name(&self) -> GLuint {
        if self.refuse_names.get() {
            return 0;
        }

        let name = self.next_name.get();
        self.next_name.set(name + 1);
        name
    }
}

impl GlApi for MockGl {
    fn get_error(&self) -> GLenum {
        self.errors.borrow_mut().pop_front().unwrap_or(gl::NO_ERROR)
    }

    fn gen_buffer(&self) -> GLuint {
        let id = self.name();
        self.record(Call::GenBuffer(id));
        id
    }

    fn delete_buffer(&self, id: GLuint) {
        self.buffers.borrow_mut().retain(|_, bound| *bound != id);
        self.record(Call::DeleteBuffer(id));
    }

    fn bind_buffer(&self, target: GLenum, id: GLuint) {
        self.buffers.borrow_mut().insert(target, id);
        self.record(Call::BindBuffer(target, id));
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.record(Call::BufferData { target, len: data.len(), usage });
    }

    fn gen_vertex_array(&self) -> GLuint {
        let id = self.name();
        self.record(Call::GenVertexArray(id));
        id
    }

    fn delete_vertex_array(&self, id: GLuint) {
        self.record(Call::DeleteVertexArray(id));
    }

    fn bind_vertex_array(&self, id: GLuint) {
        self.record(Call::BindVertexArray(id));
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.record(Call::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        self.record(Call::VertexAttribPointer { index, size, kind, normalized, stride, offset });
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        let id = self.name();
        self.record(Call::CreateShader(kind, id));
        id
    }

    fn shader_source(&self, id: GLuint, source: &str) {
        self.sources.borrow_mut().insert(id, source.to_owned());
        self.record(Call::ShaderSource(id));
    }

    fn compile_shader(&self, id: GLuint) {
        let ok = self
            .sources
            .borrow()
            .get(&id)
            .map(|src| !src.trim().is_empty() && !src.contains("syntax error"))
            .unwrap_or(false);

        if ok {
            self.compiled.borrow_mut().insert(id);
        }
        self.record(Call::CompileShader(id));
    }

    fn shader_compile_status(&self, id: GLuint) -> bool {
        self.compiled.borrow().contains(&id)
    }

    fn shader_info_log(&self, id: GLuint) -> String {
        if self.shader_compile_status(id) {
            String::new()
        } else {
            format!("0:1(1): error: shader {} did not compile", id)
        }
    }

    fn delete_shader(&self, id: GLuint) {
        self.record(Call::DeleteShader(id));
    }

    fn create_program(&self) -> GLuint {
        let id = self.name();
        self.record(Call::CreateProgram(id));
        id
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.attached.borrow_mut().entry(program).or_default().push(shader);
        self.record(Call::AttachShader(program, shader));
    }

    fn link_program(&self, program: GLuint) {
        self.record(Call::LinkProgram(program));
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        if self.fail_link.get() {
            return false;
        }

        let attached = self.attached.borrow();
        let compiled = self.compiled.borrow();
        match attached.get(&program) {
            Some(shaders) => shaders.len() >= 2 && shaders.iter().all(|s| compiled.contains(s)),
            None => false,
        }
    }

    fn validate_program(&self, program: GLuint) {
        self.record(Call::ValidateProgram(program));
    }

    fn program_validate_status(&self, program: GLuint) -> bool {
        self.program_link_status(program)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        if self.program_link_status(program) {
            String::new()
        } else {
            format!("error: program {} failed to link", program)
        }
    }

    fn use_program(&self, program: GLuint) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&self, program: GLuint) {
        self.record(Call::DeleteProgram(program));
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        self.record(Call::UniformLocation(program, name.to_owned()));
        self.uniforms.borrow().get(name).copied().unwrap_or(UNIFORM_NOT_FOUND)
    }

    fn uniform_1i(&self, location: GLint, value: GLint) {
        self.record(Call::Uniform1i(location, value));
    }

    fn uniform_1f(&self, location: GLint, value: GLfloat) {
        self.record(Call::Uniform1f(location, value));
    }

    fn uniform_4f(&self, location: GLint, v0: GLfloat, v1: GLfloat, v2: GLfloat, v3: GLfloat) {
        self.record(Call::Uniform4f(location, [v0, v1, v2, v3]));
    }

    fn uniform_matrix_4fv(&self, location: GLint, value: &[GLfloat; 16]) {
        self.record(Call::UniformMatrix4fv(location, *value));
    }

    fn gen_texture(&self) -> GLuint {
        let id = self.name();
        self.record(Call::GenTexture(id));
        id
    }

    fn delete_texture(&self, id: GLuint) {
        self.record(Call::DeleteTexture(id));
    }

    fn active_texture(&self, unit: GLenum) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: GLenum, id: GLuint) {
        self.record(Call::BindTexture(target, id));
    }

    fn tex_parameter_i(&self, target: GLenum, name: GLenum, value: GLint) {
        self.record(Call::TexParameter(target, name, value));
    }

    fn tex_image_2d_rgba(&self, width: GLsizei, height: GLsizei, pixels: &[u8]) {
        self.record(Call::TexImage2D { width, height, len: pixels.len() });
    }

    fn enable(&self, capability: GLenum) {
        self.record(Call::Enable(capability));
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        self.record(Call::ClearColor([r, g, b, a]));
    }

    fn clear(&self, mask: GLbitfield) {
        self.record(Call::Clear(mask));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.record(Call::DrawArrays(mode, first, count));
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum) {
        self.record(Call::DrawElements(mode, count, kind));
    }
}
