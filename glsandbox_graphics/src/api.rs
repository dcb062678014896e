//! The OpenGL surface the wrappers are written against.
//!
//! Every call the rest of the crate makes to the driver goes through [`GlApi`]. The production
//! implementation, [`NativeGl`], forwards to the function pointers loaded by [`gl::load_with`];
//! tests swap in a recording backend so that bind/unbind ordering and uniform lookups can be
//! checked without a window. Handles are the raw `GLuint` names the driver hands back, and `0`
//! always means "no object".
//!
//! Most of this is a one-to-one mapping of the [docs.gl](http://docs.gl/) reference pages, so the
//! method names follow the GL function names with the `gl` prefix dropped.

use std::ffi::{c_void, CString};
use std::ptr::null;

use gl::types::*;

/// Value returned by `glGetUniformLocation` when the program has no active uniform of that name.
pub const UNIFORM_NOT_FOUND: GLint = -1;

pub trait GlApi {
    fn get_error(&self) -> GLenum;

    fn gen_buffer(&self) -> GLuint;
    fn delete_buffer(&self, id: GLuint);
    fn bind_buffer(&self, target: GLenum, id: GLuint);
    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum);

    fn gen_vertex_array(&self) -> GLuint;
    fn delete_vertex_array(&self, id: GLuint);
    fn bind_vertex_array(&self, id: GLuint);
    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );

    fn create_shader(&self, kind: GLenum) -> GLuint;
    fn shader_source(&self, id: GLuint, source: &str);
    fn compile_shader(&self, id: GLuint);
    fn shader_compile_status(&self, id: GLuint) -> bool;
    fn shader_info_log(&self, id: GLuint) -> String;
    fn delete_shader(&self, id: GLuint);

    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn program_link_status(&self, program: GLuint) -> bool;
    fn validate_program(&self, program: GLuint);
    fn program_validate_status(&self, program: GLuint) -> bool;
    fn program_info_log(&self, program: GLuint) -> String;
    fn use_program(&self, program: GLuint);
    fn delete_program(&self, program: GLuint);

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint;
    fn uniform_1i(&self, location: GLint, value: GLint);
    fn uniform_1f(&self, location: GLint, value: GLfloat);
    fn uniform_4f(&self, location: GLint, v0: GLfloat, v1: GLfloat, v2: GLfloat, v3: GLfloat);
    /// Uploads a column-major 4x4 matrix.
    fn uniform_matrix_4fv(&self, location: GLint, value: &[GLfloat; 16]);

    fn gen_texture(&self) -> GLuint;
    fn delete_texture(&self, id: GLuint);
    fn active_texture(&self, unit: GLenum);
    fn bind_texture(&self, target: GLenum, id: GLuint);
    fn tex_parameter_i(&self, target: GLenum, name: GLenum, value: GLint);
    /// Uploads tightly packed RGBA8 pixels to level 0 of the bound 2D texture.
    fn tex_image_2d_rgba(&self, width: GLsizei, height: GLsizei, pixels: &[u8]);

    fn enable(&self, capability: GLenum);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
    fn clear(&self, mask: GLbitfield);
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum);
}

/// Forwards to the global `gl` function pointers. A context must be current on the calling thread
/// and `gl::load_with` must have been called before any method is used.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeGl;

impl NativeGl {
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        NativeGl
    }
}

/// Creates a buffer of `len` spaces for the driver to write an info log into.
fn info_log_buffer(len: usize) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::with_capacity(len + 1);
    buf.extend([b' '].iter().cycle().take(len));
    buf
}

/// Trims the driver-written log at its nul terminator.
fn info_log_to_string(mut buf: Vec<u8>, written: GLsizei) -> String {
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).trim_end().to_owned()
}

impl GlApi for NativeGl {
    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        id
    }

    fn delete_buffer(&self, id: GLuint) {
        unsafe { gl::DeleteBuffers(1, &id) };
    }

    fn bind_buffer(&self, target: GLenum, id: GLuint) {
        unsafe { gl::BindBuffer(target, id) };
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe {
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                usage,
            );
        }
    }

    fn gen_vertex_array(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        id
    }

    fn delete_vertex_array(&self, id: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &id) };
    }

    fn bind_vertex_array(&self, id: GLuint) {
        unsafe { gl::BindVertexArray(id) };
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::EnableVertexAttribArray(index) };
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
        let normalized = if normalized { gl::TRUE } else { gl::FALSE };
        unsafe {
            gl::VertexAttribPointer(index, size, kind, normalized, stride, offset as *const c_void);
        }
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        unsafe { gl::CreateShader(kind) }
    }

    fn shader_source(&self, id: GLuint, source: &str) {
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(id, 1, &ptr, &len) };
    }

    fn compile_shader(&self, id: GLuint) {
        unsafe { gl::CompileShader(id) };
    }

    fn shader_compile_status(&self, id: GLuint) -> bool {
        let mut success = 0;
        unsafe { gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut success) };
        success != 0
    }

    fn shader_info_log(&self, id: GLuint) -> String {
        let mut len = 0;
        unsafe { gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut len) };

        let mut buf = info_log_buffer(len.max(0) as usize);
        let mut written = 0;
        unsafe { gl::GetShaderInfoLog(id, len, &mut written, buf.as_mut_ptr() as *mut GLchar) };
        info_log_to_string(buf, written)
    }

    fn delete_shader(&self, id: GLuint) {
        unsafe { gl::DeleteShader(id) };
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) };
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) };
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        let mut success = 0;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut success) };
        success != 0
    }

    fn validate_program(&self, program: GLuint) {
        unsafe { gl::ValidateProgram(program) };
    }

    fn program_validate_status(&self, program: GLuint) -> bool {
        let mut success = 0;
        unsafe { gl::GetProgramiv(program, gl::VALIDATE_STATUS, &mut success) };
        success != 0
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut len = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };

        let mut buf = info_log_buffer(len.max(0) as usize);
        let mut written = 0;
        unsafe {
            gl::GetProgramInfoLog(program, len, &mut written, buf.as_mut_ptr() as *mut GLchar)
        };
        info_log_to_string(buf, written)
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) };
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        // A name with an interior nul can't name a GLSL identifier
        match CString::new(name) {
            Ok(name) => unsafe { gl::GetUniformLocation(program, name.as_ptr()) },
            Err(_) => UNIFORM_NOT_FOUND,
        }
    }

    fn uniform_1i(&self, location: GLint, value: GLint) {
        unsafe { gl::Uniform1i(location, value) };
    }

    fn uniform_1f(&self, location: GLint, value: GLfloat) {
        unsafe { gl::Uniform1f(location, value) };
    }

    fn uniform_4f(&self, location: GLint, v0: GLfloat, v1: GLfloat, v2: GLfloat, v3: GLfloat) {
        unsafe { gl::Uniform4f(location, v0, v1, v2, v3) };
    }

    fn uniform_matrix_4fv(&self, location: GLint, value: &[GLfloat; 16]) {
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, value.as_ptr()) };
    }

    fn gen_texture(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        id
    }

    fn delete_texture(&self, id: GLuint) {
        unsafe { gl::DeleteTextures(1, &id) };
    }

    fn active_texture(&self, unit: GLenum) {
        unsafe { gl::ActiveTexture(unit) };
    }

    fn bind_texture(&self, target: GLenum, id: GLuint) {
        unsafe { gl::BindTexture(target, id) };
    }

    fn tex_parameter_i(&self, target: GLenum, name: GLenum, value: GLint) {
        unsafe { gl::TexParameteri(target, name, value) };
    }

    fn tex_image_2d_rgba(&self, width: GLsizei, height: GLsizei, pixels: &[u8]) {
        let data = if pixels.is_empty() {
            null()
        } else {
            pixels.as_ptr() as *const c_void
        };

        unsafe {
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as GLint,
                width,
                height,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                data,
            );
        }
    }

    fn enable(&self, capability: GLenum) {
        unsafe { gl::Enable(capability) };
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { gl::Viewport(x, y, width, height) };
    }

    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        unsafe { gl::ClearColor(r, g, b, a) };
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { gl::Clear(mask) };
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        unsafe { gl::DrawArrays(mode, first, count) };
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum) {
        unsafe { gl::DrawElements(mode, count, kind, null()) };
    }
}
