//! Shader programs.
//!
//! Both stages of a program live in one file. A line containing `#shader vertex` or
//! `#shader fragment` starts that stage's section, and everything up to the next marker belongs to
//! it:
//!
//! ```text
//! #shader vertex
//! #version 330 core
//! layout(location = 0) in vec4 position;
//! void main() { gl_Position = position; }
//!
//! #shader fragment
//! #version 330 core
//! layout(location = 0) out vec4 color;
//! uniform vec4 u_Color;
//! void main() { color = u_Color; }
//! ```
//!
//! Lines before the first marker are ignored.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gl::types::*;
use log::{debug, error, warn};
use nalgebra::Matrix4;

use crate::api::{GlApi, UNIFORM_NOT_FOUND};
use crate::context::{Context, Slot};
use crate::error::{GraphicsError, Result};

/// Token that opens a stage section in a shader file.
pub const SECTION_MARKER: &str = "#shader";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex = gl::VERTEX_SHADER as isize,
    Fragment = gl::FRAGMENT_SHADER as isize,
}

impl ShaderStage {
    pub fn gl_enum(self) -> GLenum { self as GLenum }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// What to do with a program whose stages didn't all compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Link and validate anyway, so the driver's link diagnostics are logged too. The program is
    /// still discarded and the compile error returned.
    Always,
    /// Skip linking as soon as a stage fails to compile.
    RequireCompiledStages,
}

impl Default for LinkPolicy {
    fn default() -> Self { LinkPolicy::Always }
}

/// The two stage sources read out of a single shader file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderProgramSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgramSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }

    /// Splits `text` into its vertex and fragment sections. Every kept line gets a trailing `\n`.
    pub fn parse(text: &str) -> Self {
        let mut source = Self::default();
        let mut current: Option<ShaderStage> = None;

        for line in text.lines() {
            if line.contains(SECTION_MARKER) {
                if line.contains("vertex") {
                    current = Some(ShaderStage::Vertex);
                } else if line.contains("fragment") {
                    current = Some(ShaderStage::Fragment);
                }
                continue;
            }

            let section = match current {
                Some(ShaderStage::Vertex) => &mut source.vertex,
                Some(ShaderStage::Fragment) => &mut source.fragment,
                None => continue,
            };
            section.push_str(line);
            section.push('\n');
        }

        source
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GraphicsError::ShaderSource {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::parse(&text))
    }

    pub fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

/// A compiled stage object. Deleted when dropped, which only flags it for deletion if it's still
/// attached to a program.
struct CompiledStage<'a, A: GlApi> {
    ctx: &'a Context<A>,
    id: GLuint,
}

impl<'a, A: GlApi> Drop for CompiledStage<'a, A> {
    fn drop(&mut self) {
        let id = self.id;
        gl_call!(self.ctx, gl => gl.delete_shader(id));
    }
}

fn compile<'a, A: GlApi>(
    ctx: &'a Context<A>,
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledStage<'a, A>> {
    let id = gl_call!(ctx, gl => gl.create_shader(stage.gl_enum()));
    if id == 0 {
        return Err(GraphicsError::ResourceCreation("shader"));
    }

    let compiled = CompiledStage { ctx, id };
    gl_call!(ctx, gl => gl.shader_source(id, source));
    gl_call!(ctx, gl => gl.compile_shader(id));

    if !ctx.gl().shader_compile_status(id) {
        let log = ctx.gl().shader_info_log(id);
        error!("Failed to compile {} shader!\n{}", stage, log);
        return Err(GraphicsError::Compile { stage, log });
    }

    Ok(compiled)
}

/// A linked vertex + fragment program, with a cache of uniform locations.
pub struct Shader<A: GlApi> {
    ctx: Rc<Context<A>>,
    id: GLuint,
    path: Option<PathBuf>,
    uniform_cache: RefCell<HashMap<String, GLint>>,
}

impl<A: GlApi> Shader<A> {
    /// Reads, compiles and links the shader file at `path`.
    pub fn from_file<P: AsRef<Path>>(ctx: &Rc<Context<A>>, path: P, policy: LinkPolicy) -> Result<Self> {
        let path = path.as_ref();
        let source = ShaderProgramSource::from_file(path)?;

        let mut shader = Self::new(ctx, &source, policy)?;
        shader.path = Some(path.to_path_buf());
        debug!("loaded shader {} from {}", shader.id, path.display());

        Ok(shader)
    }

    /// Compiles and links GLSL that's already in memory.
    pub fn new(ctx: &Rc<Context<A>>, source: &ShaderProgramSource, policy: LinkPolicy) -> Result<Self> {
        let id = gl_call!(ctx, gl => gl.create_program());
        if id == 0 {
            return Err(GraphicsError::ResourceCreation("shader program"));
        }

        // Owning the program from here on means every early return deletes it
        let shader = Self {
            ctx: Rc::clone(ctx),
            id,
            path: None,
            uniform_cache: RefCell::new(HashMap::new()),
        };

        let vertex = compile(ctx, ShaderStage::Vertex, &source.vertex);
        let fragment = compile(ctx, ShaderStage::Fragment, &source.fragment);

        let (vertex, fragment) = match policy {
            LinkPolicy::RequireCompiledStages => (Ok(vertex?), Ok(fragment?)),
            LinkPolicy::Always => (vertex, fragment),
        };

        for stage in vertex.iter().chain(fragment.iter()) {
            let stage_id = stage.id;
            gl_call!(ctx, gl => gl.attach_shader(id, stage_id));
        }

        gl_call!(ctx, gl => gl.link_program(id));
        gl_call!(ctx, gl => gl.validate_program(id));

        let linked = ctx.gl().program_link_status(id);
        let validated = ctx.gl().program_validate_status(id);
        let log = ctx.gl().program_info_log(id);

        // The program keeps what it needs; the stage objects go whether or not linking worked
        let vertex = vertex.map(drop);
        let fragment = fragment.map(drop);
        vertex?;
        fragment?;

        if !linked {
            error!("Failed to link shader program!\n{}", log);
            return Err(GraphicsError::Link { log });
        }

        if !validated {
            warn!("shader program {} did not validate: {}", id, log);
        }

        Ok(shader)
    }

    pub fn id(&self) -> GLuint { self.id }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn bind(&self) {
        self.ctx.bind(Slot::Program, self.id);
    }

    pub fn unbind(&self) {
        self.ctx.bind(Slot::Program, 0);
    }

    /// Looks `name` up in this program, asking the driver only the first time. Names the program
    /// doesn't have resolve to -1, which is cached too, so the warning is only logged once.
    pub fn uniform_location(&self, name: &str) -> GLint {
        if let Some(&location) = self.uniform_cache.borrow().get(name) {
            return location;
        }

        let id = self.id;
        let location = gl_call!(self.ctx, gl => gl.uniform_location(id, name));
        if location == UNIFORM_NOT_FOUND {
            warn!("uniform '{}' doesn't exist in {}", name, self.describe());
        }

        self.uniform_cache.borrow_mut().insert(name.to_owned(), location);
        location
    }

    // The uniform setters act on whichever program is in use; bind this one first.

    pub fn set_uniform_1i(&self, name: &str, value: i32) {
        let location = self.uniform_location(name);
        gl_call!(self.ctx, gl => gl.uniform_1i(location, value));
    }

    pub fn set_uniform_1f(&self, name: &str, value: f32) {
        let location = self.uniform_location(name);
        gl_call!(self.ctx, gl => gl.uniform_1f(location, value));
    }

    pub fn set_uniform_4f(&self, name: &str, v0: f32, v1: f32, v2: f32, v3: f32) {
        let location = self.uniform_location(name);
        gl_call!(self.ctx, gl => gl.uniform_4f(location, v0, v1, v2, v3));
    }

    pub fn set_uniform_mat4(&self, name: &str, matrix: &Matrix4<f32>) {
        let location = self.uniform_location(name);
        let mut columns = [0.0f32; 16];
        columns.copy_from_slice(matrix.as_slice());
        gl_call!(self.ctx, gl => gl.uniform_matrix_4fv(location, &columns));
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("shader {} ({})", self.id, path.display()),
            None => format!("shader {}", self.id),
        }
    }
}

impl<A: GlApi> Drop for Shader<A> {
    fn drop(&mut self) {
        let id = self.id;
        gl_call!(self.ctx, gl => gl.delete_program(id));
        self.ctx.release(id, |slot| slot == Slot::Program);
    }
}
