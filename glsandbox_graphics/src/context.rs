//! The graphics context's binding points, made explicit.
//!
//! OpenGL keeps a handful of global "currently bound" registers: which buffer is bound to
//! `GL_ARRAY_BUFFER`, which program is in use, which texture sits on each texture unit, and so
//! on. Every wrapper in this crate mutates those registers, and everything that happens between
//! two binds on the same slot acts on whatever was bound first. Rather than let that state live
//! only inside the driver, [`Context`] mirrors it, so the order of binds is visible in the type
//! signatures (everything takes an `Rc<Context<A>>`) and can be asserted on in tests.
//!
//! The element buffer binding is the exception: it is part of the bound vertex array's state, so
//! it is recorded per vertex array and follows vertex array binds.
//!
//! A context is tied to one thread, the thread that owns the window's GL context. Nothing here is
//! `Sync`, and nothing needs to be.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::thread;

use gl::types::*;
use log::error;

use crate::api::GlApi;

/// Clears any stale driver errors, issues a driver call, then logs every error the driver raised
/// along with the call's text, file and line.
///
/// ```ignore
/// gl_call!(self.ctx, gl => gl.draw_arrays(gl::TRIANGLES, 0, 3));
/// ```
macro_rules! gl_call {
    ($ctx:expr, $gl:ident => $call:expr) => {{
        let ctx = &$ctx;
        ctx.clear_errors();
        let $gl = ctx.gl();
        let result = $call;
        ctx.check_errors(stringify!($call), file!(), line!());
        result
    }};
}

// glGetError can keep reporting GL_CONTEXT_LOST forever, so draining is bounded
const MAX_DRAINED_ERRORS: usize = 32;

/// A global binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    ArrayBuffer,
    /// `GL_ELEMENT_ARRAY_BUFFER` of the bound vertex array.
    ElementBuffer,
    VertexArray,
    Program,
    /// `GL_TEXTURE_2D` on the given texture unit.
    Texture2D(u32),
}

/// What to do after the driver reports an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log, then panic so the failing call can be inspected.
    Halt,
    /// Log and carry on.
    Log,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ErrorPolicy::Halt
        } else {
            ErrorPolicy::Log
        }
    }
}

pub struct Context<A: GlApi> {
    gl: A,
    bindings: RefCell<HashMap<Slot, GLuint>>,
    // Keyed by vertex array; 0 is the default vertex array
    element_bindings: RefCell<HashMap<GLuint, GLuint>>,
    active_unit: Cell<u32>,
    policy: ErrorPolicy,
}

impl<A: GlApi> Context<A> {
    pub fn new(gl: A) -> Self {
        Self {
            gl,
            bindings: RefCell::new(HashMap::new()),
            element_bindings: RefCell::new(HashMap::new()),
            active_unit: Cell::new(0),
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn gl(&self) -> &A { &self.gl }

    pub fn error_policy(&self) -> ErrorPolicy { self.policy }

    /// The handle currently occupying `slot`, or 0 if nothing is bound there.
    pub fn bound(&self, slot: Slot) -> GLuint {
        match slot {
            Slot::ElementBuffer => {
                let vertex_array = self.bound(Slot::VertexArray);
                self.element_bindings.borrow().get(&vertex_array).copied().unwrap_or(0)
            }
            _ => self.bindings.borrow().get(&slot).copied().unwrap_or(0),
        }
    }

    pub fn active_texture_unit(&self) -> u32 { self.active_unit.get() }

    /// Binds `id` to `slot`. Binding 0 empties the slot; the previous occupant is not restored.
    pub fn bind(&self, slot: Slot, id: GLuint) {
        match slot {
            Slot::ArrayBuffer => gl_call!(self, gl => gl.bind_buffer(gl::ARRAY_BUFFER, id)),
            Slot::ElementBuffer => {
                gl_call!(self, gl => gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, id))
            }
            Slot::VertexArray => gl_call!(self, gl => gl.bind_vertex_array(id)),
            Slot::Program => gl_call!(self, gl => gl.use_program(id)),
            Slot::Texture2D(unit) => {
                self.activate_texture_unit(unit);
                gl_call!(self, gl => gl.bind_texture(gl::TEXTURE_2D, id));
            }
        }

        if slot == Slot::ElementBuffer {
            let vertex_array = self.bound(Slot::VertexArray);
            self.element_bindings.borrow_mut().insert(vertex_array, id);
        } else {
            self.bindings.borrow_mut().insert(slot, id);
        }
    }

    pub fn activate_texture_unit(&self, unit: u32) {
        gl_call!(self, gl => gl.active_texture(gl::TEXTURE0 + unit));
        self.active_unit.set(unit);
    }

    /// Forgets `id` in every slot that currently holds it. The driver implicitly unbinds an object
    /// when it's deleted, so this is called from the wrappers' destructors.
    pub(crate) fn release<F>(&self, id: GLuint, mut in_slot: F)
    where
        F: FnMut(Slot) -> bool,
    {
        for (slot, bound) in self.bindings.borrow_mut().iter_mut() {
            if *bound == id && in_slot(*slot) {
                *bound = 0;
            }
        }

        if in_slot(Slot::VertexArray) {
            self.element_bindings.borrow_mut().remove(&id);
        }
        if in_slot(Slot::ElementBuffer) {
            for bound in self.element_bindings.borrow_mut().values_mut() {
                if *bound == id {
                    *bound = 0;
                }
            }
        }
    }

    pub fn clear_errors(&self) {
        for _ in 0..MAX_DRAINED_ERRORS {
            if self.gl.get_error() == gl::NO_ERROR {
                break;
            }
        }
    }

    /// Logs every pending driver error against `call`. Returns whether any were found.
    ///
    /// # Panics
    ///
    /// Panics after logging if the context uses [`ErrorPolicy::Halt`].
    pub fn check_errors(&self, call: &str, file: &str, line: u32) -> bool {
        let mut failed = false;

        for _ in 0..MAX_DRAINED_ERRORS {
            let code = self.gl.get_error();
            if code == gl::NO_ERROR {
                break;
            }

            error!("[OpenGL Error] ({:#06x} {}): {} {}:{}", code, error_name(code), call, file, line);
            failed = true;
        }

        // A second panic during unwinding would abort
        if failed && self.policy == ErrorPolicy::Halt && !thread::panicking() {
            panic!("OpenGL error in `{}` at {}:{}", call, file, line);
        }

        failed
    }
}

pub fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown error",
    }
}
