//! A small set of wrappers around the OpenGL API.
//!
//! Drawing anything with raw OpenGL takes a lot of cryptic, unsafe calls that all act on hidden
//! global state. This crate wraps each kind of GPU object (buffers, vertex arrays, shader programs
//! and textures) in a type that creates the object when constructed and deletes it when dropped,
//! and routes every bind through an explicit [`Context`] so the order of operations is visible.
//!
//! A knowledge of OpenGL is still *necessary* to follow what's going on. [Learn OpenGL] is a
//! classic set of tutorials on the subject, and [docs.gl] is the quickest reference for any single
//! call.
//!
//! [Learn OpenGL]: https://learnopengl.com/
//! [docs.gl]: http://docs.gl/

#[macro_use]
pub mod context;

pub mod api;
pub mod buffer;
pub mod error;
pub mod layout;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod vertex_array;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use api::{GlApi, NativeGl, UNIFORM_NOT_FOUND};
pub use buffer::{IndexBuffer, VertexBuffer};
pub use context::{error_name, Context, ErrorPolicy, Slot};
pub use error::{GraphicsError, Result};
pub use layout::{LayoutScalar, VertexBufferElement, VertexBufferLayout};
pub use renderer::{DrawCall, Primitive, Renderer};
pub use shader::{LinkPolicy, Shader, ShaderProgramSource, ShaderStage, SECTION_MARKER};
pub use texture::Texture;
pub use vertex_array::VertexArray;
