//! Describes how the bytes in a vertex buffer are split into attributes.
//!
//! A vertex is a run of attributes laid end to end. Attributes are pushed in the order they appear
//! in the vertex, and that order fixes both the attribute index a shader reads them from
//! (`layout(location = N)`) and their byte offset within the vertex.

use std::mem::size_of;

use gl::types::*;

/// One attribute: `count` scalars of GL type `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferElement {
    pub count: u32,
    pub kind: GLenum,
    pub normalized: bool,
}

impl VertexBufferElement {
    pub fn size_of_type(kind: GLenum) -> u32 {
        match kind {
            gl::FLOAT => size_of::<GLfloat>() as u32,
            gl::UNSIGNED_INT => size_of::<GLuint>() as u32,
            gl::UNSIGNED_BYTE => size_of::<GLubyte>() as u32,
            _ => 0,
        }
    }

    /// Bytes this attribute occupies in one vertex.
    pub fn size(&self) -> u32 {
        self.count * Self::size_of_type(self.kind)
    }
}

/// A scalar type that can make up a vertex attribute.
pub trait LayoutScalar {
    const KIND: GLenum;
    const NORMALIZED: bool;
}

impl LayoutScalar for f32 {
    const KIND: GLenum = gl::FLOAT;
    const NORMALIZED: bool = false;
}

impl LayoutScalar for u32 {
    const KIND: GLenum = gl::UNSIGNED_INT;
    const NORMALIZED: bool = false;
}

// Bytes are almost always colour channels, which shaders want in [0, 1]
impl LayoutScalar for u8 {
    const KIND: GLenum = gl::UNSIGNED_BYTE;
    const NORMALIZED: bool = true;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexBufferLayout {
    elements: Vec<VertexBufferElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new() -> Self { Self::default() }

    /// Appends an attribute of `count` scalars of type `T`.
    pub fn push<T: LayoutScalar>(&mut self, count: u32) -> &mut Self {
        let element = VertexBufferElement {
            count,
            kind: T::KIND,
            normalized: T::NORMALIZED,
        };

        self.stride += element.size();
        self.elements.push(element);
        self
    }

    /// Same as [`push`](Self::push), by value.
    pub fn with<T: LayoutScalar>(mut self, count: u32) -> Self {
        self.push::<T>(count);
        self
    }

    pub fn elements(&self) -> &[VertexBufferElement] { &self.elements }

    /// Bytes from the start of one vertex to the start of the next.
    pub fn stride(&self) -> u32 { self.stride }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_layout_has_no_stride() {
        let layout = VertexBufferLayout::new();

        assert_eq!(layout.stride(), 0);
        assert!(layout.elements().is_empty());
    }

    #[test]
    fn stride_is_sum_of_element_sizes() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(3).push::<f32>(2).push::<u8>(4).push::<u32>(1);

        let expected: u32 = layout.elements().iter().map(|e| e.size()).sum();
        assert_eq!(layout.stride(), expected);
        assert_eq!(layout.stride(), 12 + 8 + 4 + 4);
    }

    #[test]
    fn stride_tracks_every_push() {
        let mut layout = VertexBufferLayout::new();
        let mut expected = 0;

        for count in 1..=4 {
            layout.push::<f32>(count);
            expected += count * 4;
            assert_eq!(layout.stride(), expected);

            layout.push::<u8>(count);
            expected += count;
            assert_eq!(layout.stride(), expected);
        }
    }

    #[test]
    fn push_order_is_kept() {
        let layout = VertexBufferLayout::new().with::<f32>(2).with::<u8>(4);

        assert_eq!(
            layout.elements(),
            &[
                VertexBufferElement { count: 2, kind: gl::FLOAT, normalized: false },
                VertexBufferElement { count: 4, kind: gl::UNSIGNED_BYTE, normalized: true },
            ]
        );
    }
}
