//! "Texture" is the OpenGL term for an image passed to the graphics pipeline. In the fragment
//! shader a texture can be sampled and its pixel data applied to the fragments being drawn.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use gl::types::*;
use image::RgbaImage;
use log::info;

use crate::api::GlApi;
use crate::context::{Context, Slot};
use crate::error::{GraphicsError, Result};

/// Decodes the image at `path` into RGBA8 rows ordered bottom to top, which is how OpenGL expects
/// texture rows to arrive.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| GraphicsError::TextureLoad {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(image.flipv().into_rgba8())
}

/// A 2D texture with linear filtering that clamps at its edges.
pub struct Texture<A: GlApi> {
    ctx: Rc<Context<A>>,
    id: GLuint,
    path: Option<PathBuf>,
    width: u32,
    height: u32,
}

impl<A: GlApi> Texture<A> {
    pub fn from_file<P: AsRef<Path>>(ctx: &Rc<Context<A>>, path: P) -> Result<Self> {
        let path = path.as_ref();
        let pixels = decode(path)?;
        let (width, height) = pixels.dimensions();

        let mut texture = Self::from_rgba(ctx, width, height, pixels.as_raw())?;
        // The decoded copy goes away here, once the driver has its own
        drop(pixels);
        texture.path = Some(path.to_path_buf());
        info!("loaded {}x{} texture {} from {}", width, height, texture.id, path.display());

        Ok(texture)
    }

    /// Uploads tightly packed RGBA8 pixels, first row at the bottom.
    pub fn from_rgba(ctx: &Rc<Context<A>>, width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(GraphicsError::TextureData { width, height, expected, actual: pixels.len() });
        }

        let id = gl_call!(ctx, gl => gl.gen_texture());
        if id == 0 {
            return Err(GraphicsError::ResourceCreation("texture"));
        }

        let texture = Self { ctx: Rc::clone(ctx), id, path: None, width, height };
        let slot = Slot::Texture2D(ctx.active_texture_unit());

        ctx.bind(slot, id);
        gl_call!(ctx, gl => gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint));
        gl_call!(ctx, gl => gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint));
        gl_call!(ctx, gl => gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint));
        gl_call!(ctx, gl => gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint));
        gl_call!(ctx, gl => gl.tex_image_2d_rgba(width as GLsizei, height as GLsizei, pixels));
        ctx.bind(slot, 0);

        Ok(texture)
    }

    pub fn id(&self) -> GLuint { self.id }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    /// Binds this texture to texture unit `slot`, which also becomes the active unit.
    pub fn bind(&self, slot: u32) {
        self.ctx.bind(Slot::Texture2D(slot), self.id);
    }

    /// Empties the 2D texture binding of the active unit.
    pub fn unbind(&self) {
        self.ctx.bind(Slot::Texture2D(self.ctx.active_texture_unit()), 0);
    }
}

impl<A: GlApi> Drop for Texture<A> {
    fn drop(&mut self) {
        let id = self.id;
        gl_call!(self.ctx, gl => gl.delete_texture(id));
        self.ctx.release(id, |slot| matches!(slot, Slot::Texture2D(_)));
    }
}

#[cfg(test)]
mod test {
    use std::env;
    use std::fs;
    use std::process;

    use image::Rgba;

    use super::*;
    use crate::context::ErrorPolicy;
    use crate::mock::{Call, MockGl};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn context() -> Rc<Context<MockGl>> {
        Rc::new(Context::new(MockGl::new()).with_error_policy(ErrorPolicy::Log))
    }

    /// Writes a 1x2 PNG, red on top and blue underneath.
    fn two_row_png(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("glsandbox-{}-{}.png", process::id(), name));
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, RED);
        image.put_pixel(0, 1, BLUE);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn decoded_rows_are_flipped() {
        let path = two_row_png("flip");

        let pixels = decode(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(pixels.dimensions(), (1, 2));
        assert_eq!(*pixels.get_pixel(0, 0), BLUE);
        assert_eq!(*pixels.get_pixel(0, 1), RED);
    }

    #[test]
    fn missing_image_is_an_error() {
        let result = decode("does/not/exist.png");

        assert!(matches!(result, Err(GraphicsError::TextureLoad { .. })));
    }

    #[test]
    fn uploads_with_linear_filtering_and_edge_clamping() {
        let ctx = context();

        let texture = Texture::from_rgba(&ctx, 2, 1, &[0; 8]).unwrap();

        let id = texture.id();
        let linear = gl::LINEAR as GLint;
        let clamp = gl::CLAMP_TO_EDGE as GLint;
        assert_eq!(
            ctx.gl().calls(),
            vec![
                Call::GenTexture(id),
                Call::ActiveTexture(gl::TEXTURE0),
                Call::BindTexture(gl::TEXTURE_2D, id),
                Call::TexParameter(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, linear),
                Call::TexParameter(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, linear),
                Call::TexParameter(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, clamp),
                Call::TexParameter(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, clamp),
                Call::TexImage2D { width: 2, height: 1, len: 8 },
                Call::ActiveTexture(gl::TEXTURE0),
                Call::BindTexture(gl::TEXTURE_2D, 0),
            ]
        );
    }

    #[test]
    fn loads_from_file() {
        let path = two_row_png("load");
        let ctx = context();

        let texture = Texture::from_file(&ctx, &path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!((texture.width(), texture.height()), (1, 2));
        assert_eq!(texture.path(), Some(path.as_path()));
        assert_eq!(ctx.gl().count(|c| *c == Call::TexImage2D { width: 1, height: 2, len: 8 }), 1);
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        let ctx = context();

        let result = Texture::from_rgba(&ctx, 2, 2, &[0; 12]);

        assert!(matches!(
            result,
            Err(GraphicsError::TextureData { expected: 16, actual: 12, .. })
        ));
        assert!(ctx.gl().calls().is_empty());
    }

    #[test]
    fn binds_to_the_requested_unit() {
        let ctx = context();
        let texture = Texture::from_rgba(&ctx, 1, 1, &[0; 4]).unwrap();

        texture.bind(3);

        assert_eq!(ctx.active_texture_unit(), 3);
        assert_eq!(ctx.bound(Slot::Texture2D(3)), texture.id());
        assert_eq!(ctx.bound(Slot::Texture2D(0)), 0);

        texture.unbind();
        assert_eq!(ctx.bound(Slot::Texture2D(3)), 0);
    }

    #[test]
    fn dropping_clears_every_unit_holding_it() {
        let ctx = context();
        let texture = Texture::from_rgba(&ctx, 1, 1, &[0; 4]).unwrap();
        let id = texture.id();
        texture.bind(0);
        texture.bind(1);

        drop(texture);

        assert_eq!(ctx.bound(Slot::Texture2D(0)), 0);
        assert_eq!(ctx.bound(Slot::Texture2D(1)), 0);
        assert_eq!(ctx.gl().count(|c| *c == Call::DeleteTexture(id)), 1);
    }
}
