use std::io;
use std::path::PathBuf;

use crate::shader::ShaderStage;

pub type Result<T> = std::result::Result<T, GraphicsError>;

/// Failures that can occur while setting up GPU resources.
#[derive(thiserror::Error, Debug)]
pub enum GraphicsError {
    #[error("could not read shader source {}: {source}", .path.display())]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compile {stage} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("failed to link shader program:\n{log}")]
    Link { log: String },

    #[error("could not load texture {}: {source}", .path.display())]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("expected {expected} bytes of RGBA pixel data for a {width}x{height} texture, got {actual}")]
    TextureData {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("the driver did not return a name for a new {0}")]
    ResourceCreation(&'static str),
}
