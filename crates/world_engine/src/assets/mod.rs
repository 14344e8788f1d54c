//! Asset loading
//!
//! Decodes images and glTF models into the plain data the scene graph
//! uploads. Nothing in here touches the GPU.

pub mod gltf_loader;
pub mod image_loader;

pub use gltf_loader::{load_model, ModelData, ModelMesh, ModelNode};
pub use image_loader::{FileImageLoader, ImageData, ImageLoader};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error while reading an asset
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be decoded
    #[error("Failed to decode image {path}: {reason}")]
    Decode {
        /// Source of the image
        path: String,
        /// Decoder message
        reason: String,
    },

    /// glTF document could not be imported
    #[error("glTF error: {0}")]
    Gltf(String),

    /// Pixel layout with no matching Vulkan format
    #[error("Unsupported image: {components} components, {bits} bits")]
    UnsupportedImage {
        /// Channels per pixel
        components: u8,
        /// Bits per channel
        bits: u8,
    },

    /// Index component type other than u8/u16/u32
    #[error("Unsupported index type in {0}")]
    UnsupportedIndexType(String),

    /// Model file extension is not `.gltf` or `.glb`
    #[error("Unsupported model type for {0}")]
    UnsupportedModel(String),

    /// Primitive without a POSITION attribute
    #[error("Primitive without positions in {0}")]
    MissingPositions(String),

    /// Index that points past the primitive's vertices
    #[error("Index {index} out of range for {vertex_count} vertices in {source_name}")]
    IndexOutOfRange {
        /// Model the primitive came from
        source_name: String,
        /// Offending index
        index: u32,
        /// Vertices in the primitive
        vertex_count: usize,
    },
}

impl From<gltf::Error> for AssetError {
    fn from(error: gltf::Error) -> Self {
        match error {
            gltf::Error::Io(e) => Self::Io(e),
            other => Self::Gltf(other.to_string()),
        }
    }
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;
