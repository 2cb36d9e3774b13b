use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or parsing a skinned asset
#[derive(Error, Debug)]
pub enum LoadError {
    /// The asset file could not be read
    #[error("I/O error reading '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The glTF container or its buffers could not be decoded
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// The source string names something this loader cannot fetch
    #[error("Unsupported asset source: {0}")]
    UnsupportedSource(String),

    /// The document decoded but its contents are inconsistent
    #[error("Malformed asset: {0}")]
    Malformed(String),

    /// The asset carries no animation clips
    #[error("Asset '{0}' declares no animation clips")]
    NoClips(String),
}

/// Error types for the animated model controller
#[derive(Error, Debug)]
pub enum ModelError {
    /// Loading the asset failed
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// A clip index outside the clip table was cued
    #[error("Clip index {index} out of range (model has {count} clips)")]
    ClipIndexOutOfRange { index: usize, count: usize },

    /// The model has no asset yet
    #[error("Model is not loaded")]
    NotLoaded,

    /// A load is in flight and has not resolved
    #[error("Model is still loading")]
    StillLoading,

    /// `load` was called on a model that already holds an asset
    #[error("Model is already loaded")]
    AlreadyLoaded,

    /// A time step or blend duration was negative or not finite
    #[error("Invalid duration: {0}")]
    InvalidDuration(f32),
}

/// Result type using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
