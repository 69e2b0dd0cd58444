//! Error types for chaos-tree.
//!
//! Nothing in the animation core can fail: distribution functions, progress
//! controllers and per-frame transforms are total. Errors only come from the
//! edges of the system: GPU setup, photo decoding and configuration files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system supports WebGPU/Vulkan/Metal/DX12")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur while loading a photo ornament.
///
/// A photo error never aborts the scene: the card for that image is simply
/// not rendered.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Failed to decode the image.
    #[error("failed to decode photo '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The decoded image has no pixels.
    #[error("photo '{0}' is empty")]
    Empty(PathBuf),
}

/// Errors raised by the configuration layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse the configuration JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A color string was not a `#rrggbb` hex color.
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
    /// An ornament field was configured with an empty palette.
    #[error("ornament field '{0}' has an empty color palette")]
    EmptyPalette(String),
    /// A scale range with min > max or a non-positive bound.
    #[error("ornament field '{name}' has invalid scale range [{min}, {max}]")]
    InvalidScaleRange { name: String, min: f32, max: f32 },
    /// Ornament weight that would stop the field from converging.
    #[error("ornament field '{name}': weight must be positive and finite, got {weight}")]
    InvalidWeight { name: String, weight: f32 },
    /// Tree geometry with non-positive dimensions.
    #[error("tree geometry must have positive radius and height")]
    InvalidGeometry,
}

/// Errors that can occur when running the viewer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Scene configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
