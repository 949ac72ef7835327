use crate::shader::ShaderStage;
use glam::UVec3;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("shader file not successfully read ({path}): {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot infer shader stage from {0} (expected .vert, .frag or .comp)")]
    UnknownStage(PathBuf),

    #[error("{path} is a {actual} shader, expected {expected}")]
    StageMismatch {
        path: PathBuf,
        expected: ShaderStage,
        actual: ShaderStage,
    },

    #[error("{stage} shader compilation error ({path}):\n{log}")]
    Compile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },

    #[error("texture {label} of size {size} is outside the device range 1..={max}")]
    TextureSize { label: String, size: UVec3, max: UVec3 },

    #[error("failed to create texture {label}:\n{log}")]
    TextureCreate { label: String, log: String },

    #[error("program {program} expects {expected} textures, got {actual}")]
    Binding {
        program: String,
        expected: usize,
        actual: usize,
    },

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create window: {0}")]
    Window(#[from] egui_winit::winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("missing formats/present modes in surface capabilities: {0}")]
    SurfaceConfig(String),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] egui_winit::winit::error::EventLoopError),
}
