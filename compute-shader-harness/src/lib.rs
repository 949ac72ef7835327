//! A small harness for compute shader experiments: GLSL compute programs
//! fill textures, a fullscreen quad shows one of them, and an egui panel
//! exposes the parameters.

use egui_winit::winit::event_loop::EventLoop;
use std::path::PathBuf;

pub use context::GraphicsContext;
pub use controller::{ControllerTrait, Display};
pub use error::HarnessError;
pub use program::{workgroup_count, ComputeProgram, ImageBinding};
pub use render_pass::{FULLSCREEN_VERT, PLANE_FRAG, VOLUME_FRAG};
pub use shader::{ShaderLoader, ShaderStage};
pub use texture::{Dimension, Texture, TextureSpec};
pub use uniform::{UniformBlock, UniformField, UniformLayout, UniformType};

pub use egui;
pub use egui_winit::winit;
pub use glam;
pub use wgpu;

mod app;
mod context;
mod controller;
mod error;
mod fps_counter;
mod program;
mod quad;
mod render_pass;
mod shader;
mod texture;
mod ui;
mod uniform;
mod user_event;

pub const TITLE: &str = "ComputeShaderTest";

#[derive(Clone, Debug)]
pub struct HarnessOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Directory shader paths are resolved against, display programs included.
    pub resource_dir: PathBuf,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            title: TITLE.to_owned(),
            width: 1024,
            height: 1024,
            vsync: true,
            resource_dir: PathBuf::from("res"),
        }
    }
}

pub fn run<C: ControllerTrait>(options: HarnessOptions, controller: C) -> Result<(), HarnessError> {
    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = app::App::new(event_loop.create_proxy(), options, controller);
    event_loop.run_app(&mut app)?;
    app.into_result()
}

/// Install `env_logger`, defaulting to `info` and keeping the GPU stack quiet
/// unless `RUST_LOG` already mentions it.
pub fn setup_logging() {
    let rust_log = logging_filter(std::env::var("RUST_LOG").ok());
    let _ = env_logger::Builder::new().parse_filters(&rust_log).try_init();
}

fn logging_filter(rust_log: Option<String>) -> String {
    let mut rust_log = rust_log.unwrap_or_else(|| "info".to_owned());
    for loud_crate in ["naga", "wgpu_core", "wgpu_hal"] {
        if !rust_log.contains(&format!("{loud_crate}=")) {
            rust_log += &format!(",{loud_crate}=warn");
        }
    }
    rust_log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_quietens_gpu_crates() {
        assert_eq!(
            logging_filter(None),
            "info,naga=warn,wgpu_core=warn,wgpu_hal=warn"
        );
    }

    #[test]
    fn explicit_crate_levels_are_kept() {
        assert_eq!(
            logging_filter(Some("debug,wgpu_core=trace".to_owned())),
            "debug,wgpu_core=trace,naga=warn,wgpu_hal=warn"
        );
    }

    #[test]
    fn default_window_matches_lut_size() {
        let options = HarnessOptions::default();
        assert_eq!((options.width, options.height), (1024, 1024));
        assert_eq!(options.title, TITLE);
        assert!(options.vsync);
    }
}
