use crate::{texture::Texture, GraphicsContext, HarnessError, ShaderLoader};
use egui_winit::winit::event::KeyEvent;

/// What the fullscreen quad shows this frame.
pub enum Display<'a> {
    Plane(&'a Texture),
    /// One depth slice of a volume, `slice` in `0.0..=1.0`.
    Volume { texture: &'a Texture, slice: f32 },
}

pub trait ControllerTrait: 'static {
    /// Create programs and textures. Called again when shaders are reloaded;
    /// on error the previous resources must stay usable.
    fn setup(&mut self, ctx: &GraphicsContext, shaders: &ShaderLoader) -> Result<(), HarnessError>;

    fn keyboard_input(&mut self, _key: KeyEvent) {}

    fn update(&mut self, _dt: f32) {}

    /// Record this frame's dispatches.
    fn compute(&mut self, ctx: &GraphicsContext, encoder: &mut wgpu::CommandEncoder);

    fn display(&self) -> Option<Display<'_>>;

    fn ui(&mut self, _ui: &mut egui::Ui) {}
}
