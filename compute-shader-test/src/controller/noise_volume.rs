use compute_shader_harness::{
    egui,
    wgpu::{self, TextureFormat},
    workgroup_count, ComputeProgram, ControllerTrait, Display, GraphicsContext, HarnessError,
    ImageBinding, ShaderLoader, Texture, TextureSpec, UniformLayout,
};
use glam::{uvec3, vec3, UVec3, Vec3};

const LOCAL_SIZE: UVec3 = uvec3(8, 8, 4);

/// Slices per second while auto-scrolling, as a fraction of the depth.
const SCROLL_RATE: f32 = 0.1;

pub fn uniforms() -> UniformLayout {
    UniformLayout::builder()
        .float("u_frequency")
        .int("u_octaves")
        .float("u_persistence")
        .float("u_time")
        .vec3("u_offset")
        .build()
}

/// Maps a seed to a domain offset so different seeds sample unrelated
/// regions of the same noise field.
pub fn seed_offset(seed: u32) -> Vec3 {
    let hash = |mut x: u32| {
        x ^= x >> 16;
        x = x.wrapping_mul(0x7feb_352d);
        x ^= x >> 15;
        x = x.wrapping_mul(0x846c_a68b);
        x ^= x >> 16;
        x
    };
    let a = hash(seed);
    let b = hash(a);
    let c = hash(b);
    // Stay well inside the mod-289 period of the permutation polynomial.
    vec3(a as f32, b as f32, c as f32) / u32::MAX as f32 * 256.0
}

/// Advance `slice` by `rate * dt`, wrapping back into `0.0..1.0`.
pub fn scroll_slice(slice: f32, rate: f32, dt: f32) -> f32 {
    (slice + rate * dt).rem_euclid(1.0)
}

struct NoiseProgram {
    program: ComputeProgram,
    volume: Texture,
}

pub struct NoiseVolume {
    size: UVec3,
    frequency: f32,
    octaves: i32,
    persistence: f32,
    time_offset: f32,
    speed: f32,
    seed: u32,
    elapsed: f32,
    slice: f32,
    auto_scroll: bool,
    program: Option<NoiseProgram>,
}

impl NoiseVolume {
    pub fn new(size: UVec3) -> Self {
        Self {
            size,
            frequency: 4.0,
            octaves: 4,
            persistence: 0.5,
            time_offset: 0.0,
            speed: 0.2,
            seed: 0,
            elapsed: 0.0,
            slice: 0.5,
            auto_scroll: false,
            program: None,
        }
    }

    fn time(&self) -> f32 {
        self.time_offset + self.elapsed * self.speed
    }
}

impl ControllerTrait for NoiseVolume {
    fn setup(&mut self, ctx: &GraphicsContext, shaders: &ShaderLoader) -> Result<(), HarnessError> {
        let volume = Texture::new(
            ctx,
            TextureSpec::volume("noise volume", self.size, TextureFormat::Rgba8Unorm),
        )?;
        let mut program = ComputeProgram::new(
            ctx,
            shaders,
            "noise.comp",
            Some(uniforms()),
            &[ImageBinding::write_3d(TextureFormat::Rgba8Unorm)],
        )?;
        program.bind(ctx, &[&volume])?;
        self.program = Some(NoiseProgram { program, volume });
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        if self.auto_scroll {
            self.slice = scroll_slice(self.slice, SCROLL_RATE, dt);
        }
    }

    fn compute(&mut self, ctx: &GraphicsContext, encoder: &mut wgpu::CommandEncoder) {
        let time = self.time();
        let Some(NoiseProgram { program, .. }) = &mut self.program else {
            return;
        };
        if let Some(uniforms) = program.uniforms_mut() {
            uniforms.set_float("u_frequency", self.frequency);
            uniforms.set_int("u_octaves", self.octaves);
            uniforms.set_float("u_persistence", self.persistence);
            uniforms.set_float("u_time", time);
            uniforms.set_vec3("u_offset", seed_offset(self.seed));
        }
        program.dispatch(ctx, encoder, workgroup_count(self.size, LOCAL_SIZE));
    }

    fn display(&self) -> Option<Display<'_>> {
        Some(Display::Volume {
            texture: &self.program.as_ref()?.volume,
            slice: self.slice,
        })
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.add(egui::Slider::new(&mut self.frequency, 0.1..=32.0).logarithmic(true).text("Frequency"));
        ui.add(egui::Slider::new(&mut self.octaves, 1..=8).text("Octaves"));
        ui.add(egui::Slider::new(&mut self.persistence, 0.0..=1.0).text("Persistence"));
        ui.add(egui::Slider::new(&mut self.time_offset, 0.0..=100.0).text("Time offset"));
        ui.add(egui::Slider::new(&mut self.speed, 0.0..=2.0).text("Animation speed"));
        ui.add(egui::DragValue::new(&mut self.seed).prefix("Seed "));
        ui.separator();
        ui.add(
            egui::Slider::new(&mut self.slice, 0.0..=1.0)
                .text(format!("Slice (of {})", self.size.z)),
        );
        ui.checkbox(&mut self.auto_scroll, "Auto-scroll slices");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_layout() {
        let layout = uniforms();
        let offsets: Vec<usize> = layout.fields().iter().map(|field| field.offset).collect();
        assert_eq!(offsets, [0, 4, 8, 12, 16]);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn seed_offset_is_deterministic_and_bounded() {
        assert_eq!(seed_offset(7), seed_offset(7));
        assert_ne!(seed_offset(7), seed_offset(8));
        for seed in [0, 1, 42, u32::MAX] {
            let offset = seed_offset(seed);
            assert!(offset.cmpge(Vec3::ZERO).all() && offset.cmple(Vec3::splat(256.0)).all());
        }
    }

    #[test]
    fn slice_wraps() {
        assert!((scroll_slice(0.95, 0.1, 1.0) - 0.05).abs() < 1e-5);
        assert_eq!(scroll_slice(0.25, 0.1, 0.0), 0.25);
    }

    #[test]
    fn auto_scroll_only_when_enabled() {
        let mut volume = NoiseVolume::new(uvec3(256, 256, 50));
        volume.update(1.0);
        assert_eq!(volume.slice, 0.5);
        volume.auto_scroll = true;
        volume.update(1.0);
        assert!((volume.slice - 0.6).abs() < 1e-5);
    }

    #[test]
    fn time_combines_offset_and_speed() {
        let mut volume = NoiseVolume::new(uvec3(256, 256, 50));
        volume.time_offset = 3.0;
        volume.speed = 0.5;
        volume.update(4.0);
        assert_eq!(volume.time(), 5.0);
    }

    #[test]
    fn dispatch_covers_the_volume() {
        assert_eq!(
            workgroup_count(uvec3(256, 256, 50), LOCAL_SIZE),
            uvec3(32, 32, 13)
        );
    }
}
