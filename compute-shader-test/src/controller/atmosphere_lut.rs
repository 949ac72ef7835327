//! Point-light scattering lookup tables: Hoobler's accumulated/summed pair
//! and Kovalovs' single-channel table.

use compute_shader_harness::{
    egui,
    wgpu::{self, TextureFormat},
    workgroup_count, ComputeProgram, ControllerTrait, Display, GraphicsContext, HarnessError,
    ImageBinding, ShaderLoader, Texture, TextureSpec, UniformLayout,
};
use glam::{uvec3, vec3, UVec2, UVec3, Vec3};

const HOOBLER_ACCUM_LOCAL_SIZE: UVec3 = uvec3(16, 16, 1);
/// One invocation integrates a whole column of the accumulated table.
const HOOBLER_SUM_LOCAL_SIZE: UVec3 = uvec3(64, 1, 1);
const KOVALOVS_LOCAL_SIZE: UVec3 = uvec3(256, 1, 1);

#[derive(Clone, Debug, PartialEq)]
pub struct LutParameters {
    pub wavelengths: Vec3,
    pub scatter_strength: f32,
    pub tau: f32,
    pub g_param: f32,
    pub distance: f32,
    pub vec_length: f32,
    pub light_z_far: f32,
    pub wavelength_divisor: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for LutParameters {
    fn default() -> Self {
        Self {
            wavelengths: vec3(700.0, 530.0, 440.0),
            scatter_strength: 1.0,
            tau: 1.0,
            g_param: 0.4,
            distance: 10.0,
            vec_length: 25.0,
            light_z_far: 50.0,
            wavelength_divisor: Vec3::ONE,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl LutParameters {
    /// Rayleigh-style coefficients: strength * (divisor / wavelength)^4 per channel.
    pub fn scattering_coefficients(&self) -> Vec3 {
        self.scatter_strength * (self.wavelength_divisor / self.wavelengths).powf(4.0)
    }
}

/// Which table the fullscreen quad shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LutView {
    Kovalovs,
    HooblerAccumulated,
    HooblerSummed,
}

impl LutView {
    pub fn from_toggles(hoobler: bool, accumulated: bool) -> Self {
        match (hoobler, accumulated) {
            (false, _) => Self::Kovalovs,
            (true, true) => Self::HooblerAccumulated,
            (true, false) => Self::HooblerSummed,
        }
    }
}

pub fn hoobler_uniforms() -> UniformLayout {
    UniformLayout::builder()
        .vec3("u_scatteringCoefficients")
        .float("u_tau")
        .float("u_distance")
        .float("u_gParam")
        .float("u_vecLength")
        .float("u_lightZFar")
        .float("u_constant")
        .float("u_linear")
        .float("u_quadratic")
        .build()
}

pub fn kovalovs_uniforms() -> UniformLayout {
    UniformLayout::builder()
        .float("u_gParam")
        .float("u_constant")
        .float("u_linear")
        .float("u_quadratic")
        .build()
}

pub fn texture_specs(size: UVec2) -> [TextureSpec; 4] {
    [
        TextureSpec::plane("hoobler accum lut", size.x, size.y, TextureFormat::Rgba32Float),
        TextureSpec::plane("kovalovs lut", size.x, size.y, TextureFormat::R32Float),
        TextureSpec::plane("scatter accum", size.x, size.y, TextureFormat::Rgba32Float),
        TextureSpec::plane("hoobler summed lut", size.x, size.y, TextureFormat::Rgba32Float),
    ]
}

struct LutTextures {
    hoobler_accum: Texture,
    kovalovs: Texture,
    scatter_accum: Texture,
    hoobler_summed: Texture,
}

struct LutPrograms {
    hoobler_accum: ComputeProgram,
    hoobler_sum: ComputeProgram,
    kovalovs: ComputeProgram,
    textures: LutTextures,
}

impl LutPrograms {
    fn new(ctx: &GraphicsContext, shaders: &ShaderLoader, size: UVec2) -> Result<Self, HarnessError> {
        let [hoobler_accum, kovalovs, scatter_accum, hoobler_summed] =
            texture_specs(size).map(|spec| Texture::new(ctx, spec));
        let textures = LutTextures {
            hoobler_accum: hoobler_accum?,
            kovalovs: kovalovs?,
            scatter_accum: scatter_accum?,
            hoobler_summed: hoobler_summed?,
        };

        let mut hoobler_accum = ComputeProgram::new(
            ctx,
            shaders,
            "hoobler_accum_lut.comp",
            Some(hoobler_uniforms()),
            &[
                ImageBinding::write_2d(TextureFormat::Rgba32Float),
                ImageBinding::write_2d(TextureFormat::Rgba32Float),
            ],
        )?;
        hoobler_accum.bind(ctx, &[&textures.scatter_accum, &textures.hoobler_accum])?;

        let mut hoobler_sum = ComputeProgram::new(
            ctx,
            shaders,
            "hoobler_sum_lut.comp",
            None,
            &[
                ImageBinding::read_2d(),
                ImageBinding::write_2d(TextureFormat::Rgba32Float),
            ],
        )?;
        hoobler_sum.bind(ctx, &[&textures.hoobler_accum, &textures.hoobler_summed])?;

        let mut kovalovs = ComputeProgram::new(
            ctx,
            shaders,
            "kovalovs_lut.comp",
            Some(kovalovs_uniforms()),
            &[ImageBinding::write_2d(TextureFormat::R32Float)],
        )?;
        kovalovs.bind(ctx, &[&textures.kovalovs])?;

        Ok(Self {
            hoobler_accum,
            hoobler_sum,
            kovalovs,
            textures,
        })
    }
}

pub struct AtmosphereLut {
    size: UVec2,
    params: LutParameters,
    show_hoobler: bool,
    show_accumulated: bool,
    programs: Option<LutPrograms>,
}

impl AtmosphereLut {
    pub fn new(size: UVec2) -> Self {
        Self {
            size,
            params: LutParameters::default(),
            show_hoobler: false,
            show_accumulated: false,
            programs: None,
        }
    }

    pub fn view(&self) -> LutView {
        LutView::from_toggles(self.show_hoobler, self.show_accumulated)
    }
}

impl ControllerTrait for AtmosphereLut {
    fn setup(&mut self, ctx: &GraphicsContext, shaders: &ShaderLoader) -> Result<(), HarnessError> {
        self.programs = Some(LutPrograms::new(ctx, shaders, self.size)?);
        Ok(())
    }

    fn compute(&mut self, ctx: &GraphicsContext, encoder: &mut wgpu::CommandEncoder) {
        let Some(programs) = &mut self.programs else {
            return;
        };
        let params = &self.params;
        let extent = self.size.extend(1);

        encoder.push_debug_group("Hoobler LUT pass");
        if let Some(uniforms) = programs.hoobler_accum.uniforms_mut() {
            uniforms.set_vec3("u_scatteringCoefficients", params.scattering_coefficients());
            uniforms.set_float("u_tau", params.tau);
            uniforms.set_float("u_distance", params.distance);
            uniforms.set_float("u_gParam", params.g_param);
            uniforms.set_float("u_vecLength", params.vec_length);
            uniforms.set_float("u_lightZFar", params.light_z_far);
            uniforms.set_float("u_constant", params.constant);
            uniforms.set_float("u_linear", params.linear);
            uniforms.set_float("u_quadratic", params.quadratic);
        }
        programs.hoobler_accum.dispatch(
            ctx,
            encoder,
            workgroup_count(extent, HOOBLER_ACCUM_LOCAL_SIZE),
        );
        programs.hoobler_sum.dispatch(
            ctx,
            encoder,
            workgroup_count(self.size.with_y(1).extend(1), HOOBLER_SUM_LOCAL_SIZE),
        );
        encoder.pop_debug_group();

        encoder.push_debug_group("Kovalovs LUT pass");
        if let Some(uniforms) = programs.kovalovs.uniforms_mut() {
            uniforms.set_float("u_gParam", params.g_param);
            uniforms.set_float("u_constant", params.constant);
            uniforms.set_float("u_linear", params.linear);
            uniforms.set_float("u_quadratic", params.quadratic);
        }
        programs
            .kovalovs
            .dispatch(ctx, encoder, workgroup_count(extent, KOVALOVS_LOCAL_SIZE));
        encoder.pop_debug_group();
    }

    fn display(&self) -> Option<Display<'_>> {
        let textures = &self.programs.as_ref()?.textures;
        Some(Display::Plane(match self.view() {
            LutView::Kovalovs => &textures.kovalovs,
            LutView::HooblerAccumulated => &textures.hoobler_accum,
            LutView::HooblerSummed => &textures.hoobler_summed,
        }))
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.checkbox(&mut self.show_hoobler, "Kovalovs or Hoobler");
        if self.show_hoobler {
            ui.checkbox(&mut self.show_accumulated, "Accumulated or summed?");
        }

        let params = &mut self.params;
        ui.add_space(8.0);
        ui.label("Calculation variables:");
        drag_vec3(ui, "Wavelengths", &mut params.wavelengths, 0.5, 1.0..=700.0);
        ui.add(egui::Slider::new(&mut params.scatter_strength, 0.0..=50.0).text("Scattering strength"));
        ui.add(egui::Slider::new(&mut params.g_param, -0.999..=0.999).text("G parameter (phase)"));

        ui.label("Hoobler data:");
        ui.add(egui::Slider::new(&mut params.vec_length, 0.0..=50.0).text("vecLength"));
        ui.add(egui::Slider::new(&mut params.light_z_far, 0.0..=50.0).text("lightZFar"));
        drag_vec3(ui, "Wavelength divisors", &mut params.wavelength_divisor, 1.0, 1.0..=400.0);

        ui.label("Light data:");
        ui.add(egui::Slider::new(&mut params.constant, 0.0..=1.0).text("Light constant"));
        ui.add(egui::Slider::new(&mut params.linear, 0.0..=0.5).text("Light linear"));
        ui.add(egui::Slider::new(&mut params.quadratic, 0.0..=0.1).text("Light quadratic"));
    }
}

fn drag_vec3(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut Vec3,
    speed: f32,
    range: std::ops::RangeInclusive<f32>,
) {
    ui.horizontal(|ui| {
        for component in [&mut value.x, &mut value.y, &mut value.z] {
            ui.add(
                egui::DragValue::new(component)
                    .speed(speed)
                    .range(range.clone()),
            );
        }
        ui.label(label);
    });
}
