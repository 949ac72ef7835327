use super::camera::Camera;
use compute_shader_harness::{
    egui,
    wgpu::{self, TextureFormat},
    winit::event::KeyEvent,
    workgroup_count, ComputeProgram, ControllerTrait, Display, GraphicsContext, HarnessError,
    ImageBinding, ShaderLoader, Texture, TextureSpec, UniformLayout,
};
use glam::{uvec3, vec3, UVec2, UVec3, Vec3};
use web_time::Instant;

const LOCAL_SIZE: UVec3 = uvec3(16, 16, 1);

pub fn uniforms() -> UniformLayout {
    UniformLayout::builder()
        .vec3("u_cameraPosition")
        .float("u_time")
        .vec3("u_cameraTarget")
        .float("u_sphereRadius")
        .vec3("u_lightDirection")
        .int("u_maxSteps")
        .vec2("u_resolution")
        .build()
}

struct RaymarchProgram {
    program: ComputeProgram,
    output: Texture,
}

pub struct Raymarch {
    size: UVec2,
    start: Instant,
    camera: Camera,
    light_direction: Vec3,
    sphere_radius: f32,
    max_steps: i32,
    program: Option<RaymarchProgram>,
}

impl Raymarch {
    pub fn new(size: UVec2) -> Self {
        Self {
            size,
            start: Instant::now(),
            camera: Camera::default(),
            light_direction: vec3(-0.5, 1.0, -0.3),
            sphere_radius: 1.0,
            max_steps: 128,
            program: None,
        }
    }
}

impl ControllerTrait for Raymarch {
    fn setup(&mut self, ctx: &GraphicsContext, shaders: &ShaderLoader) -> Result<(), HarnessError> {
        let output = Texture::new(
            ctx,
            TextureSpec::plane("raymarch output", self.size.x, self.size.y, TextureFormat::Rgba8Unorm),
        )?;
        let mut program = ComputeProgram::new(
            ctx,
            shaders,
            "raymarch.comp",
            Some(uniforms()),
            &[ImageBinding::write_2d(TextureFormat::Rgba8Unorm)],
        )?;
        program.bind(ctx, &[&output])?;
        self.program = Some(RaymarchProgram { program, output });
        Ok(())
    }

    fn keyboard_input(&mut self, key: KeyEvent) {
        self.camera.keyboard_input(&key);
    }

    fn update(&mut self, dt: f32) {
        self.camera.update(dt);
    }

    fn compute(&mut self, ctx: &GraphicsContext, encoder: &mut wgpu::CommandEncoder) {
        let Some(RaymarchProgram { program, .. }) = &mut self.program else {
            return;
        };
        if let Some(uniforms) = program.uniforms_mut() {
            uniforms.set_vec3("u_cameraPosition", self.camera.position);
            uniforms.set_float("u_time", self.start.elapsed().as_secs_f32());
            uniforms.set_vec3("u_cameraTarget", self.camera.target);
            uniforms.set_float("u_sphereRadius", self.sphere_radius);
            uniforms.set_vec3("u_lightDirection", self.light_direction.normalize_or(Vec3::Y));
            uniforms.set_int("u_maxSteps", self.max_steps);
            uniforms.set_vec2("u_resolution", self.size.as_vec2());
        }
        program.dispatch(ctx, encoder, workgroup_count(self.size.extend(1), LOCAL_SIZE));
    }

    fn display(&self) -> Option<Display<'_>> {
        Some(Display::Plane(&self.program.as_ref()?.output))
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.label("WASD / QE to move the camera");
        ui.add(egui::Slider::new(&mut self.sphere_radius, 0.1..=3.0).text("Sphere radius"));
        ui.add(egui::Slider::new(&mut self.max_steps, 8..=512).text("Max steps"));
        ui.horizontal(|ui| {
            for component in [
                &mut self.light_direction.x,
                &mut self.light_direction.y,
                &mut self.light_direction.z,
            ] {
                ui.add(egui::DragValue::new(component).speed(0.01).range(-1.0..=1.0));
            }
            ui.label("Light direction");
        });
        ui.label(format!(
            "Camera {:.2} -> {:.2}",
            self.camera.position, self.camera.target
        ));
    }
}
