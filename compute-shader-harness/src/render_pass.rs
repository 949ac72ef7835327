use crate::{
    controller::{ControllerTrait, Display},
    quad::{FullscreenQuad, QuadVertex},
    shader::{ShaderLoader, ShaderStage},
    texture::{self, Dimension, Texture},
    ui::{Ui, UiState},
    uniform::{UniformBlock, UniformLayout},
    user_event::UserEvent,
    GraphicsContext, HarnessError,
};
use egui::epaint::{textures::TexturesDelta, ClippedPrimitive};
use egui_winit::winit::{event_loop::EventLoopProxy, window::Window};
use wgpu::util::DeviceExt;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.5,
    b: 0.0,
    a: 1.0,
};

/// Display programs, resolved against the resource directory.
pub const FULLSCREEN_VERT: &str = "fullscreen.vert";
pub const PLANE_FRAG: &str = "plane.frag";
pub const VOLUME_FRAG: &str = "volume.frag";

fn display_uniforms() -> UniformLayout {
    UniformLayout::builder()
        .float("u_exposure")
        .float("u_slice")
        .build()
}

struct DisplayPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl DisplayPipeline {
    fn new(
        ctx: &GraphicsContext,
        shaders: &ShaderLoader,
        vertex: &wgpu::ShaderModule,
        label: &str,
        dimension: Dimension,
        filterable: bool,
    ) -> Result<Self, HarnessError> {
        let fragment = shaders.load(&ctx.device, label, ShaderStage::Fragment)?;
        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable },
                            view_dimension: dimension.view(),
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(if filterable {
                            wgpu::SamplerBindingType::Filtering
                        } else {
                            wgpu::SamplerBindingType::NonFiltering
                        }),
                        count: None,
                    },
                ],
            });
        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some("main"),
                    buffers: &[QuadVertex::layout()],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.config.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview: None,
                cache: None,
            });
        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }
}

/// Plane and volume pipelines sharing the fullscreen vertex stage.
struct DisplayPrograms {
    plane: DisplayPipeline,
    volume: DisplayPipeline,
}

impl DisplayPrograms {
    fn new(ctx: &GraphicsContext, shaders: &ShaderLoader) -> Result<Self, HarnessError> {
        let filterable = ctx.float32_filterable();
        let vertex = shaders.load(&ctx.device, FULLSCREEN_VERT, ShaderStage::Vertex)?;
        let plane =
            DisplayPipeline::new(ctx, shaders, &vertex, PLANE_FRAG, Dimension::D2, filterable)?;
        let volume =
            DisplayPipeline::new(ctx, shaders, &vertex, VOLUME_FRAG, Dimension::D3, filterable)?;
        log::info!(
            "vertex and fragment shader program compilation complete ({})",
            shaders.resolve(FULLSCREEN_VERT).display()
        );
        Ok(Self { plane, volume })
    }

    fn pipeline(&self, dimension: Dimension) -> &DisplayPipeline {
        match dimension {
            Dimension::D2 => &self.plane,
            Dimension::D3 => &self.volume,
        }
    }
}

pub struct RenderPass {
    display: DisplayPrograms,
    quad: FullscreenQuad,
    sampler: wgpu::Sampler,
    display_uniforms: UniformBlock,
    display_buffer: wgpu::Buffer,
    ui_renderer: egui_wgpu::Renderer,
}

impl RenderPass {
    pub fn new(ctx: &GraphicsContext, shaders: &ShaderLoader) -> Result<Self, HarnessError> {
        let filterable = ctx.float32_filterable();
        let display = DisplayPrograms::new(ctx, shaders)?;

        let display_uniforms = UniformBlock::new(display_uniforms());
        let display_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("display uniforms"),
                contents: display_uniforms.bytes(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let ui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1, false);

        Ok(Self {
            display,
            quad: FullscreenQuad::new(&ctx.device),
            sampler: texture::create_sampler(ctx, "display sampler", filterable),
            display_uniforms,
            display_buffer,
            ui_renderer,
        })
    }

    /// Rebuild the display pipelines from source. On error the current
    /// pipelines stay in use.
    pub fn reload(&mut self, ctx: &GraphicsContext, shaders: &ShaderLoader) -> Result<(), HarnessError> {
        self.display = DisplayPrograms::new(ctx, shaders)?;
        Ok(())
    }

    pub fn render<C: ControllerTrait>(
        &mut self,
        ctx: &GraphicsContext,
        window: &Window,
        ui: &mut Ui,
        ui_state: &mut UiState,
        controller: &mut C,
        event_proxy: &EventLoopProxy<UserEvent>,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = match ctx.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(err) => {
                log::warn!("get_current_texture error: {err:?}");
                return match err {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        ctx.surface.configure(&ctx.device, &ctx.config);
                        Ok(())
                    }
                    _ => Err(err),
                };
            }
        };
        let output_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (clipped_primitives, textures_delta, pixels_per_point) =
            ui.prepare(window, ui_state, controller, event_proxy);

        self.render_scene(ctx, &output_view, controller, ui_state.exposure);
        self.render_ui(
            ctx,
            &output_view,
            clipped_primitives,
            textures_delta,
            pixels_per_point,
        );

        output.present();

        Ok(())
    }

    fn render_scene<C: ControllerTrait>(
        &mut self,
        ctx: &GraphicsContext,
        output_view: &wgpu::TextureView,
        controller: &mut C,
        exposure: f32,
    ) {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });
        encoder.push_debug_group("Rendering");
        controller.compute(ctx, &mut encoder);

        let display = controller.display().map(|display| match display {
            Display::Plane(texture) => (Dimension::D2, texture, 0.0),
            Display::Volume { texture, slice } => (Dimension::D3, texture, slice),
        });
        let slice = display.as_ref().map_or(0.0, |(_, _, slice)| *slice);
        self.display_uniforms.set_float("u_exposure", exposure);
        self.display_uniforms.set_float("u_slice", slice.clamp(0.0, 1.0));
        ctx.queue
            .write_buffer(&self.display_buffer, 0, self.display_uniforms.bytes());
        let bind_group = display.map(|(dimension, texture, _)| {
            let pipeline = self.display.pipeline(dimension);
            (pipeline, self.display_bind_group(ctx, pipeline, texture))
        });

        encoder.push_debug_group("Fullscreen quad pass");
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fullscreen Quad Pass"),
                occlusion_query_set: None,
                timestamp_writes: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
            });
            if let Some((pipeline, bind_group)) = &bind_group {
                rpass.set_pipeline(&pipeline.pipeline);
                rpass.set_bind_group(0, bind_group, &[]);
                self.quad.draw(&mut rpass);
            }
        }
        encoder.pop_debug_group();
        encoder.pop_debug_group();

        ctx.queue.submit(Some(encoder.finish()));
    }

    fn display_bind_group(
        &self,
        ctx: &GraphicsContext,
        pipeline: &DisplayPipeline,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(texture.spec().label),
            layout: &pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.display_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn render_ui(
        &mut self,
        ctx: &GraphicsContext,
        output_view: &wgpu::TextureView,
        clipped_primitives: Vec<ClippedPrimitive>,
        textures_delta: TexturesDelta,
        pixels_per_point: f32,
    ) {
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [ctx.config.width, ctx.config.height],
            pixels_per_point,
        };

        for (id, delta) in &textures_delta.set {
            self.ui_renderer
                .update_texture(&ctx.device, &ctx.queue, *id, delta);
        }

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });
        encoder.push_debug_group("GUI pass");

        self.ui_renderer.update_buffers(
            &ctx.device,
            &ctx.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Render Pass"),
                occlusion_query_set: None,
                timestamp_writes: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
            });

            self.ui_renderer.render(
                &mut rpass.forget_lifetime(),
                &clipped_primitives,
                &screen_descriptor,
            );
        }
        encoder.pop_debug_group();

        for id in &textures_delta.free {
            self.ui_renderer.free_texture(id);
        }

        ctx.queue.submit(Some(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::expect_stage;

    #[test]
    fn display_block_holds_exposure_then_slice() {
        let layout = display_uniforms();
        assert_eq!(layout.field("u_exposure").map(|f| f.offset), Some(0));
        assert_eq!(layout.field("u_slice").map(|f| f.offset), Some(4));
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn display_programs_are_read_from_the_resource_dir() {
        let shaders = ShaderLoader::new("res");
        assert_eq!(
            shaders.resolve(FULLSCREEN_VERT),
            std::path::Path::new("res/fullscreen.vert")
        );
        for fragment in [PLANE_FRAG, VOLUME_FRAG] {
            assert!(expect_stage(&shaders.resolve(fragment), ShaderStage::Fragment).is_ok());
        }
        assert!(expect_stage(&shaders.resolve(FULLSCREEN_VERT), ShaderStage::Vertex).is_ok());
    }
}
