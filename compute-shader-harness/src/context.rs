use crate::HarnessError;
use egui_winit::winit::{dpi::PhysicalSize, window::Window};
use std::sync::Arc;

pub struct GraphicsContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GraphicsContext {
    pub async fn new(
        window: Arc<Window>,
        initial_size: PhysicalSize<u32>,
        vsync: bool,
    ) -> Result<GraphicsContext, HarnessError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let initial_surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&initial_surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(HarnessError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("{} ({:?}, {})", info.name, info.backend, info.driver_info);

        let features = adapter.features() & wgpu::Features::FLOAT32_FILTERABLE;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: features,
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;
        log_compute_limits(&device.limits());

        fn auto_configure_surface<'a>(
            adapter: &wgpu::Adapter,
            device: &wgpu::Device,
            surface: wgpu::Surface<'a>,
            size: PhysicalSize<u32>,
            vsync: bool,
        ) -> Result<(wgpu::Surface<'a>, wgpu::SurfaceConfiguration), HarnessError> {
            let capabilities = surface.get_capabilities(adapter);
            let mut surface_config = surface
                .get_default_config(adapter, size.width.max(1), size.height.max(1))
                .ok_or_else(|| HarnessError::SurfaceConfig(format!("{capabilities:#?}")))?;
            surface_config.present_mode = present_mode(vsync);
            if let Ok(format) = egui_wgpu::preferred_framebuffer_format(&capabilities.formats) {
                surface_config.format = format;
            }
            surface.configure(device, &surface_config);
            Ok((surface, surface_config))
        }

        let (surface, config) =
            auto_configure_surface(&adapter, &device, initial_surface, initial_size, vsync)?;

        Ok(GraphicsContext {
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn set_vsync(&mut self, enable: bool) {
        let present_mode = present_mode(enable);
        if self.config.present_mode != present_mode {
            self.config.present_mode = present_mode;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Whether 32-bit float textures may be sampled with linear filtering.
    pub fn float32_filterable(&self) -> bool {
        crate::texture::is_filterable(wgpu::TextureFormat::Rgba32Float, self.device.features())
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

fn log_compute_limits(limits: &wgpu::Limits) {
    log::info!(
        "max workgroups per dimension: {}",
        limits.max_compute_workgroups_per_dimension
    );
    log::info!(
        "max workgroup size: ({}, {}, {})",
        limits.max_compute_workgroup_size_x,
        limits.max_compute_workgroup_size_y,
        limits.max_compute_workgroup_size_z
    );
    log::info!(
        "max invocations per workgroup: {}",
        limits.max_compute_invocations_per_workgroup
    );
}
