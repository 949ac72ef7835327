use crate::{
    context::GraphicsContext,
    controller::ControllerTrait,
    render_pass::RenderPass,
    ui::{Ui, UiState},
    user_event::UserEvent,
    HarnessError, HarnessOptions, ShaderLoader,
};
#[cfg(target_os = "linux")]
use egui_winit::winit::platform::wayland::WindowAttributesExtWayland;
use egui_winit::winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};
use std::sync::Arc;
use web_time::Instant;

pub struct Graphics<C: ControllerTrait> {
    rpass: RenderPass,
    ctx: GraphicsContext,
    controller: C,
    shaders: ShaderLoader,
    ui: Ui,
    ui_state: UiState,
    window: Arc<Window>,
    event_proxy: EventLoopProxy<UserEvent>,
    last_frame: Instant,
}

pub struct Builder<C: ControllerTrait> {
    event_proxy: EventLoopProxy<UserEvent>,
    options: HarnessOptions,
    controller: C,
}

pub enum App<C: ControllerTrait> {
    Builder(Builder<C>),
    Building,
    Graphics(Graphics<C>),
    Failed(HarnessError),
}

impl<C: ControllerTrait> App<C> {
    pub fn new(
        event_proxy: EventLoopProxy<UserEvent>,
        options: HarnessOptions,
        controller: C,
    ) -> Self {
        Self::Builder(Builder {
            event_proxy,
            options,
            controller,
        })
    }

    pub fn into_result(self) -> Result<(), HarnessError> {
        match self {
            Self::Failed(error) => Err(error),
            _ => Ok(()),
        }
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        let Self::Graphics(gfx) = self else {
            return;
        };
        if size.width != 0 && size.height != 0 {
            gfx.ctx.config.width = size.width;
            gfx.ctx.config.height = size.height;
            gfx.ctx.surface.configure(&gfx.ctx.device, &gfx.ctx.config);
        }
    }

    pub fn keyboard_input(&mut self, event: KeyEvent) {
        let Self::Graphics(gfx) = self else {
            return;
        };
        if event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::F5) {
            gfx.reload_shaders();
            return;
        }
        gfx.controller.keyboard_input(event);
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Self::Graphics(gfx) = self else {
            return Ok(());
        };
        let now = Instant::now();
        let dt = (now - gfx.last_frame).as_secs_f32();
        gfx.last_frame = now;
        gfx.controller.update(dt);

        gfx.window.request_redraw();
        gfx.rpass.render(
            &gfx.ctx,
            &gfx.window,
            &mut gfx.ui,
            &mut gfx.ui_state,
            &mut gfx.controller,
            &gfx.event_proxy,
        )
    }

    pub fn ui_consumes_event(&mut self, event: &WindowEvent) -> bool {
        let Self::Graphics(gfx) = self else {
            return false;
        };
        gfx.ui.consumes_event(&gfx.window, event)
    }

    pub fn set_vsync(&mut self, enable: bool) {
        let Self::Graphics(gfx) = self else {
            return;
        };
        gfx.ctx.set_vsync(enable);
    }

    pub fn reload_shaders(&mut self) {
        let Self::Graphics(gfx) = self else {
            return;
        };
        gfx.reload_shaders();
    }
}

impl<C: ControllerTrait> Graphics<C> {
    /// Rebuild the display and controller programs. Each keeps its
    /// previous programs if its own rebuild fails.
    fn reload_shaders(&mut self) {
        let results = [
            self.rpass.reload(&self.ctx, &self.shaders),
            self.controller.setup(&self.ctx, &self.shaders),
        ];
        let mut failed = false;
        for error in results.into_iter().filter_map(Result::err) {
            log::error!("shader reload failed, keeping previous programs: {error}");
            failed = true;
        }
        if !failed {
            log::info!("shaders reloaded from {}", self.shaders.root().display());
        }
        self.window.request_redraw();
    }
}

impl<C: ControllerTrait> ApplicationHandler<UserEvent> for App<C> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Self::Builder(builder) = std::mem::replace(self, Self::Building) {
            match futures::executor::block_on(create_graphics(builder, event_loop)) {
                Ok(gfx) => {
                    gfx.window.request_redraw();
                    *self = Self::Graphics(gfx);
                }
                Err(error) => {
                    log::error!("{error}");
                    *self = Self::Failed(error);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.ui_consumes_event(&event) {
            return;
        }
        match event {
            WindowEvent::RedrawRequested => {
                if let Err(wgpu::SurfaceError::OutOfMemory) = self.render() {
                    log::error!("out of memory, exiting");
                    event_loop.exit()
                }
            }
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => self.keyboard_input(event),
            WindowEvent::Resized(size) => self.resize(size),
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::SetVSync(enable) => self.set_vsync(enable),
            UserEvent::ReloadShaders => self.reload_shaders(),
        }
    }
}

async fn create_graphics<C: ControllerTrait>(
    builder: Builder<C>,
    event_loop: &ActiveEventLoop,
) -> Result<Graphics<C>, HarnessError> {
    let options = builder.options;
    let window_attributes = Window::default_attributes()
        .with_title(&options.title)
        .with_inner_size(PhysicalSize::new(options.width, options.height));
    #[cfg(target_os = "linux")]
    let window_attributes = window_attributes.with_name(&options.title, "");
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let ctx = GraphicsContext::new(window.clone(), window.inner_size(), options.vsync).await?;
    let shaders = ShaderLoader::new(&options.resource_dir);
    let rpass = RenderPass::new(&ctx, &shaders)?;

    let mut controller = builder.controller;
    controller.setup(&ctx, &shaders)?;

    let ui = Ui::new(window.clone(), &options.title);
    let ui_state = UiState::new(options.vsync);

    Ok(Graphics {
        rpass,
        ctx,
        controller,
        shaders,
        ui,
        ui_state,
        window,
        event_proxy: builder.event_proxy,
        last_frame: Instant::now(),
    })
}
