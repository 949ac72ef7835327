use crate::{controller::ControllerTrait, fps_counter::FpsCounter, user_event::UserEvent};
use egui::{
    epaint::{textures::TexturesDelta, ClippedPrimitive},
    Context,
};
use egui_winit::{
    winit::{event::WindowEvent, event_loop::EventLoopProxy, window::Window},
    State,
};
use std::sync::Arc;

pub struct UiState {
    pub fps: u32,
    pub vsync: bool,
    pub exposure: f32,
}

impl UiState {
    pub fn new(vsync: bool) -> Self {
        Self {
            fps: 0,
            vsync,
            exposure: 1.0,
        }
    }

    pub fn frame_time_ms(&self) -> f32 {
        if self.fps == 0 {
            0.0
        } else {
            1000.0 / self.fps as f32
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Application average {:.3} ms/frame ({:.1} FPS)",
            self.frame_time_ms(),
            self.fps as f32
        )
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(true)
    }
}

pub struct Ui {
    title: String,
    egui_winit_state: State,
    fps_counter: FpsCounter,
}

impl Ui {
    pub fn new(window: Arc<Window>, title: &str) -> Self {
        let context = Context::default();
        context.options_mut(|w| w.zoom_with_keyboard = false);
        let viewport_id = context.viewport_id();
        let egui_winit_state = State::new(
            context,
            viewport_id,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Self {
            title: title.to_owned(),
            egui_winit_state,
            fps_counter: FpsCounter::new(),
        }
    }

    pub fn consumes_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.egui_winit_state
            .on_window_event(window, event)
            .consumed
    }

    pub fn prepare<C: ControllerTrait>(
        &mut self,
        window: &Window,
        ui_state: &mut UiState,
        controller: &mut C,
        event_proxy: &EventLoopProxy<UserEvent>,
    ) -> (Vec<ClippedPrimitive>, TexturesDelta, f32) {
        ui_state.fps = self.fps_counter.tick();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_winit_state.egui_ctx().run(raw_input, |ctx| {
            self.ui(ctx, ui_state, controller, event_proxy);
        });
        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);
        let clipped_primitives = self
            .egui_winit_state
            .egui_ctx()
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        (
            clipped_primitives,
            full_output.textures_delta,
            full_output.pixels_per_point,
        )
    }

    fn ui<C: ControllerTrait>(
        &self,
        ctx: &Context,
        ui_state: &mut UiState,
        controller: &mut C,
        event_proxy: &EventLoopProxy<UserEvent>,
    ) {
        let send_event = |user_event| {
            let _ = event_proxy.send_event(user_event);
        };
        egui::Window::new(self.title.as_str())
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(ui_state.summary());
                if ui.checkbox(&mut ui_state.vsync, "V-sync").changed() {
                    send_event(UserEvent::SetVSync(ui_state.vsync));
                }
                ui.add(
                    egui::Slider::new(&mut ui_state.exposure, 0.1..=10.0)
                        .logarithmic(true)
                        .text("Display exposure"),
                );
                if ui.button("Reload shaders (F5)").clicked() {
                    send_event(UserEvent::ReloadShaders);
                }
                ui.separator();
                controller.ui(ui);
            });
    }
}
