use anyhow::Result;
use egui_winit::EventResponse;
use glutin::display::{GetGlDisplay, GlDisplay};
use std::sync::Arc;

/// egui integration state: the UI context, winit platform bridge, and glow
/// painter for a single window.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    winit_state: egui_winit::State,
    painter: egui_glow::Painter,
}

impl EguiIntegration {
    /// Create a new egui integration instance.
    ///
    /// The OpenGL context must be current when this is called.
    pub fn new(
        window: &winit::window::Window,
        gl_context: &glutin::context::PossiblyCurrentContext,
    ) -> Result<Self> {
        let display = gl_context.display();

        let glow_context = unsafe {
            glow::Context::from_loader_function(|s| {
                let s = std::ffi::CString::new(s)
                    .expect("failed to construct CString for GL function pointer");
                display.get_proc_address(s.as_c_str()).cast()
            })
        };
        let glow_context = Arc::new(glow_context);

        let painter = egui_glow::Painter::new(
            glow_context,
            "",
            None,  // shader_version
            false, // srgb
        )?;

        let ctx = egui::Context::default();
        let winit_state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            None, // native pixels per point
            None, // theme
            None, // max texture side
        );

        Ok(Self {
            ctx,
            winit_state,
            painter,
        })
    }

    /// Handle a winit window event. The returned response says whether egui
    /// consumed the event and whether it wants a repaint.
    pub fn on_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> EventResponse {
        self.winit_state.on_window_event(window, event)
    }

    /// Run one full UI frame: gather input, build the UI with `build_ui`,
    /// tessellate and paint it to the current framebuffer.
    ///
    /// Returns `true` if the UI requested an immediate repaint (animations
    /// running), in which case the caller should request another redraw.
    pub fn run_frame(
        &mut self,
        window: &winit::window::Window,
        mut build_ui: impl FnMut(&egui::Context),
    ) -> bool {
        let raw_input = self.winit_state.take_egui_input(window);
        let output = self.ctx.run(raw_input, |ctx| build_ui(ctx));
        self.winit_state
            .handle_platform_output(window, output.platform_output);

        let size = window.inner_size();
        let screen_size_px = [size.width, size.height];
        let clipped_primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);

        egui_glow::painter::clear(self.painter.gl(), screen_size_px, [0.0, 0.0, 0.0, 1.0]);
        self.painter.paint_and_update_textures(
            screen_size_px,
            output.pixels_per_point,
            &clipped_primitives,
            &output.textures_delta,
        );

        output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|viewport| viewport.repaint_delay.is_zero())
    }
}

impl Drop for EguiIntegration {
    fn drop(&mut self) {
        self.painter.destroy();
    }
}
