use anyhow::Result;
use std::num::NonZeroU32;

use glutin::{
    config::{ConfigTemplateBuilder, GlConfig},
    context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext},
    display::{GetGlDisplay, GlDisplay},
    prelude::{GlSurface, NotCurrentGlContext},
    surface::{Surface as GlutinSurface, SurfaceAttributesBuilder, WindowSurface},
};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::Window,
};

use dotspin::config::{Animation, Config, Icon, ANIMATIONS, ICONS};
use dotspin::egui_integration::EguiIntegration;
use dotspin::schedule::Scheduler;
use dotspin::spinner::Spinner;

#[derive(Debug, Clone)]
enum UiAction {
    SetIcon(Icon),
    SetAnimation(Animation),
    SetSeed(Option<u64>),
    ResetConfig,
}

struct Env {
    gl_surface: GlutinSurface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

struct App {
    env: Env,
    egui: EguiIntegration,
    scheduler: Scheduler,
    spinner: Spinner,
    config: Config,
    show_controls: bool,
}

impl App {
    /// Replace the spinner with one built from the current config. The old
    /// spinner's animations are cancelled when it drops.
    fn rebuild_spinner(&mut self) {
        self.spinner = build_spinner(&self.scheduler, &self.config);
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::SetIcon(icon) => self.config.icon = icon,
            UiAction::SetAnimation(animation) => self.config.animation = animation,
            UiAction::SetSeed(seed) => self.config.seed = seed,
            UiAction::ResetConfig => self.config = Config::default(),
        }
        self.config.save();
        self.rebuild_spinner();
        self.env.window.request_redraw();
    }
}

fn build_spinner(scheduler: &Scheduler, config: &Config) -> Spinner {
    match config.seed {
        Some(seed) => Spinner::with_seed(scheduler, config.icon, config.animation, seed),
        None => Spinner::new(scheduler, config.icon, config.animation),
    }
}

/// Build the demo UI: the spinner centred on the configured background, plus
/// a controls window. Returns a list of actions to process.
fn build_ui(
    ctx: &egui::Context,
    config: &Config,
    spinner: &Spinner,
    show_controls: &mut bool,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    let [r, g, b] = config.background;
    let background = egui::Color32::from_rgb(r, g, b);

    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.fill(background))
        .show(ctx, |ui| {
            let center = ui.max_rect().center();
            ui.put(egui::Rect::from_center_size(center, Spinner::SIZE), spinner);
        });

    egui::Window::new("Spinner")
        .open(show_controls)
        .resizable(false)
        .default_width(240.0)
        .show(ctx, |ui| {
            egui::ComboBox::from_label("Icon")
                .selected_text(config.icon.to_string())
                .show_ui(ui, |ui| {
                    for (icon, description) in ICONS {
                        if ui
                            .selectable_label(config.icon == *icon, icon.to_string())
                            .on_hover_text(*description)
                            .clicked()
                        {
                            actions.push(UiAction::SetIcon(*icon));
                        }
                    }
                });

            egui::ComboBox::from_label("Animation")
                .selected_text(config.animation.to_string())
                .show_ui(ui, |ui| {
                    for (animation, description) in ANIMATIONS {
                        if ui
                            .selectable_label(config.animation == *animation, animation.to_string())
                            .on_hover_text(*description)
                            .clicked()
                        {
                            actions.push(UiAction::SetAnimation(*animation));
                        }
                    }
                });

            let mut fixed_seed = config.seed.is_some();
            if ui
                .checkbox(&mut fixed_seed, "Fixed fade seed")
                .on_hover_text("Repeat the same fade rhythm on every rebuild")
                .changed()
            {
                actions.push(UiAction::SetSeed(fixed_seed.then_some(0)));
            }
            if let Some(seed) = config.seed {
                let mut value = seed;
                ui.horizontal(|ui| {
                    ui.label("Seed:");
                    if ui.add(egui::DragValue::new(&mut value)).changed() {
                        actions.push(UiAction::SetSeed(Some(value)));
                    }
                });
            }

            ui.add_space(8.0);
            if ui.button("Reset to Defaults").clicked() {
                actions.push(UiAction::ResetConfig);
            }

            ui.separator();
            ui.label("Space: switch animation");
            ui.label("C: switch dot shape");
            ui.label("S: toggle this window, Esc/Q: quit");
        });

    actions
}

impl ApplicationHandler for App {
    fn resumed(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        self.env.window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let response = self.egui.on_window_event(&self.env.window, &event);
        if response.repaint {
            self.env.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(physical_size) => {
                let (width, height): (u32, u32) = physical_size.into();
                self.env.gl_surface.resize(
                    &self.env.gl_context,
                    NonZeroU32::new(width.max(1)).unwrap(),
                    NonZeroU32::new(height.max(1)).unwrap(),
                );
                self.env.window.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match &event.logical_key {
                    Key::Named(NamedKey::Space) => {
                        let next = match self.config.animation {
                            Animation::Fade => Animation::Spiral,
                            Animation::Spiral => Animation::Fade,
                        };
                        self.apply(UiAction::SetAnimation(next));
                    }
                    Key::Character(c) if c.as_str() == "c" => {
                        let next = match self.config.icon {
                            Icon::Square => Icon::Circle,
                            Icon::Circle => Icon::Square,
                        };
                        self.apply(UiAction::SetIcon(next));
                    }
                    Key::Character(c) if c.as_str() == "s" => {
                        self.show_controls = !self.show_controls;
                        self.env.window.request_redraw();
                    }
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    Key::Character(c) if c.as_str() == "q" => event_loop.exit(),
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                let size = self.env.window.inner_size();
                if size.width == 0 || size.height == 0 {
                    return;
                }

                let mut actions = Vec::new();
                let config = &self.config;
                let spinner = &self.spinner;
                let show_controls = &mut self.show_controls;
                let repaint = self.egui.run_frame(&self.env.window, |ctx| {
                    actions.extend(build_ui(ctx, config, spinner, show_controls));
                });

                self.env
                    .gl_surface
                    .swap_buffers(&self.env.gl_context)
                    .unwrap();

                for action in actions {
                    self.apply(action);
                }
                if repaint {
                    self.env.window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load();
    log::info!(
        "Starting demo: {} dots, {} animation",
        config.icon,
        config.animation
    );

    // Set up winit + glutin + egui
    let el = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_inner_size(LogicalSize::new(480.0, 360.0))
        .with_resizable(true)
        .with_title("dotspin");

    let template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_transparency(true);

    let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));
    let (window, gl_config) = display_builder
        .build(&el, template, |configs| {
            configs
                .reduce(|accum, config| {
                    let transparency_check = config.supports_transparency().unwrap_or(false)
                        & !accum.supports_transparency().unwrap_or(false);
                    if transparency_check || config.num_samples() < accum.num_samples() {
                        config
                    } else {
                        accum
                    }
                })
                .unwrap()
        })
        .unwrap();
    let window = window.expect("Could not create window with OpenGL context");
    let window_handle = window
        .window_handle()
        .expect("Failed to retrieve window handle");
    let raw_window_handle = window_handle.as_raw();

    let context_attributes = ContextAttributesBuilder::new().build(Some(raw_window_handle));
    let fallback_context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::Gles(None))
        .build(Some(raw_window_handle));

    let not_current_gl_context = unsafe {
        gl_config
            .display()
            .create_context(&gl_config, &context_attributes)
            .unwrap_or_else(|_| {
                gl_config
                    .display()
                    .create_context(&gl_config, &fallback_context_attributes)
                    .expect("failed to create context")
            })
    };

    let (width, height): (u32, u32) = window.inner_size().into();
    let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_window_handle,
        NonZeroU32::new(width).unwrap(),
        NonZeroU32::new(height).unwrap(),
    );

    let gl_surface = unsafe {
        gl_config
            .display()
            .create_window_surface(&gl_config, &attrs)
            .expect("Could not create gl window surface")
    };

    let gl_context = not_current_gl_context
        .make_current(&gl_surface)
        .expect("Could not make GL context current");

    let egui = EguiIntegration::new(&window, &gl_context)?;

    let scheduler = Scheduler::new();
    let spinner = build_spinner(&scheduler, &config);

    let env = Env {
        gl_surface,
        gl_context,
        window,
    };

    let mut app = App {
        env,
        egui,
        scheduler,
        spinner,
        config,
        show_controls: true,
    };

    el.run_app(&mut app).expect("Couldn't run event loop");

    Ok(())
}
