//! Interactive viewer.
//!
//! | Input            | Action                         |
//! |------------------|--------------------------------|
//! | Space            | Toggle chaos / formed          |
//! | 1, 2, 3          | Classic, Snowy, Icy theme      |
//! | Backspace        | Remove the last photo          |
//! | Delete           | Remove the first photo         |
//! | P                | Pause animation time           |
//! | Left drag, wheel | Orbit and zoom the camera      |
//! | Escape           | Quit                           |

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::error::AppError;
use crate::gpu::GpuState;
use crate::scene::Scene;
use crate::theme::Theme;
use crate::time::FrameClock;

/// Open a window and run `scene` until it is closed.
pub fn run(scene: Scene) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub struct App {
    scene: Scene,
    clock: FrameClock,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// First fatal error; ends the event loop.
    error: Option<AppError>,
}

impl App {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            clock: FrameClock::new(),
            window: None,
            gpu_state: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title("Chaos Tree")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(window.clone(), &self.scene))?;
        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        Ok(())
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.logical_key.as_ref() {
            Key::Named(NamedKey::Space) => {
                let mode = self.scene.toggle_mode();
                tracing::debug!(?mode, "mode toggled");
            }
            Key::Named(NamedKey::Backspace) => {
                let len = self.scene.gallery().len();
                if len > 0 {
                    self.scene.gallery_mut().remove_at(len - 1);
                }
            }
            Key::Named(NamedKey::Delete) => {
                self.scene.gallery_mut().remove_at(0);
            }
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Character("1") => self.switch_theme(Theme::Classic),
            Key::Character("2") => self.switch_theme(Theme::Snowy),
            Key::Character("3") => self.switch_theme(Theme::Icy),
            Key::Character("p") | Key::Character("P") => self.clock.toggle_pause(),
            _ => {}
        }
    }

    fn switch_theme(&mut self, theme: Theme) {
        if theme == self.scene.theme() {
            return;
        }
        self.scene.set_theme(theme);
        if let Some(gpu_state) = &mut self.gpu_state {
            gpu_state.rebuild_scene(&self.scene);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (elapsed, dt) = self.clock.tick();
        self.scene.update(dt, elapsed);

        if let Some(gpu_state) = &mut self.gpu_state {
            match gpu_state.render(&self.scene) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    gpu_state.resize(gpu_state.size())
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    tracing::error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(e) => tracing::warn!(error = ?e, "render error"),
            }
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                tracing::error!(error = %e, "failed to start viewer");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, event),
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state
                                .camera
                                .orbit((position.x - last_x) as f32, (position.y - last_y) as f32);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
