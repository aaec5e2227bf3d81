//! Windowed animation loop.
//!
//! Drives a [`Field`] with the frame clock and presents it through
//! [`GpuState`]. Runtime controls mirror the showcase page the effect was
//! built for: Space pauses, `C` cycles the color scheme, Escape quits.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::field::Field;
use crate::gpu::GpuState;
use crate::time::Clock;

/// winit application wrapping one field, its clock, and the GPU state.
pub struct App {
    field: Field,
    clock: Clock,
    title: String,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
}

impl App {
    /// Wrap a field for the windowed loop. The window opens at the field's
    /// pixel size.
    pub fn new(field: Field, title: impl Into<String>) -> Self {
        Self {
            field,
            clock: Clock::new(),
            title: title.into(),
            window: None,
            gpu_state: None,
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Space => self.clock.toggle_pause(),
            KeyCode::KeyC => {
                let next = self.field.visuals().color_scheme.next();
                self.field.visuals_mut().color_scheme = next;
            }
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.field.width() as f64,
                self.field.height() as f64,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                eprintln!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(GpuState::new(window)) {
            Ok(gpu_state) => self.gpu_state = Some(gpu_state),
            Err(e) => {
                eprintln!("GPU initialization failed: {e}");
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
                self.field
                    .resize(physical_size.width as f32, physical_size.height as f32);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(event_loop, key);
            }
            WindowEvent::RedrawRequested => {
                let fps = self.clock.fps();
                if self.field.should_skip_frame(fps) {
                    // The machine is struggling; drop this frame entirely
                    // and let the clock absorb the gap.
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                    return;
                }

                let timing = self.clock.tick();
                // Particle motion is per-frame, not delta-scaled, so a
                // paused clock must skip the whole step, not just zero it.
                if !self.clock.is_paused() {
                    self.field.advance(timing);
                }

                if let Some(gpu_state) = &mut self.gpu_state {
                    match gpu_state.render(&self.field) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            gpu_state.resize(winit::dpi::PhysicalSize {
                                width: gpu_state.config.width,
                                height: gpu_state.config.height,
                            })
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => eprintln!("Render error: {:?}", e),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
