//! Window management using winit

use std::sync::Arc;
use thiserror::Error;
use winit::{
    dpi::PhysicalSize,
    error::{EventLoopError, OsError},
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window as WinitWindow, WindowBuilder},
};

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("failed to create window: {0}")]
    Creation(#[from] OsError),
}

/// What the frame callback wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Exit,
}

/// Size and lifecycle flags tracked from window events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub width: u32,
    pub height: u32,
    resized: bool,
    close_requested: bool,
}

impl WindowState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            resized: false,
            close_requested: false,
        }
    }

    /// Returns true when the event changed the state
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(size) => {
                self.width = size.width;
                self.height = size.height;
                self.resized = true;
                true
            }
            WindowEvent::CloseRequested => {
                self.close_requested = true;
                true
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.close_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Resize flag, cleared by reading it
    pub fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    pub fn should_close(&self) -> bool {
        self.close_requested
    }
}

/// Wrapper around winit window with additional state
pub struct Window {
    window: Arc<WinitWindow>,
    state: WindowState,
}

impl Window {
    pub fn new(
        event_loop: &EventLoop<()>,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, WindowError> {
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height))
                .build(event_loop)?,
        );
        let size = window.inner_size();
        Ok(Self {
            window,
            state: WindowState::new(size.width, size.height),
        })
    }

    /// Get arc reference to window for backend initialization
    pub fn window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.state.width, self.state.height)
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WindowState {
        &mut self.state
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// An event loop with its window, created before the loop starts so the
/// renderer can be built from the window
pub struct WindowHost {
    event_loop: EventLoop<()>,
    window: Window,
}

impl WindowHost {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, WindowError> {
        let event_loop = EventLoop::new()?;
        let window = Window::new(&event_loop, title, width, height)?;
        log::info!("Created window '{}' ({}x{})", title, width, height);
        Ok(Self { event_loop, window })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Run until the window closes or the callback asks to exit.
    /// The callback runs once per loop iteration, after pending events.
    pub fn run<F>(self, mut callback: F) -> Result<(), WindowError>
    where
        F: FnMut(&mut Window) -> FrameControl + 'static,
    {
        let Self {
            event_loop,
            mut window,
        } = self;

        event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, .. } => {
                    window.state.handle_event(&event);
                    if window.state.should_close() {
                        elwt.exit();
                    }
                }
                Event::AboutToWait => {
                    if callback(&mut window) == FrameControl::Exit {
                        elwt.exit();
                        return;
                    }
                    window.request_redraw();
                }
                _ => {}
            }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_sets_flag_once() {
        let mut state = WindowState::new(1280, 720);
        assert!(state.handle_event(&WindowEvent::Resized(PhysicalSize::new(640, 480))));
        assert_eq!((state.width, state.height), (640, 480));
        assert!(state.take_resized());
        assert!(!state.take_resized());
    }

    #[test]
    fn close_request_is_sticky() {
        let mut state = WindowState::new(1, 1);
        assert!(!state.should_close());
        state.handle_event(&WindowEvent::CloseRequested);
        assert!(state.should_close());
        assert!(!state.handle_event(&WindowEvent::Focused(true)));
        assert!(state.should_close());
    }
}
