use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{GpuInit, WgpuDevice};
use crate::render::{RenderContext, SceneConfig};
use crate::time::FrameClock;

use super::{close_window, drive_frame, start_rendering, LoopAction};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Client-area size in physical pixels.
    pub inner_size: PhysicalSize<u32>,
    /// Screen position of the window's top-left corner.
    pub position: PhysicalPosition<i32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "D3D Tutorial 03: Matrices".to_string(),
            inner_size: PhysicalSize::new(256, 256),
            position: PhysicalPosition::new(400, 200),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and renders until it is closed.
    ///
    /// Pending events are dispatched first; a frame is rendered whenever the
    /// queue is empty. Graphics initialization failures are logged and leave
    /// the window open with nothing drawn.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, scene: SceneConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState::new(config, gpu_init, scene);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        log::info!("event loop exited");
        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    /// `None` when graphics initialization failed.
    #[borrows(window)]
    #[not_covariant]
    context: Option<RenderContext<WgpuDevice<'this>>>,
}

impl WindowEntry {
    fn create(window: Window, gpu_init: GpuInit, scene: SceneConfig) -> Self {
        WindowEntryBuilder {
            clock: FrameClock::new(),
            window,
            context_builder: |window| {
                let device = pollster::block_on(WgpuDevice::create(window, gpu_init)).inspect(
                    |device| {
                        log::info!(
                            "rendering on {} with {:?} vertex processing",
                            device.gpu().adapter_info().name,
                            device.vertex_processing()
                        );
                    },
                );
                start_rendering(device, scene)
            },
        }
        .build()
    }

    fn render(&mut self) -> LoopAction {
        self.with_mut(|fields| {
            let window = fields.window;
            drive_frame(fields.context.as_mut(), fields.clock, || {
                window.pre_present_notify()
            })
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.with_context_mut(|context| {
            if let Some(device) = context.as_mut().and_then(|c| c.device_mut())
                && device.gpu().size() != new_size
            {
                device.resize(new_size);
            }
        });
    }

    fn close(&mut self) -> LoopAction {
        self.with_context_mut(|context| close_window(context.as_mut()))
    }
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    scene: SceneConfig,

    entry: Option<WindowEntry>,
    exit_requested: bool,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, scene: SceneConfig) -> Self {
        Self {
            config,
            gpu_init,
            scene,
            entry: None,
            exit_requested: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.inner_size)
            .with_position(self.config.position);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        log::info!(
            "window created: {:?} ({}x{})",
            window.id(),
            self.config.inner_size.width,
            self.config.inner_size.height
        );

        self.entry = Some(WindowEntry::create(
            window,
            self.gpu_init.clone(),
            self.scene.clone(),
        ));
        Ok(())
    }

    /// Releases graphics resources, then the window, and stops the loop.
    fn close(&mut self, event_loop: &ActiveEventLoop) {
        let action = self
            .entry
            .take()
            .map_or(LoopAction::Exit, |mut entry| entry.close());
        self.apply(event_loop, action);
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if entry.render() == LoopAction::Exit {
            self.close(event_loop);
        }
    }

    fn apply(&mut self, event_loop: &ActiveEventLoop, action: LoopAction) {
        if action == LoopAction::Exit {
            self.exit_requested = true;
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Queue drained: render one frame.
        self.render(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                log::info!("window closed");
                self.close(event_loop);
            }

            WindowEvent::Resized(new_size) => entry.resize(new_size),

            WindowEvent::RedrawRequested => self.render(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.entry.take() {
            entry.close();
        }
    }
}
