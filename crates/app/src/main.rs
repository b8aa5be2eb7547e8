//! Vantage scene viewer - main entry point.
//!
//! Owns the window-event loop and drives the renderer: `update()` then
//! `render()` per tick, resize and close plumbed through explicitly.
//! No process-global state - the window and renderer live in the
//! application handler and context is passed where it is needed.

use anyhow::Result;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use vantage_core::{RenderConfig, Timer};
use vantage_platform::Window;
use vantage_render::mesh::MeshPipelineDesc;
use vantage_render::overlay::NoOverlay;
use vantage_render::{Renderer, VertexLayout};

mod scene;

struct App {
    window: Option<Window>,
    renderer: Option<Renderer>,
    timer: Timer,
    config: RenderConfig,
}

impl App {
    fn new(config: RenderConfig) -> Self {
        Self {
            window: None,
            renderer: None,
            timer: Timer::new(),
            config,
        }
    }

    fn build_renderer(&self, window: &Window) -> Result<Renderer> {
        // The demo scene stands in for the external importer: one flat
        // triangle and one lit cube, each with its own shader pair.
        let meshes = vec![
            (
                scene::demo_triangle(),
                MeshPipelineDesc::new(
                    VertexLayout::PositionColor,
                    "shaders/flat.vert.spv",
                    "shaders/flat.frag.spv",
                ),
            ),
            (
                scene::demo_cube(),
                MeshPipelineDesc::new(
                    VertexLayout::PositionNormalColor,
                    "shaders/lit.vert.spv",
                    "shaders/lit.frag.spv",
                ),
            ),
        ];

        let renderer = Renderer::new(window, self.config.clone(), &meshes, Box::new(NoOverlay))?;
        Ok(renderer)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match Window::new(
            event_loop,
            self.config.width,
            self.config.height,
            &self.config.title,
        ) {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match self.build_renderer(&window) {
            Ok(renderer) => {
                info!("Initialization complete, entering main loop");
                self.renderer = Some(renderer);
                self.window = Some(window);
            }
            Err(e) => {
                error!("Failed to create renderer: {:?}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(ref mut renderer) = self.renderer {
                    renderer.request_resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let delta = self.timer.delta_secs();

                if let Some(ref mut renderer) = self.renderer {
                    // A frame-fatal error aborts the frame and the process;
                    // partial frames are never retried.
                    if let Err(e) = renderer.update(delta) {
                        error!("Update failed: {:?}", e);
                        event_loop.exit();
                        return;
                    }
                    if let Err(e) = renderer.render() {
                        error!("Render failed: {:?}", e);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    vantage_core::init_logging();
    info!("Starting vantage scene viewer");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(RenderConfig::default());
    event_loop.run_app(&mut app)?;

    Ok(())
}
