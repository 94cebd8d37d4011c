// =============================================================================
// VULKAN APP - context bootstrap for a windowed application
// =============================================================================
//
// Opens a fixed-size window and brings up a Vulkan instance, surface,
// device, swapchain and the first half of a graphics pipeline. Nothing is
// drawn: after setup the app only services window events until closed.
//
// ┌──────────────────────────────────────────────┐
// │  winit event loop (App)                      │
// │    └── VulkanRenderer                        │
// │          ├── VulkanInstance (+ messenger)    │
// │          ├── Surface                         │
// │          ├── VulkanDevice (+ queues)         │
// │          └── Swapchain (+ image views)       │
// └──────────────────────────────────────────────┘
//
// =============================================================================

mod backend;
mod config;
mod renderer;

use anyhow::Result;
use config::Config;
use renderer::VulkanRenderer;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    let loaded = Config::load();

    init_logging(&loaded.config);
    loaded.report();
    let config = loaded.config;
    log::info!("Starting {}", config.window.title);
    log::info!("Window: {}x{}", config.window.width, config.window.height);

    let event_loop = EventLoop::new()?;
    // Nothing animates, so sleep until the window system has something for us
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => {
            println!("ERROR: {:#}", e);
            Err(e)
        }
        None => {
            log::info!("Window closed, exiting");
            Ok(())
        }
    }
}

fn init_logging(config: &Config) {
    use env_logger::Builder;

    let mut builder = Builder::new();
    builder.filter_level(config.log_level());
    // RUST_LOG still wins when set
    builder.parse_env("RUST_LOG");
    builder.init();
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Field order matters for Drop: the renderer's surface must go before the window.
struct App {
    config: Config,
    renderer: Option<VulkanRenderer>,
    window: Option<Arc<Window>>,
    /// Set when setup fails; main turns it into the exit status
    init_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            renderer: None,
            window: None,
            init_error: None,
        }
    }

    fn window_attributes(&self) -> WindowAttributes {
        Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.window.width, self.config.window.height))
            .with_resizable(false)
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Arc::new(event_loop.create_window(self.window_attributes())?);
        // Kept before the renderer exists so a failed init still closes cleanly
        self.window = Some(Arc::clone(&window));

        let renderer = VulkanRenderer::new(&window, &self.config)?;
        let swapchain = renderer.swapchain();
        log::info!(
            "Swapchain ready: {:?} {}x{}",
            swapchain.format,
            swapchain.extent.width,
            swapchain.extent.height
        );

        self.renderer = Some(renderer);
        Ok(())
    }

    /// Explicit teardown, renderer first, then the window it presented to
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.renderer = None;
        self.window = None;
        event_loop.exit();
    }
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("Failed to initialize Vulkan: {:#}", e);
            self.init_error = Some(e);
            self.shutdown(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            log::info!("Close requested, shutting down...");
            self.shutdown(event_loop);
        }
    }
}
