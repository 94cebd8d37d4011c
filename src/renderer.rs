// =============================================================================
// RENDERER - owns every Vulkan object for the window
// =============================================================================
//
// INIT ORDER:
// instance → debug messenger → surface → device + queues → swapchain → pipeline setup
//
// TEARDOWN ORDER (field order below, see Drop):
// image views → swapchain → surface → debug messenger → device → instance

use anyhow::Result;
use std::sync::Arc;
use winit::raw_window_handle_05::{HasRawDisplayHandle, HasRawWindowHandle};
use winit::window::Window;

use crate::backend::{pipeline, DebugMessenger, Surface, Swapchain, VulkanDevice, VulkanInstance};
use crate::config::Config;

/// IMPORTANT: Field order matters for Drop! Fields drop top to bottom and the
/// Arcs inside each wrapper keep parents alive until their children are gone.
pub struct VulkanRenderer {
    swapchain: Swapchain,
    _surface: Surface,
    _debug_messenger: Option<DebugMessenger>,
    _device: Arc<VulkanDevice>,
    _instance: Arc<VulkanInstance>,
}

impl VulkanRenderer {
    /// Run the whole setup sequence against `window`.
    ///
    /// On failure, everything created so far is released before the error returns.
    pub fn new(window: &Window, config: &Config) -> Result<Self> {
        log::info!("Initializing Vulkan...");

        let display_handle = window.raw_display_handle();
        let window_handle = window.raw_window_handle();

        let instance = VulkanInstance::new(display_handle, config.validation_enabled())?;
        let debug_messenger = DebugMessenger::new(&instance)?;
        let surface = Surface::new(&instance, display_handle, window_handle)?;
        let device = VulkanDevice::new(&instance, &surface)?;

        let size = window.inner_size();
        let swapchain = Swapchain::new(Arc::clone(&device), &surface, (size.width, size.height))?;

        pipeline::prepare_graphics_pipeline(
            &device,
            swapchain.extent,
            &config.shaders.vertex,
            &config.shaders.fragment,
        )?;

        log::info!("Vulkan initialized successfully!");

        Ok(Self {
            swapchain,
            _surface: surface,
            _debug_messenger: debug_messenger,
            _device: device,
            _instance: instance,
        })
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        log::info!("Cleaning up Vulkan resources...");
    }
}
