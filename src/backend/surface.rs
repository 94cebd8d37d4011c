// Presentation surface bound to the window

use anyhow::{Context, Result};
use ash::vk;
use std::sync::Arc;
use winit::raw_window_handle_05::{RawDisplayHandle, RawWindowHandle};

use super::VulkanInstance;

pub struct Surface {
    pub loader: ash::extensions::khr::Surface,
    pub surface: vk::SurfaceKHR,
    _instance: Arc<VulkanInstance>,
}

/// What a device reports about presenting to a surface. Queried fresh each time.
#[derive(Debug, Clone, Default)]
pub struct SwapChainDetails {
    pub surface_capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub presentation_modes: Vec<vk::PresentModeKHR>,
}

impl SwapChainDetails {
    /// Usable iff at least one format and one present mode exist
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.presentation_modes.is_empty()
    }
}

impl Surface {
    pub fn new(
        instance: &Arc<VulkanInstance>,
        display_handle: RawDisplayHandle,
        window_handle: RawWindowHandle,
    ) -> Result<Self> {
        let surface = unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.instance,
                display_handle,
                window_handle,
                None,
            )
        }
        .context("Failed to create a surface")?;

        let loader = ash::extensions::khr::Surface::new(&instance.entry, &instance.instance);

        log::info!("Surface created");

        Ok(Self {
            loader,
            surface,
            _instance: Arc::clone(instance),
        })
    }

    pub fn supports_present(&self, physical_device: vk::PhysicalDevice, family: u32) -> Result<bool> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, family, self.surface)
        }
        .context("Failed to query presentation support")
    }

    pub fn swap_chain_details(&self, physical_device: vk::PhysicalDevice) -> Result<SwapChainDetails> {
        unsafe {
            let surface_capabilities = self
                .loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .context("Failed to query surface capabilities")?;

            let formats = self
                .loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .context("Failed to query surface formats")?;

            let presentation_modes = self
                .loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
                .context("Failed to query surface present modes")?;

            Ok(SwapChainDetails {
                surface_capabilities,
                formats,
                presentation_modes,
            })
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        log::info!("Destroying surface");
        unsafe { self.loader.destroy_surface(self.surface, None) };
    }
}
