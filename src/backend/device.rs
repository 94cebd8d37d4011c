// Vulkan Device - Core GPU interface
//
// Responsibilities:
// - Physical device selection (first device that can drive our surface)
// - Logical device + graphics/presentation queue creation

use anyhow::{Context, Result};
use ash::vk;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::Arc;

use super::extensions::{join_names, missing_extensions};
use super::instance::VALIDATION_LAYERS;
use super::queue_family::QueueFamilyIndices;
use super::surface::{Surface, SwapChainDetails};
use super::VulkanInstance;

/// Device-level extensions every candidate must expose
pub fn required_device_extensions() -> [&'static CStr; 1] {
    [ash::extensions::khr::Swapchain::name()]
}

/// Chosen physical device plus the logical device created on it.
/// The physical device belongs to the instance and is never destroyed by us.
pub struct MainDevice {
    pub physical_device: vk::PhysicalDevice,
    pub logical_device: ash::Device,
}

/// Logical device wrapper with automatic cleanup
pub struct VulkanDevice {
    pub main: MainDevice,
    // Nothing submits or presents yet
    #[allow(dead_code)]
    pub graphics_queue: vk::Queue,
    #[allow(dead_code)]
    pub presentation_queue: vk::Queue,
    pub graphics_family: u32,
    pub presentation_family: u32,
    pub instance: Arc<VulkanInstance>,
}

/// Everything the acceptance check looks at for one candidate
#[derive(Debug, Default)]
pub struct DeviceSuitability {
    pub missing_extensions: Vec<String>,
    pub queue_families: QueueFamilyIndices,
    /// Only queried when the extensions are there
    pub swap_chain: Option<SwapChainDetails>,
}

impl DeviceSuitability {
    pub fn is_suitable(&self) -> bool {
        self.missing_extensions.is_empty()
            && self.queue_families.is_complete()
            && self.swap_chain.as_ref().map_or(false, SwapChainDetails::is_adequate)
    }

    /// Reason a rejected device was skipped, for the log
    pub fn rejection(&self) -> Option<String> {
        if !self.missing_extensions.is_empty() {
            Some(format!("missing extensions: {}", self.missing_extensions.join(", ")))
        } else if !self.queue_families.is_complete() {
            Some(format!("incomplete queue families: {:?}", self.queue_families))
        } else if !self.swap_chain.as_ref().map_or(false, SwapChainDetails::is_adequate) {
            Some("no surface formats or present modes".to_string())
        } else {
            None
        }
    }
}

/// First candidate, in order, that `check` accepts. No scoring.
pub fn first_suitable<T, F>(candidates: impl IntoIterator<Item = T>, mut check: F) -> Result<(T, QueueFamilyIndices)>
where
    T: Copy + std::fmt::Debug,
    F: FnMut(T) -> Result<DeviceSuitability>,
{
    for candidate in candidates {
        let suitability = check(candidate)?;
        if suitability.is_suitable() {
            return Ok((candidate, suitability.queue_families));
        }
        if let Some(reason) = suitability.rejection() {
            log::debug!("Skipping physical device {:?}: {}", candidate, reason);
        }
    }

    anyhow::bail!("No suitable GPU found")
}

impl VulkanDevice {
    pub fn new(instance: &Arc<VulkanInstance>, surface: &Surface) -> Result<Arc<Self>> {
        let (physical_device, indices) = Self::pick_physical_device(instance, surface)?;

        let properties = unsafe { instance.instance.get_physical_device_properties(physical_device) };
        log::info!(
            "Selected GPU: {}",
            unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }.to_string_lossy()
        );
        log::info!(
            "API Version: {}.{}.{}",
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version),
            vk::api_version_patch(properties.api_version)
        );

        let (graphics_family, presentation_family) = match (indices.graphics_family, indices.presentation_family) {
            (Some(graphics), Some(present)) => (graphics, present),
            _ => anyhow::bail!("Selected device has incomplete queue families"),
        };

        let logical_device = Self::create_logical_device(instance, physical_device, &indices)?;

        // Queues are created along with the device
        let graphics_queue = unsafe { logical_device.get_device_queue(graphics_family, 0) };
        let presentation_queue = unsafe { logical_device.get_device_queue(presentation_family, 0) };

        log::info!(
            "Queues ready (graphics family {}, presentation family {})",
            graphics_family,
            presentation_family
        );

        Ok(Arc::new(Self {
            main: MainDevice {
                physical_device,
                logical_device,
            },
            graphics_queue,
            presentation_queue,
            graphics_family,
            presentation_family,
            instance: Arc::clone(instance),
        }))
    }

    /// First enumerated device that passes `check_device_suitable`
    fn pick_physical_device(
        instance: &VulkanInstance,
        surface: &Surface,
    ) -> Result<(vk::PhysicalDevice, QueueFamilyIndices)> {
        let devices = unsafe { instance.instance.enumerate_physical_devices() }
            .context("Failed to enumerate physical devices")?;

        if devices.is_empty() {
            anyhow::bail!("Can't find GPUs that support Vulkan instance");
        }

        first_suitable(devices, |device| Self::check_device_suitable(instance, surface, device))
    }

    fn check_device_suitable(
        instance: &VulkanInstance,
        surface: &Surface,
        device: vk::PhysicalDevice,
    ) -> Result<DeviceSuitability> {
        let available = unsafe { instance.instance.enumerate_device_extension_properties(device) }
            .context("Failed to enumerate device extensions")?;
        let missing: Vec<String> = missing_extensions(&available, &required_device_extensions())
            .iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        let families = unsafe { instance.instance.get_physical_device_queue_family_properties(device) };
        let queue_families = QueueFamilyIndices::scan(&families, |index| surface.supports_present(device, index))?;

        let swap_chain = if missing.is_empty() {
            Some(surface.swap_chain_details(device)?)
        } else {
            None
        };

        Ok(DeviceSuitability {
            missing_extensions: missing,
            queue_families,
            swap_chain,
        })
    }

    fn create_logical_device(
        instance: &VulkanInstance,
        physical_device: vk::PhysicalDevice,
        indices: &QueueFamilyIndices,
    ) -> Result<ash::Device> {
        let queue_priorities = [1.0];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = indices
            .unique_families()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect();

        let extensions = required_device_extensions();
        let extension_ptrs: Vec<*const c_char> = extensions.iter().map(|name| name.as_ptr()).collect();

        let layer_ptrs: Vec<*const c_char> = if instance.validation {
            VALIDATION_LAYERS.iter().map(|name| name.as_ptr()).collect()
        } else {
            Vec::new()
        };

        let features = vk::PhysicalDeviceFeatures::default();

        // Device layers are deprecated but older loaders still read them
        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs)
            .enabled_features(&features);

        let device = unsafe { instance.instance.create_device(physical_device, &create_info, None) }
            .context("Failed to create a logical device")?;

        log::info!(
            "Logical device created ({} queue families, extensions: {})",
            queue_create_infos.len(),
            join_names(&extensions)
        );

        Ok(device)
    }

    pub fn device(&self) -> &ash::Device {
        &self.main.logical_device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.main.physical_device
    }

    /// Wait for device to be idle (e.g., before cleanup)
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.main.logical_device.device_wait_idle() }?;
        Ok(())
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan device...");

        let _ = self.wait_idle();

        unsafe { self.main.logical_device.destroy_device(None) };
    }
}
