// Vulkan Instance - entry point into the API
//
// Responsibilities:
// - Load the Vulkan library
// - Check requested instance extensions / validation layer are available
// - Create the instance (with a debug messenger chained when validating)
// - Own the optional debug messenger

use anyhow::{Context, Result};
use ash::{vk, Entry};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::Arc;
use winit::raw_window_handle_05::RawDisplayHandle;

use super::extensions::{join_names, missing_extensions, missing_layers};

pub const VALIDATION_LAYERS: [&CStr; 1] = [c"VK_LAYER_KHRONOS_validation"];

/// Instance wrapper, destroyed when the last owner lets go
pub struct VulkanInstance {
    pub instance: ash::Instance,
    pub entry: Entry,
    pub validation: bool,
}

impl VulkanInstance {
    pub fn new(display_handle: RawDisplayHandle, enable_validation: bool) -> Result<Arc<Self>> {
        log::info!("Creating Vulkan instance (validation: {})", enable_validation);

        let entry = unsafe { Entry::load() }
            .context("Failed to load Vulkan library. Is Vulkan installed?")?;

        if enable_validation {
            Self::check_validation_layer_support(&entry)?;
        }

        let app_info = vk::ApplicationInfo::builder()
            .application_name(c"Vulkan Application")
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"No engine")
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_2);

        // Platform presentation extensions for this display
        let mut extensions: Vec<&CStr> = ash_window::enumerate_required_extensions(display_handle)
            .context("Failed to query required surface extensions")?
            .iter()
            .map(|&ptr| unsafe { CStr::from_ptr(ptr) })
            .collect();

        if enable_validation {
            extensions.push(ash::extensions::ext::DebugUtils::name());
        }

        Self::check_instance_extension_support(&entry, &extensions)?;

        let extension_ptrs: Vec<*const c_char> = extensions.iter().map(|name| name.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = if enable_validation {
            VALIDATION_LAYERS.iter().map(|name| name.as_ptr()).collect()
        } else {
            Vec::new()
        };

        // Covers vkCreateInstance / vkDestroyInstance, which the messenger can't
        let mut debug_info = debug_messenger_create_info();

        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        if enable_validation {
            create_info = create_info.push_next(&mut debug_info);
        }

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .context("Failed to create a vulkan instance")?;

        log::info!(
            "Instance created with extensions: {}",
            join_names(&extensions)
        );

        Ok(Arc::new(Self {
            instance,
            entry,
            validation: enable_validation,
        }))
    }

    fn check_instance_extension_support(entry: &Entry, required: &[&CStr]) -> Result<()> {
        let available = entry
            .enumerate_instance_extension_properties(None)
            .context("Failed to enumerate instance extensions")?;

        let missing = missing_extensions(&available, required);
        if !missing.is_empty() {
            anyhow::bail!(
                "VkInstance does not support required extensions: {}",
                join_names(&missing)
            );
        }

        Ok(())
    }

    fn check_validation_layer_support(entry: &Entry) -> Result<()> {
        let available = entry
            .enumerate_instance_layer_properties()
            .context("Failed to enumerate instance layers")?;

        let missing = missing_layers(&available, &VALIDATION_LAYERS);
        if !missing.is_empty() {
            anyhow::bail!(
                "Validation layers requested, but not available: {}",
                join_names(&missing)
            );
        }

        Ok(())
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan instance");
        unsafe { self.instance.destroy_instance(None) };
    }
}

/// Debug messenger reporting validation warnings and errors
pub struct DebugMessenger {
    loader: ash::extensions::ext::DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
    _instance: Arc<VulkanInstance>,
}

impl DebugMessenger {
    /// Returns `None` when the instance was created without validation
    pub fn new(instance: &Arc<VulkanInstance>) -> Result<Option<Self>> {
        if !instance.validation {
            return Ok(None);
        }

        let loader = ash::extensions::ext::DebugUtils::new(&instance.entry, &instance.instance);
        let create_info = debug_messenger_create_info();

        let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
            .context("Failed to set up debug messenger")?;

        log::debug!("Debug messenger installed");

        Ok(Some(Self {
            loader,
            messenger,
            _instance: Arc::clone(instance),
        }))
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

fn debug_messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
        .build()
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*p_callback_data).p_message);

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("validation layer: {}", message.to_string_lossy());
    } else {
        log::warn!("validation layer: {}", message.to_string_lossy());
    }

    vk::FALSE
}
