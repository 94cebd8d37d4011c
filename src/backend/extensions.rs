// Extension and layer availability checks
//
// The host reports names as fixed-size, nul-terminated char arrays.
// These helpers compare them against what we want to enable.

use ash::vk;
use std::ffi::CStr;
use std::os::raw::c_char;

/// Read a name out of a Vulkan fixed-size char array
fn raw_name(raw: &[c_char]) -> &CStr {
    // Vulkan guarantees nul termination within the array
    unsafe { CStr::from_ptr(raw.as_ptr()) }
}

/// Required extensions absent from `available`, in request order
pub fn missing_extensions<'a>(
    available: &[vk::ExtensionProperties],
    required: &[&'a CStr],
) -> Vec<&'a CStr> {
    required
        .iter()
        .copied()
        .filter(|&name| !available.iter().any(|ext| raw_name(&ext.extension_name) == name))
        .collect()
}

/// Required layers absent from `available`, in request order
pub fn missing_layers<'a>(
    available: &[vk::LayerProperties],
    required: &[&'a CStr],
) -> Vec<&'a CStr> {
    required
        .iter()
        .copied()
        .filter(|&name| !available.iter().any(|layer| raw_name(&layer.layer_name) == name))
        .collect()
}

/// Comma-separated list for error messages
pub fn join_names(names: &[&CStr]) -> String {
    names
        .iter()
        .map(|name| name.to_string_lossy())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_name(dst: &mut [c_char], name: &CStr) {
        for (slot, &byte) in dst.iter_mut().zip(name.to_bytes_with_nul()) {
            *slot = byte as c_char;
        }
    }

    fn extension(name: &CStr) -> vk::ExtensionProperties {
        let mut props = vk::ExtensionProperties::default();
        write_name(&mut props.extension_name, name);
        props
    }

    const SWAPCHAIN: &CStr = c"VK_KHR_swapchain";
    const SURFACE: &CStr = c"VK_KHR_surface";
    const DEBUG_UTILS: &CStr = c"VK_EXT_debug_utils";

    fn layer(name: &CStr) -> vk::LayerProperties {
        let mut props = vk::LayerProperties::default();
        write_name(&mut props.layer_name, name);
        props
    }

    #[test]
    fn all_present_reports_nothing() {
        let available = [extension(SURFACE), extension(DEBUG_UTILS), extension(SWAPCHAIN)];
        assert!(missing_extensions(&available, &[SWAPCHAIN, SURFACE]).is_empty());
    }

    #[test]
    fn reports_each_missing_extension() {
        let available = [extension(SURFACE)];
        let missing = missing_extensions(&available, &[SWAPCHAIN, SURFACE, DEBUG_UTILS]);
        assert_eq!(missing, vec![SWAPCHAIN, DEBUG_UTILS]);
        assert_eq!(join_names(&missing), "VK_KHR_swapchain, VK_EXT_debug_utils");
    }

    #[test]
    fn prefix_is_not_a_match() {
        let available = [extension(c"VK_KHR_swap")];
        assert_eq!(missing_extensions(&available, &[SWAPCHAIN]), vec![SWAPCHAIN]);
    }

    #[test]
    fn empty_host_list_misses_everything() {
        assert_eq!(missing_extensions(&[], &[SWAPCHAIN]), vec![SWAPCHAIN]);
        assert!(missing_extensions(&[], &[]).is_empty());
    }

    #[test]
    fn validation_layer_lookup() {
        let validation = c"VK_LAYER_KHRONOS_validation";
        let available = [layer(c"VK_LAYER_MESA_overlay"), layer(validation)];
        assert!(missing_layers(&available, &[validation]).is_empty());
        assert_eq!(missing_layers(&available[..1], &[validation]), vec![validation]);
    }
}
