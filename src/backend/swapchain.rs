// Swapchain - Window presentation
//
// Manages the chain of images the surface cycles through.
// Nothing is rendered into them yet; we only create the chain and its views.

use anyhow::{Context, Result};
use ash::vk;
use std::sync::Arc;

use super::surface::Surface;
use super::VulkanDevice;

/// Swapchain-owned image plus the view we created over it
#[derive(Debug, Clone, Copy)]
pub struct SwapchainImage {
    /// Owned by the swapchain, never destroyed directly
    #[allow(dead_code)]
    pub image: vk::Image,
    pub image_view: vk::ImageView,
}

pub struct Swapchain {
    pub swapchain: vk::SwapchainKHR,
    pub swapchain_loader: ash::extensions::khr::Swapchain,
    pub images: Vec<SwapchainImage>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    device: Arc<VulkanDevice>,
}

impl Swapchain {
    /// `framebuffer_size` is only used when the surface leaves the extent to us
    pub fn new(device: Arc<VulkanDevice>, surface: &Surface, framebuffer_size: (u32, u32)) -> Result<Self> {
        let details = surface.swap_chain_details(device.physical_device())?;

        let surface_format = choose_surface_format(&details.formats)?;
        let present_mode = choose_present_mode(&details.presentation_modes);
        let extent = choose_extent(&details.surface_capabilities, framebuffer_size);
        let image_count = choose_image_count(&details.surface_capabilities);

        log::info!(
            "Creating swapchain: {}x{}, {:?}/{:?}, {:?}, {} images requested",
            extent.width,
            extent.height,
            surface_format.format,
            surface_format.color_space,
            present_mode,
            image_count
        );

        // Images must be shareable when two different families touch them
        let family_indices = [device.graphics_family, device.presentation_family];
        let concurrent = device.graphics_family != device.presentation_family;
        let sharing_mode = if concurrent {
            vk::SharingMode::CONCURRENT
        } else {
            vk::SharingMode::EXCLUSIVE
        };
        let shared_families: &[u32] = if concurrent { &family_indices } else { &[] };

        let swapchain_loader =
            ash::extensions::khr::Swapchain::new(&device.instance.instance, device.device());

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(shared_families)
            .pre_transform(details.surface_capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None) }
            .context("Failed to create swapchain")?;

        let mut this = Self {
            swapchain,
            swapchain_loader,
            images: Vec::new(),
            format: surface_format.format,
            extent,
            device,
        };

        let images = unsafe { this.swapchain_loader.get_swapchain_images(this.swapchain) }
            .context("Failed to get swapchain images")?;

        // Pushed one at a time so Drop releases whatever was made if a view fails
        for image in images {
            let image_view = create_image_view(
                this.device.device(),
                image,
                this.format,
                vk::ImageAspectFlags::COLOR,
            )?;
            this.images.push(SwapchainImage { image, image_view });
        }

        log::info!("Created swapchain with {} images", this.images.len());

        Ok(this)
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        log::info!("Destroying swapchain and {} image views", self.images.len());
        unsafe {
            for image in &self.images {
                self.device.device().destroy_image_view(image.image_view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

pub fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
    aspect_flags: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect_flags,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe { device.create_image_view(&create_info, None) }.context("Failed to create an image view")
}

// -----------------------------------------------------------------------------
// Selection
// -----------------------------------------------------------------------------

/// Prefer 8-bit RGBA (BGRA as backup) in sRGB nonlinear space.
///
/// A lone `UNDEFINED` entry means the surface takes anything.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Result<vk::SurfaceFormatKHR> {
    if let [only] = formats {
        if only.format == vk::Format::UNDEFINED {
            return Ok(vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            });
        }
    }

    formats
        .iter()
        .find(|f| {
            (f.format == vk::Format::R8G8B8A8_UNORM || f.format == vk::Format::B8G8R8A8_UNORM)
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
        .context("No suitable surface format")
}

/// MAILBOX when offered, FIFO otherwise (FIFO is always supported)
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, framebuffer_size: (u32, u32)) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }

    let (width, height) = framebuffer_size;
    // max/min rather than clamp: a bogus min > max must not panic
    vk::Extent2D {
        width: width.min(caps.max_image_extent.width).max(caps.min_image_extent.width),
        height: height.min(caps.max_image_extent.height).max(caps.min_image_extent.height),
    }
}

/// One more than the minimum, unless a nonzero maximum is smaller
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = caps.min_image_count.saturating_add(1);
    if caps.max_image_count > 0 && image_count > caps.max_image_count {
        caps.max_image_count
    } else {
        image_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR { format, color_space }
    }

    fn pair(f: vk::SurfaceFormatKHR) -> (vk::Format, vk::ColorSpaceKHR) {
        (f.format, f.color_space)
    }

    fn dims(extent: vk::Extent2D) -> (u32, u32) {
        (extent.width, extent.height)
    }

    fn caps_with_bounds(current: (u32, u32), min: (u32, u32), max: (u32, u32)) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: current.0, height: current.1 },
            min_image_extent: vk::Extent2D { width: min.0, height: min.1 },
            max_image_extent: vk::Extent2D { width: max.0, height: max.1 },
            ..Default::default()
        }
    }

    fn caps_with_counts(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            ..Default::default()
        }
    }

    #[test]
    fn undefined_format_means_any() {
        let chosen = choose_surface_format(&[format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR)]).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn finds_rgba_match_anywhere() {
        let formats = [
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
            format(vk::Format::A2B10G10R10_UNORM_PACK32, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn finds_bgra_match() {
        let formats = [
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn right_format_wrong_color_space_is_not_a_match() {
        let formats = [
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(pair(chosen), pair(formats[0]));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [
            format(vk::Format::A2R10G10B10_UNORM_PACK32, vk::ColorSpaceKHR::HDR10_ST2084_EXT),
            format(vk::Format::R5G6B5_UNORM_PACK16, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(pair(choose_surface_format(&formats).unwrap()), pair(formats[0]));
    }

    #[test]
    fn undefined_among_others_is_not_special() {
        let formats = [
            format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(pair(choose_surface_format(&formats).unwrap()), pair(formats[0]));
    }

    #[test]
    fn empty_format_list_is_an_error() {
        assert!(choose_surface_format(&[]).is_err());
    }

    #[test]
    fn mailbox_preferred_wherever_it_is() {
        use ash::vk::PresentModeKHR as P;
        assert_eq!(choose_present_mode(&[P::MAILBOX, P::FIFO]), P::MAILBOX);
        assert_eq!(choose_present_mode(&[P::IMMEDIATE, P::FIFO_RELAXED, P::MAILBOX]), P::MAILBOX);
    }

    #[test]
    fn fifo_when_no_mailbox() {
        use ash::vk::PresentModeKHR as P;
        assert_eq!(choose_present_mode(&[P::IMMEDIATE, P::FIFO_RELAXED]), P::FIFO);
        assert_eq!(choose_present_mode(&[]), P::FIFO);
    }

    #[test]
    fn current_extent_passes_through() {
        let caps = caps_with_bounds((1024, 768), (1, 1), (4096, 4096));
        assert_eq!(dims(choose_extent(&caps, (10, 10))), (1024, 768));
    }

    #[test]
    fn sentinel_extent_uses_framebuffer_within_range() {
        let caps = caps_with_bounds((u32::MAX, u32::MAX), (100, 100), (2000, 2000));
        assert_eq!(dims(choose_extent(&caps, (800, 600))), (800, 600));
    }

    #[test]
    fn sentinel_extent_clamps_up_to_min() {
        let caps = caps_with_bounds((u32::MAX, u32::MAX), (320, 240), (2000, 2000));
        assert_eq!(dims(choose_extent(&caps, (10, 20))), (320, 240));
    }

    #[test]
    fn sentinel_extent_clamps_down_to_max() {
        let caps = caps_with_bounds((u32::MAX, u32::MAX), (1, 1), (640, 480));
        assert_eq!(dims(choose_extent(&caps, (3840, 2160))), (640, 480));
    }

    #[test]
    fn sentinel_extent_clamps_each_dimension_independently() {
        let caps = caps_with_bounds((u32::MAX, u32::MAX), (100, 100), (1000, 1000));
        assert_eq!(dims(choose_extent(&caps, (50, 5000))), (100, 1000));
    }

    #[test]
    fn image_count_is_min_plus_one() {
        assert_eq!(choose_image_count(&caps_with_counts(2, 8)), 3);
        // zero max means no limit
        assert_eq!(choose_image_count(&caps_with_counts(2, 0)), 3);
    }

    #[test]
    fn image_count_capped_by_max() {
        assert_eq!(choose_image_count(&caps_with_counts(3, 3)), 3);
        assert_eq!(choose_image_count(&caps_with_counts(2, 2)), 2);
    }

    #[test]
    fn image_count_exactly_at_max() {
        assert_eq!(choose_image_count(&caps_with_counts(2, 3)), 3);
    }
}
