// Backend module - Vulkan setup layer
//
// Design: thin RAII wrappers around ash handles. Each wrapper keeps its
// parent alive through an Arc, so teardown order follows ownership.

pub mod device;
pub mod extensions;
pub mod instance;
pub mod pipeline;
pub mod queue_family;
pub mod shader;
pub mod surface;
pub mod swapchain;

pub use device::VulkanDevice;
pub use instance::{DebugMessenger, VulkanInstance};
pub use surface::Surface;
pub use swapchain::Swapchain;
