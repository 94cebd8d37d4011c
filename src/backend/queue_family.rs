// Queue family lookup
//
// A device is only usable if some family can do graphics and some family
// can present to our surface. They are often the same family.

use anyhow::Result;
use ash::vk;

/// Indices (locations) of the queue families we need, if they exist at all
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub presentation_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Single pass over `families`, stopping once both slots are filled.
    ///
    /// `supports_present` is asked about every family visited, in order.
    pub fn scan<F>(families: &[vk::QueueFamilyProperties], mut supports_present: F) -> Result<Self>
    where
        F: FnMut(u32) -> Result<bool>,
    {
        let mut indices = Self::default();

        for (index, family) in (0u32..).zip(families) {
            if family.queue_count > 0 && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                indices.graphics_family = Some(index);
            }

            if family.queue_count > 0 && supports_present(index)? {
                indices.presentation_family = Some(index);
            }

            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }

    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.presentation_family.is_some()
    }

    /// Distinct family indices, ascending. Empty unless complete.
    pub fn unique_families(&self) -> Vec<u32> {
        match (self.graphics_family, self.presentation_family) {
            (Some(graphics), Some(present)) if graphics == present => vec![graphics],
            (Some(graphics), Some(present)) => vec![graphics.min(present), graphics.max(present)],
            _ => Vec::new(),
        }
    }
}
