//! Synchronization primitives
//!
//! RAII wrappers for semaphores and fences, the per-frame sync bundle, and
//! the per-swap-image fence table that keeps two in-flight frames from
//! targeting the same image.

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Semaphore wrapper with RAII cleanup
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled binary semaphore.
    pub fn new(device: Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();

        let semaphore = unsafe {
            device
                .create_semaphore(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, semaphore })
    }

    /// Raw Vulkan handle.
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence wrapper with RAII cleanup
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a fence, signaled or unsignaled.
    ///
    /// Frame fences start signaled so the first wait on each frame slot
    /// returns immediately.
    pub fn new(device: Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);

        let fence = unsafe {
            device
                .create_fence(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, fence })
    }

    /// Raw Vulkan handle.
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Wait for the fence to signal.
    pub fn wait(&self, timeout_ns: u64) -> VulkanResult<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.fence], true, timeout_ns)
                .map_err(VulkanError::Api)
        }
    }

    /// Reset the fence to unsignaled.
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .reset_fences(&[self.fence])
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Synchronization objects for one frame-in-flight slot
pub struct FrameSync {
    /// Signaled when the presentation engine releases the acquired image
    pub image_available: Semaphore,
    /// Signaled when rendering to the image completes
    pub render_finished: Semaphore,
    /// Signaled when this slot's submitted work finishes on the GPU
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create the semaphore pair and the in-flight fence for one slot.
    pub fn new(device: &Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device.clone())?,
            render_finished: Semaphore::new(device.clone())?,
            // Signaled so the first frame does not wait forever
            in_flight: Fence::new(device.clone(), true)?,
        })
    }
}

/// Tracks which in-flight fence last targeted each swapchain image.
///
/// Acquire order is driver-chosen, so an image can come back while a previous
/// frame that rendered to it is still executing. Before reusing the image the
/// renderer must wait on the fence recorded here. Holds borrowed handles
/// only; fence lifetime belongs to [`FrameSync`].
pub struct ImageFenceTable {
    fences: Vec<vk::Fence>,
}

impl ImageFenceTable {
    /// Create a table with one empty slot per swapchain image.
    pub fn new(image_count: usize) -> Self {
        Self {
            fences: vec![vk::Fence::null(); image_count],
        }
    }

    /// Record `fence` as the one guarding `image_index`, returning the fence
    /// previously guarding it (if any), which must be waited on first.
    pub fn mark_in_use(&mut self, image_index: usize, fence: vk::Fence) -> Option<vk::Fence> {
        let previous = self.fences[image_index];
        self.fences[image_index] = fence;
        if previous == vk::Fence::null() {
            None
        } else {
            Some(previous)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn image_fence_table_starts_empty() {
        let mut table = ImageFenceTable::new(3);
        let fence = vk::Fence::from_raw(1);
        assert_eq!(table.mark_in_use(0, fence), None);
        assert_eq!(table.mark_in_use(1, fence), None);
        assert_eq!(table.mark_in_use(2, fence), None);
    }

    #[test]
    fn image_fence_table_returns_previous_occupant() {
        let mut table = ImageFenceTable::new(2);
        let first = vk::Fence::from_raw(1);
        let second = vk::Fence::from_raw(2);

        assert_eq!(table.mark_in_use(0, first), None);
        assert_eq!(table.mark_in_use(0, second), Some(first));
        assert_eq!(table.mark_in_use(0, first), Some(second));
    }

    #[test]
    fn image_fence_table_slots_are_independent() {
        let mut table = ImageFenceTable::new(2);
        let first = vk::Fence::from_raw(1);
        let second = vk::Fence::from_raw(2);

        assert_eq!(table.mark_in_use(0, first), None);
        assert_eq!(table.mark_in_use(1, second), None);
        assert_eq!(table.mark_in_use(1, first), Some(second));
    }
}
