//! Buffer management for vertex data
//!
//! Host-visible buffers with RAII allocation and cleanup. Uploads go through
//! `bytemuck` so only plain-old-data types can reach the mapped pointer.

use ash::{vk, Device};

use crate::render::vulkan::{VulkanContext, VulkanError, VulkanResult};

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it.
    pub fn new(
        context: &VulkanContext,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type_index =
            context.find_memory_type(mem_requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            device
                .allocate_memory(&alloc_info, None)
                .map_err(VulkanError::Api)?
        };

        unsafe {
            device
                .bind_buffer_memory(buffer, memory, 0)
                .map_err(VulkanError::Api)?;
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Map the whole buffer for writing
    pub fn map_memory(&self) -> VulkanResult<*mut std::ffi::c_void> {
        unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)
        }
    }

    /// Unmap the buffer
    pub fn unmap_memory(&self) {
        unsafe {
            self.device.unmap_memory(self.memory);
        }
    }

    /// Copy a slice of plain-old-data values into the buffer.
    ///
    /// Requires host-visible, host-coherent memory; the data must fit.
    pub fn write_data<T: bytemuck::Pod>(&self, data: &[T]) -> VulkanResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() as vk::DeviceSize > self.size {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "Write of {} bytes exceeds buffer size {}",
                    bytes.len(),
                    self.size
                ),
            });
        }

        let data_ptr = self.map_memory()?;

        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), data_ptr.cast::<u8>(), bytes.len());
        }

        self.unmap_memory();
        Ok(())
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
