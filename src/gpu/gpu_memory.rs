use std::{ptr::NonNull, sync::Arc};

use vulkanalia::vk::{self, DeviceV1_0};

use crate::utils::error::VKSyncError;

use super::vk_gpu::Gpu;

/// `VK_WHOLE_SIZE` as a device size, for map, flush, invalidate and barrier ranges.
pub(crate) const WHOLE_SIZE: vk::DeviceSize = vk::WHOLE_SIZE as vk::DeviceSize;

/// A buffer and its bound memory. Host visible memory stays mapped until drop,
/// flush and invalidate are only valid on mapped ranges.
pub struct GPUMemory {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: vk::DeviceSize,
    pub properties: vk::MemoryPropertyFlags,
    mapped: Option<NonNull<u8>>,
    gpu: Arc<Gpu>,
}

// The mapped pointer is only dereferenced through &self methods that copy whole
// slices in or out; callers sequence host access against GPU work.
unsafe impl Send for GPUMemory {}
unsafe impl Sync for GPUMemory {}

impl GPUMemory {
    pub fn new(
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        size: vk::DeviceSize,
        properties: vk::MemoryPropertyFlags,
        gpu: &Arc<Gpu>,
    ) -> Result<Self, VKSyncError> {
        let mapped = if properties.contains(vk::MemoryPropertyFlags::HOST_VISIBLE) {
            let ptr = unsafe {
                gpu.get_device().map_memory(
                    memory,
                    0,
                    WHOLE_SIZE,
                    vk::MemoryMapFlags::empty(),
                )?
            };
            NonNull::new(ptr as *mut u8)
        } else {
            None
        };

        Ok(Self {
            buffer,
            memory,
            size,
            properties,
            mapped,
            gpu: Arc::clone(gpu),
        })
    }

    pub fn gpu(&self) -> &Arc<Gpu> {
        &self.gpu
    }

    pub fn is_host_coherent(&self) -> bool {
        self.properties
            .contains(vk::MemoryPropertyFlags::HOST_COHERENT)
    }

    fn mapped_ptr(&self) -> Result<NonNull<u8>, VKSyncError> {
        self.mapped.ok_or_else(|| {
            VKSyncError::Tensor(format!(
                "Buffer with {:?} is not host visible",
                self.properties
            ))
        })
    }

    /// Copy raw bytes into the start of the mapped memory.
    pub fn copy_into(&self, data: &[u8]) -> Result<(), VKSyncError> {
        let data_size = data.len() as vk::DeviceSize;

        if data_size > self.size {
            return Err(VKSyncError::Tensor(format!(
                "Data size {} exceeds GPU buffer size {}",
                data_size, self.size
            )));
        }

        let ptr = self.mapped_ptr()?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len());
        }

        Ok(())
    }

    /// Read the whole buffer out of the mapped memory.
    pub fn read_memory(&self) -> Result<Vec<u8>, VKSyncError> {
        let ptr = self.mapped_ptr()?;
        let mut output_data = vec![0u8; self.size as usize];

        unsafe {
            std::ptr::copy_nonoverlapping(ptr.as_ptr(), output_data.as_mut_ptr(), output_data.len());
        }

        Ok(output_data)
    }

    /// Make host writes visible to the device. No-op on coherent memory.
    pub fn flush(&self) -> Result<(), VKSyncError> {
        self.mapped_ptr()?;
        if self.is_host_coherent() {
            return Ok(());
        }

        let range = self.whole_range();
        unsafe { self.gpu.get_device().flush_mapped_memory_ranges(&[range])? };
        Ok(())
    }

    /// Make device writes visible to the host. No-op on coherent memory.
    pub fn invalidate(&self) -> Result<(), VKSyncError> {
        self.mapped_ptr()?;
        if self.is_host_coherent() {
            return Ok(());
        }

        let range = self.whole_range();
        unsafe {
            self.gpu
                .get_device()
                .invalidate_mapped_memory_ranges(&[range])?
        };
        Ok(())
    }

    // WHOLE_SIZE sidesteps nonCoherentAtomSize alignment of the range end
    fn whole_range(&self) -> vk::MappedMemoryRange {
        vk::MappedMemoryRange {
            memory: self.memory,
            offset: 0,
            size: WHOLE_SIZE,
            ..Default::default()
        }
    }
}

impl Drop for GPUMemory {
    fn drop(&mut self) {
        unsafe {
            let device = self.gpu.get_device();
            if self.mapped.take().is_some() {
                device.unmap_memory(self.memory);
            }
            device.destroy_buffer(self.buffer, None);
            device.free_memory(self.memory, None);
        }
    }
}
