use std::sync::Arc;

use log::{debug, warn};
use vulkanalia::vk::{self, DeviceV1_0};

use crate::utils::error::VKSyncError;

use super::gpu_memory::GPUMemory;
use super::vk_gpu::Gpu;

/// Create a buffer and bind freshly allocated memory with exactly `properties`.
pub fn allocate_buffer(
    gpu: &Arc<Gpu>,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    properties: vk::MemoryPropertyFlags,
) -> Result<GPUMemory, VKSyncError> {
    if size == 0 {
        return Err(VKSyncError::InvalidArgument(
            "Cannot allocate a zero sized buffer".to_string(),
        ));
    }

    let device = gpu.get_device();

    let buffer_info = vk::BufferCreateInfo {
        s_type: vk::StructureType::BUFFER_CREATE_INFO,
        next: std::ptr::null(),
        flags: vk::BufferCreateFlags::empty(),
        size,
        usage,
        sharing_mode: vk::SharingMode::EXCLUSIVE,
        queue_family_index_count: 0,
        queue_family_indices: std::ptr::null(),
    };

    unsafe {
        let buffer = device.create_buffer(&buffer_info, None)?;
        let mem_requirements = device.get_buffer_memory_requirements(buffer);

        let memory_type = match gpu.find_memory_type(mem_requirements.memory_type_bits, properties)
        {
            Ok(memory_type) => memory_type,
            Err(e) => {
                device.destroy_buffer(buffer, None);
                return Err(e);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo {
            s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
            next: std::ptr::null(),
            allocation_size: mem_requirements.size,
            memory_type_index: memory_type,
        };

        let memory = match device.allocate_memory(&alloc_info, None) {
            Ok(memory) => memory,
            Err(e) => {
                device.destroy_buffer(buffer, None);
                return Err(e.into());
            }
        };

        let bound = device
            .bind_buffer_memory(buffer, memory, 0)
            .map_err(VKSyncError::from)
            .and_then(|_| GPUMemory::new(buffer, memory, size, properties, gpu));

        match bound {
            Ok(gpu_memory) => {
                debug!(
                    "Allocated {} bytes ({:?}) with memory type {}",
                    size, properties, memory_type
                );
                Ok(gpu_memory)
            }
            Err(e) => {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
                Err(e)
            }
        }
    }
}

/// Try each property set in order, falling back to the next when the device
/// exposes no matching memory type.
pub fn allocate_buffer_preferring(
    gpu: &Arc<Gpu>,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    candidates: &[vk::MemoryPropertyFlags],
) -> Result<GPUMemory, VKSyncError> {
    let mut last_error = None;

    for (i, &properties) in candidates.iter().enumerate() {
        match allocate_buffer(gpu, size, usage, properties) {
            Ok(memory) => {
                if i > 0 {
                    warn!(
                        "Preferred memory {:?} unavailable on '{}', using {:?}",
                        candidates[0],
                        gpu.name(),
                        properties
                    );
                }
                return Ok(memory);
            }
            Err(e @ VKSyncError::Gpu(_)) => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        VKSyncError::InvalidArgument("No memory property candidates given".to_string())
    }))
}
