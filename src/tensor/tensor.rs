use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use log::debug;
use vulkanalia::vk::{self, DeviceV1_0};

use crate::{
    gpu::{
        allocator,
        gpu_memory::{GPUMemory, WHOLE_SIZE},
        vk_gpu::Gpu,
    },
    utils::error::VKSyncError,
};

use super::{sync_tensor::SyncTensor, tensor_type::TensorType};

/// Vulkan backed tensor. Device resident types own a primary device local
/// buffer plus a staging buffer of the same size, host types only the primary.
pub struct Tensor {
    tensor_type: TensorType,
    element_size: usize,
    primary: GPUMemory,
    staging: Option<GPUMemory>,
}

impl Tensor {
    /// Allocate a tensor of `tensor_type` holding `data`, interpreted as
    /// elements of `element_size` bytes.
    pub fn new(
        gpu: &Arc<Gpu>,
        tensor_type: TensorType,
        data: &[u8],
        element_size: usize,
    ) -> Result<Self, VKSyncError> {
        if element_size == 0 {
            return Err(VKSyncError::InvalidArgument(
                "Element size must be greater than 0".to_string(),
            ));
        }

        if data.is_empty() || data.len() % element_size != 0 {
            return Err(VKSyncError::InvalidArgument(format!(
                "Data length {} is not a non-zero multiple of element size {}",
                data.len(),
                element_size
            )));
        }

        let size = data.len() as vk::DeviceSize;
        let transfer = vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST;
        let host_coherent =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        let (primary, staging) = match tensor_type {
            TensorType::Device | TensorType::DeviceCached => {
                let primary = allocator::allocate_buffer(
                    gpu,
                    size,
                    vk::BufferUsageFlags::STORAGE_BUFFER | transfer,
                    vk::MemoryPropertyFlags::DEVICE_LOCAL,
                )?;

                let staging = if tensor_type.has_host_cache() {
                    allocator::allocate_buffer_preferring(
                        gpu,
                        size,
                        transfer,
                        &[
                            vk::MemoryPropertyFlags::HOST_VISIBLE
                                | vk::MemoryPropertyFlags::HOST_CACHED,
                            host_coherent,
                        ],
                    )?
                } else {
                    allocator::allocate_buffer(gpu, size, transfer, host_coherent)?
                };

                (primary, Some(staging))
            }
            TensorType::Host => {
                let primary = allocator::allocate_buffer(
                    gpu,
                    size,
                    vk::BufferUsageFlags::STORAGE_BUFFER | transfer,
                    host_coherent,
                )?;
                (primary, None)
            }
            TensorType::Staging => {
                let primary = allocator::allocate_buffer(gpu, size, transfer, host_coherent)?;
                (primary, None)
            }
        };

        let tensor = Self {
            tensor_type,
            element_size,
            primary,
            staging,
        };

        tensor.write_data(data)?;
        if !tensor.host_side().is_host_coherent() {
            tensor.host_side().flush()?;
        }

        debug!(
            "Created {:?} tensor with {} elements of {} bytes",
            tensor_type,
            tensor.element_count(),
            element_size
        );

        Ok(tensor)
    }

    pub fn element_count(&self) -> usize {
        self.primary.size as usize / self.element_size
    }

    pub fn size_in_bytes(&self) -> vk::DeviceSize {
        self.primary.size
    }

    // Memory the host reads and writes
    fn host_side(&self) -> &GPUMemory {
        self.staging.as_ref().unwrap_or(&self.primary)
    }

    /// Overwrite the host visible copy. Device resident tensors still need a
    /// sync to device before shaders see the data.
    pub fn write_data(&self, data: &[u8]) -> Result<(), VKSyncError> {
        if data.len() as vk::DeviceSize != self.size_in_bytes() {
            return Err(VKSyncError::Tensor(format!(
                "Input data size mismatch: expected {} bytes, got {}",
                self.size_in_bytes(),
                data.len()
            )));
        }

        self.host_side().copy_into(data)
    }

    /// Read the host visible copy. Device resident tensors need a sync to
    /// local first to observe device writes.
    pub fn read_data(&self) -> Result<Vec<u8>, VKSyncError> {
        self.host_side().read_memory()
    }

    fn staging_or_err(&self) -> Result<&GPUMemory, VKSyncError> {
        self.staging.as_ref().ok_or_else(|| {
            VKSyncError::Tensor(format!(
                "{:?} tensor has no staging buffer to copy through",
                self.tensor_type
            ))
        })
    }

    fn record_copy(
        &self,
        command_buffer: vk::CommandBuffer,
        src: &GPUMemory,
        dst: &GPUMemory,
        region: vk::BufferCopy,
    ) {
        unsafe {
            self.primary.gpu().get_device().cmd_copy_buffer(
                command_buffer,
                src.buffer,
                dst.buffer,
                &[region],
            );
        }
    }
}

/// Resolve a copy region against a buffer of `size` bytes. `None` is the full
/// extent. Empty regions and regions ending past `size` on either side are rejected.
fn check_region(
    region: Option<vk::BufferCopy>,
    size: vk::DeviceSize,
) -> Result<vk::BufferCopy, VKSyncError> {
    let region = region.unwrap_or(vk::BufferCopy {
        src_offset: 0,
        dst_offset: 0,
        size,
    });

    if region.size == 0 {
        return Err(VKSyncError::Tensor("Copy region is empty".to_string()));
    }

    let in_bounds = |offset: vk::DeviceSize| {
        offset
            .checked_add(region.size)
            .is_some_and(|end| end <= size)
    };

    if !in_bounds(region.src_offset) || !in_bounds(region.dst_offset) {
        return Err(VKSyncError::Tensor(format!(
            "Copy region (src {}, dst {}, size {}) exceeds tensor of {} bytes",
            region.src_offset, region.dst_offset, region.size, size
        )));
    }

    Ok(region)
}

impl SyncTensor for Tensor {
    fn tensor_type(&self) -> TensorType {
        self.tensor_type
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn flush(&self) -> Result<(), VKSyncError> {
        self.host_side().flush()
    }

    fn invalidate(&self) -> Result<(), VKSyncError> {
        self.host_side().invalidate()
    }

    fn record_copy_staging_to_device(
        &self,
        command_buffer: vk::CommandBuffer,
        region: Option<vk::BufferCopy>,
    ) -> Result<(), VKSyncError> {
        let staging = self.staging_or_err()?;
        let region = check_region(region, self.size_in_bytes())?;
        self.record_copy(command_buffer, staging, &self.primary, region);
        Ok(())
    }

    fn record_copy_device_to_staging(
        &self,
        command_buffer: vk::CommandBuffer,
        region: Option<vk::BufferCopy>,
    ) -> Result<(), VKSyncError> {
        let staging = self.staging_or_err()?;
        let region = check_region(region, self.size_in_bytes())?;
        self.record_copy(command_buffer, &self.primary, staging, region);
        Ok(())
    }

    fn record_primary_buffer_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
    ) {
        let barrier = vk::BufferMemoryBarrier {
            src_access_mask: src_access,
            dst_access_mask: dst_access,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            buffer: self.primary.buffer,
            offset: 0,
            size: WHOLE_SIZE,
            ..Default::default()
        };

        unsafe {
            self.primary.gpu().get_device().cmd_pipeline_barrier(
                command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[] as &[vk::MemoryBarrier],
                &[barrier],
                &[] as &[vk::ImageMemoryBarrier],
            );
        }
    }
}

impl Debug for Tensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Tensor({:?}, {} x {}B)",
            self.tensor_type,
            self.element_count(),
            self.element_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(src_offset: u64, dst_offset: u64, size: u64) -> vk::BufferCopy {
        vk::BufferCopy {
            src_offset,
            dst_offset,
            size,
        }
    }

    #[test]
    fn missing_region_covers_whole_buffer() {
        let region = check_region(None, 400).unwrap();
        assert_eq!(
            (region.src_offset, region.dst_offset, region.size),
            (0, 0, 400)
        );
    }

    #[test]
    fn region_ending_at_buffer_end_is_accepted() {
        let region = check_region(Some(copy(40, 40, 360)), 400).unwrap();
        assert_eq!(
            (region.src_offset, region.dst_offset, region.size),
            (40, 40, 360)
        );
    }

    #[test]
    fn region_one_byte_past_end_is_rejected() {
        assert!(matches!(
            check_region(Some(copy(40, 40, 361)), 400),
            Err(VKSyncError::Tensor(_))
        ));
        assert!(matches!(
            check_region(Some(copy(0, 40, 361)), 400),
            Err(VKSyncError::Tensor(_))
        ));
    }

    #[test]
    fn empty_region_is_rejected() {
        assert!(matches!(
            check_region(Some(copy(0, 0, 0)), 400),
            Err(VKSyncError::Tensor(_))
        ));
    }

    #[test]
    fn overflowing_offsets_are_rejected() {
        assert!(matches!(
            check_region(Some(copy(u64::MAX, u64::MAX, 1)), 400),
            Err(VKSyncError::Tensor(_))
        ));
        assert!(matches!(
            check_region(Some(copy(0, u64::MAX, 4)), 400),
            Err(VKSyncError::Tensor(_))
        ));
    }
}
