use vulkanalia::vk;

use crate::utils::error::VKSyncError;

use super::tensor_type::TensorType;

/// What sync operations need from a tensor. Operations hold tensors as
/// `Arc<dyn SyncTensor>` and never assume exclusive ownership.
pub trait SyncTensor: Send + Sync {
    fn tensor_type(&self) -> TensorType;

    /// Size of one element in bytes, always > 0
    fn element_size(&self) -> usize;

    /// Make host writes to the staging memory visible to the device
    fn flush(&self) -> Result<(), VKSyncError>;

    /// Make device writes to the staging memory visible to the host
    fn invalidate(&self) -> Result<(), VKSyncError>;

    /// Record a staging to device copy. `None` copies the whole tensor.
    /// Regions outside the allocation are rejected here, not by the caller.
    fn record_copy_staging_to_device(
        &self,
        command_buffer: vk::CommandBuffer,
        region: Option<vk::BufferCopy>,
    ) -> Result<(), VKSyncError>;

    /// Record a device to staging copy. `None` copies the whole tensor.
    fn record_copy_device_to_staging(
        &self,
        command_buffer: vk::CommandBuffer,
        region: Option<vk::BufferCopy>,
    ) -> Result<(), VKSyncError>;

    fn record_primary_buffer_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
    );
}
