use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use log::debug;
use vulkanalia::vk;

use crate::{
    tensor::{SyncEntry, SyncRange, SyncTensor},
    utils::error::VKSyncError,
};

use super::{entries, operation::Operation};

const OP_NAME: &str = "OpTensorSyncLocal";

/// Pulls device local data back into host visible staging memory.
///
/// Each copy is bracketed by barriers on the primary buffer: compute shader
/// writes must be visible to the transfer, and the transfer must be visible to
/// host reads once the command buffer completes. Cached staging memory is
/// invalidated after execution so the host doesn't read stale lines.
pub struct OpTensorSyncLocal {
    entries: Vec<SyncEntry>,
}

impl OpTensorSyncLocal {
    pub fn new(entries: Vec<SyncEntry>) -> Result<Self, VKSyncError> {
        entries::require_entries(OP_NAME, &entries)?;
        debug!("{} created over {} tensors", OP_NAME, entries.len());
        Ok(Self { entries })
    }

    /// Positional form: `ranges` is empty or has one range per tensor.
    pub fn from_tensors(
        tensors: Vec<Arc<dyn SyncTensor>>,
        ranges: Vec<SyncRange>,
    ) -> Result<Self, VKSyncError> {
        Self::new(entries::pair_ranges(OP_NAME, tensors, ranges)?)
    }

    pub fn entries(&self) -> &[SyncEntry] {
        &self.entries
    }
}

impl Debug for OpTensorSyncLocal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "SyncLocal({:?})", self.entries)
    }
}

impl Operation for OpTensorSyncLocal {
    fn pre_eval(&self, _command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        debug!("{} pre_eval called", OP_NAME);
        Ok(())
    }

    fn record(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        debug!("{} record called", OP_NAME);

        for entry in &self.entries {
            let tensor = &entry.tensor;
            if !tensor.tensor_type().is_device_resident() {
                continue;
            }

            tensor.record_primary_buffer_barrier(
                command_buffer,
                vk::AccessFlags::SHADER_WRITE,
                vk::AccessFlags::TRANSFER_READ,
                vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::PipelineStageFlags::TRANSFER,
            );

            tensor.record_copy_device_to_staging(command_buffer, entry.copy_region())?;

            tensor.record_primary_buffer_barrier(
                command_buffer,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::HOST_READ,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::HOST,
            );
        }
        Ok(())
    }

    fn post_eval(&self, _command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        debug!("{} post_eval called", OP_NAME);

        for entry in &self.entries {
            if entry.tensor.tensor_type().has_host_cache() {
                entry.tensor.invalidate()?;
            }
        }
        Ok(())
    }
}
