use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use log::debug;
use vulkanalia::vk;

use crate::{
    tensor::{SyncEntry, SyncRange, SyncTensor},
    utils::error::VKSyncError,
};

use super::{entries, operation::Operation};

const OP_NAME: &str = "OpTensorSyncDevice";

/// Pushes host staged data into device local memory.
pub struct OpTensorSyncDevice {
    entries: Vec<SyncEntry>,
}

impl OpTensorSyncDevice {
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

impl Debug for OpTensorSyncDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "SyncDevice({:?})", self.entries)
    }
}

impl Operation for OpTensorSyncDevice {
    fn pre_eval(&self, _command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        debug!("{} pre_eval called", OP_NAME);

        // Host writes must reach the device before the copy reads them
        for entry in &self.entries {
            if entry.tensor.tensor_type().has_host_cache() {
                entry.tensor.flush()?;
            }
        }
        Ok(())
    }

    fn record(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        debug!("{} record called", OP_NAME);

        for entry in &self.entries {
            if entry.tensor.tensor_type().is_device_resident() {
                entry
                    .tensor
                    .record_copy_staging_to_device(command_buffer, entry.copy_region())?;
            }
        }
        Ok(())
    }

    fn post_eval(&self, _command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        debug!("{} post_eval called", OP_NAME);
        Ok(())
    }
}
