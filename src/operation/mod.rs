use std::sync::Arc;

use crate::{
    operation::{
        operation::Operation, sync_device::OpTensorSyncDevice, sync_local::OpTensorSyncLocal,
    },
    tensor::{SyncRange, SyncTensor},
    utils::error::VKSyncError,
};

mod entries;
pub mod operation;
pub mod sync_device;
pub mod sync_local;

pub fn sync_device(
    tensors: Vec<Arc<dyn SyncTensor>>,
    ranges: Vec<SyncRange>,
) -> Result<Box<dyn Operation>, VKSyncError> {
    Ok(Box::new(OpTensorSyncDevice::from_tensors(tensors, ranges)?))
}

pub fn sync_local(
    tensors: Vec<Arc<dyn SyncTensor>>,
    ranges: Vec<SyncRange>,
) -> Result<Box<dyn Operation>, VKSyncError> {
    Ok(Box::new(OpTensorSyncLocal::from_tensors(tensors, ranges)?))
}
