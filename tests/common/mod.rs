#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use vksync::{SyncTensor, TensorType, error::VKSyncError};
use vulkanalia::vk;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Flush(usize),
    Invalidate(usize),
    CopyToDevice(usize, Region),
    CopyToStaging(usize, Region),
    Barrier(usize, Barrier),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Barrier {
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

pub const SHADER_TO_TRANSFER: Barrier = Barrier {
    src_access: vk::AccessFlags::SHADER_WRITE,
    dst_access: vk::AccessFlags::TRANSFER_READ,
    src_stage: vk::PipelineStageFlags::COMPUTE_SHADER,
    dst_stage: vk::PipelineStageFlags::TRANSFER,
};

pub const TRANSFER_TO_HOST: Barrier = Barrier {
    src_access: vk::AccessFlags::TRANSFER_WRITE,
    dst_access: vk::AccessFlags::HOST_READ,
    src_stage: vk::PipelineStageFlags::TRANSFER,
    dst_stage: vk::PipelineStageFlags::HOST,
};

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

/// Records every contract call into a log shared between tensors, so the
/// interleaving across a batch is observable.
pub struct MockTensor {
    id: usize,
    tensor_type: TensorType,
    element_size: usize,
    element_count: usize,
    log: CallLog,
}

impl MockTensor {
    pub fn new(
        id: usize,
        tensor_type: TensorType,
        element_count: usize,
        element_size: usize,
        log: &CallLog,
    ) -> Arc<dyn SyncTensor> {
        Arc::new(Self {
            id,
            tensor_type,
            element_size,
            element_count,
            log: Arc::clone(log),
        })
    }

    fn size_in_bytes(&self) -> u64 {
        (self.element_count * self.element_size) as u64
    }

    fn resolve(&self, region: Option<vk::BufferCopy>) -> Result<Region, VKSyncError> {
        let region = match region {
            Some(r) => Region {
                src_offset: r.src_offset,
                dst_offset: r.dst_offset,
                size: r.size,
            },
            None => Region {
                src_offset: 0,
                dst_offset: 0,
                size: self.size_in_bytes(),
            },
        };

        if region.src_offset + region.size > self.size_in_bytes()
            || region.dst_offset + region.size > self.size_in_bytes()
        {
            return Err(VKSyncError::Tensor(format!(
                "region {:?} outside tensor {}",
                region, self.id
            )));
        }

        Ok(region)
    }

    fn push(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

impl SyncTensor for MockTensor {
    fn tensor_type(&self) -> TensorType {
        self.tensor_type
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn flush(&self) -> Result<(), VKSyncError> {
        self.push(Call::Flush(self.id));
        Ok(())
    }

    fn invalidate(&self) -> Result<(), VKSyncError> {
        self.push(Call::Invalidate(self.id));
        Ok(())
    }

    fn record_copy_staging_to_device(
        &self,
        _command_buffer: vk::CommandBuffer,
        region: Option<vk::BufferCopy>,
    ) -> Result<(), VKSyncError> {
        let region = self.resolve(region)?;
        self.push(Call::CopyToDevice(self.id, region));
        Ok(())
    }

    fn record_copy_device_to_staging(
        &self,
        _command_buffer: vk::CommandBuffer,
        region: Option<vk::BufferCopy>,
    ) -> Result<(), VKSyncError> {
        let region = self.resolve(region)?;
        self.push(Call::CopyToStaging(self.id, region));
        Ok(())
    }

    fn record_primary_buffer_barrier(
        &self,
        _command_buffer: vk::CommandBuffer,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
    ) {
        self.push(Call::Barrier(
            self.id,
            Barrier {
                src_access,
                dst_access,
                src_stage,
                dst_stage,
            },
        ));
    }
}
