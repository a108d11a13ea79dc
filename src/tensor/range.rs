use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use vulkanalia::vk;

use super::sync_tensor::SyncTensor;

/// A sub-range of a tensor in elements, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SyncRange {
    pub offset: u32,
    pub length: u32,
}

impl SyncRange {
    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Byte copy region for a tensor with `element_size` byte elements.
    /// Staging and device buffers share a layout, so source and destination offsets match.
    pub fn to_buffer_copy(&self, element_size: usize) -> vk::BufferCopy {
        let element_size = element_size as vk::DeviceSize;
        let offset = self.offset as vk::DeviceSize * element_size;

        vk::BufferCopy {
            src_offset: offset,
            dst_offset: offset,
            size: self.length as vk::DeviceSize * element_size,
        }
    }
}

impl From<(u32, u32)> for SyncRange {
    fn from((offset, length): (u32, u32)) -> Self {
        Self { offset, length }
    }
}

/// A tensor paired with the range to sync. No range means the whole tensor.
#[derive(Clone)]
pub struct SyncEntry {
    pub tensor: Arc<dyn SyncTensor>,
    pub range: Option<SyncRange>,
}

impl SyncEntry {
    pub fn whole(tensor: Arc<dyn SyncTensor>) -> Self {
        Self {
            tensor,
            range: None,
        }
    }

    pub fn ranged(tensor: Arc<dyn SyncTensor>, range: SyncRange) -> Self {
        Self {
            tensor,
            range: Some(range),
        }
    }

    pub fn copy_region(&self) -> Option<vk::BufferCopy> {
        self.range
            .map(|range| range.to_buffer_copy(self.tensor.element_size()))
    }
}

impl Debug for SyncEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.range {
            Some(range) => write!(
                f,
                "{:?}[{}..+{}]",
                self.tensor.tensor_type(),
                range.offset,
                range.length
            ),
            None => write!(f, "{:?}[..]", self.tensor.tensor_type()),
        }
    }
}
