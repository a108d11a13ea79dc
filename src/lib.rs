//! vksync - Tensor synchronisation operations for Vulkan compute
//!
//! Keeps device local tensor memory consistent with host visible staging memory
//! by recording copies, barriers and cache maintenance as operations that an
//! orchestrator drives through a pre_eval / record / post_eval protocol.

mod gpu;

mod operation;

mod sequence;

mod tensor;

mod utils;

pub use gpu::{Gpu, GpuConfig};
pub use operation::{
    operation::Operation, sync_device, sync_device::OpTensorSyncDevice, sync_local,
    sync_local::OpTensorSyncLocal,
};
pub use sequence::{Sequence, SequenceConfig};
pub use tensor::{SyncEntry, SyncRange, SyncTensor, Tensor, TensorType};
pub use utils::{bytes, error};
