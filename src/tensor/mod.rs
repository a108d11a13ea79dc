mod range;
pub use range::{SyncEntry, SyncRange};
mod sync_tensor;
pub use sync_tensor::SyncTensor;
mod tensor;
pub use tensor::Tensor;
mod tensor_type;
pub use tensor_type::TensorType;
