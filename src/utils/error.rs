use thiserror::Error;

#[derive(Error, Debug)]
pub enum VKSyncError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tensor error: {0}")]
    Tensor(String),

    #[error("Vulkan error: {0}")]
    Vulkan(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

// Convert vk::Result (Vulkan return codes) into VKSyncError
impl From<vulkanalia::vk::Result> for VKSyncError {
    fn from(r: vulkanalia::vk::Result) -> Self {
        VKSyncError::Vulkan(format!("vk::Result: {:?}", r))
    }
}

impl From<vulkanalia::vk::ErrorCode> for VKSyncError {
    fn from(c: vulkanalia::vk::ErrorCode) -> Self {
        VKSyncError::Vulkan(format!("vk::ErrorCode: {:?}", c))
    }
}
