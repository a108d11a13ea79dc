pub mod allocator;
pub mod config;
pub mod gpu_memory;
pub mod vk_gpu;

pub use config::GpuConfig;
pub use vk_gpu::Gpu;
