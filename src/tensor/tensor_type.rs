/// Residency of a tensor's memory, fixed when the tensor is allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorType {
    /// Device local buffer plus a host visible coherent staging buffer
    Device,
    /// Device local buffer plus a host visible cached staging buffer.
    /// Host writes need a flush and device writes need an invalidate.
    DeviceCached,
    /// Host visible only, the host side of a transfer pair
    Staging,
    /// Host visible and directly mapped, never copied
    Host,
}

impl TensorType {
    pub fn all() -> Vec<TensorType> {
        vec![
            TensorType::Device,
            TensorType::DeviceCached,
            TensorType::Staging,
            TensorType::Host,
        ]
    }

    /// Has a device local primary buffer that sync operations copy to and from.
    pub fn is_device_resident(&self) -> bool {
        matches!(self, TensorType::Device | TensorType::DeviceCached)
    }

    /// Has host visible memory that needs explicit flush and invalidate.
    pub fn has_host_cache(&self) -> bool {
        matches!(self, TensorType::DeviceCached)
    }
}
