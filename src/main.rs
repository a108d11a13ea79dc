use std::sync::Arc;

use log::info;
use rand::Rng;
use vksync::{
    Gpu, GpuConfig, Sequence, SequenceConfig, SyncRange, SyncTensor, Tensor, TensorType,
    bytes::{as_bytes, f32_from_bytes},
    error::VKSyncError,
    sync_device, sync_local,
};

// Round trip random data through device local memory, then pull back a sub-range only.
fn main() -> Result<(), VKSyncError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let gpu = Arc::new(Gpu::new(&GpuConfig::default().build()?)?);
    let mut sequence = Sequence::new(Arc::clone(&gpu), SequenceConfig::default())?;

    let mut rng = rand::rng();
    let values: Vec<f32> = (0..1024).map(|_| rng.random_range(-1.0..1.0)).collect();

    let cached = Arc::new(Tensor::new(
        &gpu,
        TensorType::DeviceCached,
        as_bytes(&values),
        std::mem::size_of::<f32>(),
    )?);
    let device = Arc::new(Tensor::new(
        &gpu,
        TensorType::Device,
        as_bytes(&values),
        std::mem::size_of::<f32>(),
    )?);

    let cached_handle: Arc<dyn SyncTensor> = cached.clone();
    let device_handle: Arc<dyn SyncTensor> = device.clone();

    sequence.record(sync_device(
        vec![Arc::clone(&cached_handle), Arc::clone(&device_handle)],
        vec![],
    )?);
    sequence.eval()?;

    // Clobber the host copies, only the device copies still hold the values
    let zeros = vec![0f32; values.len()];
    cached.write_data(as_bytes(&zeros))?;
    cached.flush()?;
    device.write_data(as_bytes(&zeros))?;

    let range = SyncRange::new(256, 512);
    sequence
        .record(sync_local(vec![cached_handle], vec![])?)
        .record(sync_local(vec![device_handle], vec![range])?);
    sequence.eval()?;

    let cached_back = f32_from_bytes(&cached.read_data()?);
    let device_back = f32_from_bytes(&device.read_data()?);

    let start = range.offset as usize;
    let end = start + range.length as usize;
    let cached_ok = cached_back == values;
    let range_ok = device_back[start..end] == values[start..end];
    let outside_untouched = device_back[..start].iter().all(|&v| v == 0.0)
        && device_back[end..].iter().all(|&v| v == 0.0);

    info!(
        "GPU '{}': full pull {}, ranged pull {}, outside range untouched {}",
        gpu.name(),
        cached_ok,
        range_ok,
        outside_untouched
    );

    if cached_ok && range_ok && outside_untouched {
        Ok(())
    } else {
        Err(VKSyncError::Tensor(
            "Round trip through device memory returned different data".to_string(),
        ))
    }
}
