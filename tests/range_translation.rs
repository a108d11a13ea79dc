mod common;

use common::{Call, MockTensor, Region, calls, new_log};
use proptest::prelude::*;
use vksync::{SyncRange, TensorType, sync_device, sync_local};
use vulkanalia::vk::{self, Handle};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Copy regions are the element range scaled by element size, with matching offsets
    #[test]
    fn ranged_copies_scale_by_element_size(
        element_size in prop::sample::select(vec![1usize, 2, 4, 8, 16]),
        offset in 0u32..1024,
        length in 1u32..1024,
        pull in any::<bool>(),
    ) {
        let log = new_log();
        let element_count = (offset + length) as usize;
        let tensors = vec![MockTensor::new(0, TensorType::Device, element_count, element_size, &log)];
        let ranges = vec![SyncRange::new(offset, length)];

        let operation = if pull {
            sync_local(tensors, ranges).unwrap()
        } else {
            sync_device(tensors, ranges).unwrap()
        };
        operation.record(vk::CommandBuffer::null()).unwrap();

        let expected = Region {
            src_offset: offset as u64 * element_size as u64,
            dst_offset: offset as u64 * element_size as u64,
            size: length as u64 * element_size as u64,
        };

        let copies: Vec<Region> = calls(&log)
            .into_iter()
            .filter_map(|call| match call {
                Call::CopyToDevice(_, region) | Call::CopyToStaging(_, region) => Some(region),
                _ => None,
            })
            .collect();

        prop_assert_eq!(copies, vec![expected]);
    }

    /// Without ranges every device resident tensor is copied over its full extent
    #[test]
    fn unranged_copies_span_whole_tensor(
        element_size in 1usize..32,
        element_count in 1usize..4096,
        cached in any::<bool>(),
    ) {
        let log = new_log();
        let tensor_type = if cached { TensorType::DeviceCached } else { TensorType::Device };
        let tensors = vec![MockTensor::new(7, tensor_type, element_count, element_size, &log)];

        sync_device(tensors, vec![]).unwrap().record(vk::CommandBuffer::null()).unwrap();

        let full = Region {
            src_offset: 0,
            dst_offset: 0,
            size: (element_count * element_size) as u64,
        };
        prop_assert_eq!(calls(&log), vec![Call::CopyToDevice(7, full)]);
    }
}
