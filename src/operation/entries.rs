use std::sync::Arc;

use crate::{
    tensor::{SyncEntry, SyncRange, SyncTensor},
    utils::error::VKSyncError,
};

/// Pair tensors with ranges by position. `ranges` is either empty (whole
/// tensors) or holds exactly one range per tensor.
pub fn pair_ranges(
    op_name: &str,
    tensors: Vec<Arc<dyn SyncTensor>>,
    ranges: Vec<SyncRange>,
) -> Result<Vec<SyncEntry>, VKSyncError> {
    if ranges.is_empty() {
        return Ok(tensors.into_iter().map(SyncEntry::whole).collect());
    }

    if ranges.len() != tensors.len() {
        return Err(VKSyncError::InvalidArgument(format!(
            "{} given {} ranges for {} tensors",
            op_name,
            ranges.len(),
            tensors.len()
        )));
    }

    Ok(tensors
        .into_iter()
        .zip(ranges)
        .map(|(tensor, range)| SyncEntry::ranged(tensor, range))
        .collect())
}

pub fn require_entries(op_name: &str, entries: &[SyncEntry]) -> Result<(), VKSyncError> {
    if entries.is_empty() {
        return Err(VKSyncError::InvalidArgument(format!(
            "{} called with less than 1 tensor",
            op_name
        )));
    }
    Ok(())
}
