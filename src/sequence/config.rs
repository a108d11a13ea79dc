use crate::utils::error::VKSyncError;

pub struct SequenceConfig {
    /// How long `eval` waits for the GPU before giving up
    pub fence_timeout_ns: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            fence_timeout_ns: u64::MAX,
        }
    }
}

impl SequenceConfig {
    pub fn build(self) -> Result<Self, VKSyncError> {
        if self.fence_timeout_ns == 0 {
            return Err(VKSyncError::Config(
                "Fence timeout must be greater than 0".to_string(),
            ));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_waits_forever() {
        let config = SequenceConfig::default().build().unwrap();
        assert_eq!(config.fence_timeout_ns, u64::MAX);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = SequenceConfig {
            fence_timeout_ns: 0,
        }
        .build();

        assert!(matches!(result, Err(VKSyncError::Config(_))));
    }
}
