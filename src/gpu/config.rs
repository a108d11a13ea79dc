use crate::utils::error::VKSyncError;

pub struct GpuConfig {
    /// Physical device to open. None picks the first device with a compute queue.
    pub device_index: Option<usize>,
    pub application_name: String,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            application_name: "vksync".to_string(),
        }
    }
}

impl GpuConfig {
    pub fn build(self) -> Result<Self, VKSyncError> {
        if self.application_name.is_empty() {
            return Err(VKSyncError::Config(
                "Application name cannot be empty".to_string(),
            ));
        }

        if self.application_name.contains('\0') {
            return Err(VKSyncError::Config(format!(
                "Application name {:?} contains a nul byte",
                self.application_name
            )));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GpuConfig::default().build().unwrap();
        assert_eq!(config.device_index, None);
        assert_eq!(config.application_name, "vksync");
    }

    #[test]
    fn nul_in_application_name_is_rejected() {
        let result = GpuConfig {
            application_name: "vk\0sync".to_string(),
            ..Default::default()
        }
        .build();

        assert!(matches!(result, Err(VKSyncError::Config(_))));
    }

    #[test]
    fn empty_application_name_is_rejected() {
        let result = GpuConfig {
            application_name: String::new(),
            ..Default::default()
        }
        .build();

        assert!(matches!(result, Err(VKSyncError::Config(_))));
    }
}
