use std::{ffi::CString, ptr};

use log::{debug, info};
use vulkanalia::{
    Device, Entry, Instance,
    loader::{LIBRARY, LibloadingLoader},
    vk::{self, DeviceV1_0, InstanceV1_0},
};

use crate::utils::error::VKSyncError;

use super::config::GpuConfig;

pub struct Gpu {
    _entry: Entry,
    instance: Instance,
    device: Device,
    name: String,
    queue: vk::Queue,
    command_pool: vk::CommandPool,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
}

impl Gpu {
    pub fn new(config: &GpuConfig) -> Result<Self, VKSyncError> {
        unsafe {
            let loader = LibloadingLoader::new(LIBRARY)
                .map_err(|e| VKSyncError::Gpu(format!("Failed to load Vulkan library: {}", e)))?;
            let entry = Entry::new(loader)
                .map_err(|e| VKSyncError::Gpu(format!("Failed to create Vulkan entry: {}", e)))?;

            let aname = CString::new(config.application_name.as_str())
                .map_err(|e| VKSyncError::Config(e.to_string()))?;

            let appinfo = vk::ApplicationInfo {
                s_type: vk::StructureType::APPLICATION_INFO,
                next: ptr::null(),
                application_name: aname.as_ptr(),
                application_version: vk::make_version(1, 0, 0),
                engine_name: aname.as_ptr(),
                engine_version: vk::make_version(1, 0, 0),
                api_version: vk::make_version(1, 0, 0),
            };

            let create_info = vk::InstanceCreateInfo {
                s_type: vk::StructureType::INSTANCE_CREATE_INFO,
                next: ptr::null(),
                flags: vk::InstanceCreateFlags::empty(),
                application_info: &appinfo,
                enabled_layer_count: 0,
                enabled_layer_names: ptr::null(),
                enabled_extension_count: 0,
                enabled_extension_names: ptr::null(),
            };

            let instance = entry.create_instance(&create_info, None)?;

            let selected = match Self::select_physical_device(&instance, config.device_index) {
                Ok(selected) => selected,
                Err(e) => {
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };
            let (physical_device, queue_family_index) = selected;

            let properties = instance.get_physical_device_properties(physical_device);
            let name = properties.device_name.to_string_lossy().into_owned();

            let queue_priorities = [1.0f32];
            let queue_info = vk::DeviceQueueCreateInfo {
                s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                next: ptr::null(),
                flags: vk::DeviceQueueCreateFlags::empty(),
                queue_family_index,
                queue_count: 1,
                queue_priorities: queue_priorities.as_ptr(),
            };

            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo {
                s_type: vk::StructureType::DEVICE_CREATE_INFO,
                next: ptr::null(),
                flags: vk::DeviceCreateFlags::empty(),
                queue_create_info_count: 1,
                queue_create_infos: &queue_info,
                enabled_layer_count: 0,
                enabled_layer_names: ptr::null(),
                enabled_extension_count: 0,
                enabled_extension_names: ptr::null(),
                enabled_features: &device_features,
            };

            let device =
                match instance.create_device(physical_device, &device_create_info, None) {
                    Ok(device) => device,
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e.into());
                    }
                };

            let queue = device.get_device_queue(queue_family_index, 0);

            let command_pool_info = vk::CommandPoolCreateInfo {
                s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
                next: ptr::null(),
                flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
                queue_family_index,
            };

            let command_pool = match device.create_command_pool(&command_pool_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    device.destroy_device(None);
                    instance.destroy_instance(None);
                    return Err(e.into());
                }
            };

            let memory_properties = instance.get_physical_device_memory_properties(physical_device);

            info!(
                "Opened GPU '{}' (queue family {})",
                name, queue_family_index
            );

            Ok(Self {
                _entry: entry,
                instance,
                device,
                name,
                queue,
                command_pool,
                memory_properties,
            })
        }
    }

    // Returns the physical device and the index of its first compute capable queue family
    fn select_physical_device(
        instance: &Instance,
        device_index: Option<usize>,
    ) -> Result<(vk::PhysicalDevice, u32), VKSyncError> {
        let physical_devices = unsafe { instance.enumerate_physical_devices()? };

        let compute_family = |physical_device: vk::PhysicalDevice| -> Option<u32> {
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) }
                .iter()
                .position(|properties| properties.queue_flags.contains(vk::QueueFlags::COMPUTE))
                .map(|index| index as u32)
        };

        match device_index {
            Some(idx) => {
                let physical_device = *physical_devices.get(idx).ok_or_else(|| {
                    VKSyncError::Gpu(format!(
                        "GPU index {} out of range, {} devices found",
                        idx,
                        physical_devices.len()
                    ))
                })?;

                let family = compute_family(physical_device).ok_or_else(|| {
                    VKSyncError::Gpu(format!("GPU {} has no compute queue family", idx))
                })?;

                Ok((physical_device, family))
            }
            None => physical_devices
                .iter()
                .find_map(|&physical_device| {
                    compute_family(physical_device).map(|family| (physical_device, family))
                })
                .ok_or_else(|| VKSyncError::Gpu("No GPU with a compute queue found".to_string())),
        }
    }

    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<u32, VKSyncError> {
        (0..self.memory_properties.memory_type_count)
            .find(|&i| {
                (type_filter & (1 << i)) != 0
                    && self.memory_properties.memory_types[i as usize]
                        .property_flags
                        .contains(properties)
            })
            .ok_or_else(|| {
                VKSyncError::Gpu(format!(
                    "No memory type on '{}' matches filter {:#b} with {:?}",
                    self.name, type_filter, properties
                ))
            })
    }

    pub fn allocate_command_buffer(&self) -> Result<vk::CommandBuffer, VKSyncError> {
        let alloc_info = vk::CommandBufferAllocateInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
            next: ptr::null(),
            command_pool: self.command_pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
        };

        let buffers = unsafe { self.device.allocate_command_buffers(&alloc_info)? };

        buffers
            .into_iter()
            .next()
            .ok_or_else(|| VKSyncError::Vulkan("Failed to allocate command buffer".into()))
    }

    pub fn free_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device
                .free_command_buffers(self.command_pool, &[command_buffer]);
        }
    }

    pub fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        let begin_info = vk::CommandBufferBeginInfo {
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };

        unsafe { self.device.begin_command_buffer(command_buffer, &begin_info)? };
        Ok(())
    }

    pub fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        unsafe { self.device.end_command_buffer(command_buffer)? };
        Ok(())
    }

    pub fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
        unsafe {
            self.device.reset_command_buffer(
                command_buffer,
                vk::CommandBufferResetFlags::RELEASE_RESOURCES,
            )?
        };
        Ok(())
    }

    pub fn create_fence(&self) -> Result<vk::Fence, VKSyncError> {
        let fence_info = vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            next: ptr::null(),
            flags: vk::FenceCreateFlags::empty(),
        };

        Ok(unsafe { self.device.create_fence(&fence_info, None)? })
    }

    pub fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) };
    }

    pub fn submit_with_fence(
        &self,
        command_buffers: &[vk::CommandBuffer],
        fence: vk::Fence,
    ) -> Result<(), VKSyncError> {
        let submit_info = vk::SubmitInfo {
            command_buffer_count: command_buffers.len() as u32,
            command_buffers: command_buffers.as_ptr(),
            ..Default::default()
        };

        unsafe { self.device.queue_submit(self.queue, &[submit_info], fence)? };
        Ok(())
    }

    pub fn wait_and_reset_fence(&self, fence: vk::Fence, timeout_ns: u64) -> Result<(), VKSyncError> {
        let status = unsafe { self.device.wait_for_fences(&[fence], true, timeout_ns)? };

        if status == vk::SuccessCode::TIMEOUT {
            return Err(VKSyncError::Timeout(format!(
                "Fence on '{}' not signalled within {} ns",
                self.name, timeout_ns
            )));
        }

        unsafe { self.device.reset_fences(&[fence])? };
        debug!("Fence signalled and reset on '{}'", self.name);
        Ok(())
    }

    pub fn wait_idle(&self) -> Result<(), VKSyncError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    pub fn get_device(&self) -> &Device {
        &self.device
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Gpu {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
