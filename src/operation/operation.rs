use std::fmt::Debug;

use vulkanalia::vk;

use crate::utils::error::VKSyncError;

/// A unit of recorded work. The orchestrator calls each phase exactly once
/// per pass, in order: `pre_eval`, `record`, submission, `post_eval`.
pub trait Operation: Debug {
    /// Host side work before any recorded command runs
    fn pre_eval(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError>;

    /// Record commands into an already begun command buffer, nothing executes yet
    fn record(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError>;

    /// Host side work after the command buffer has finished executing
    fn post_eval(&self, command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError>;
}
