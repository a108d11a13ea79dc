use std::sync::Arc;

use log::{debug, warn};
use vulkanalia::vk;

use crate::{gpu::vk_gpu::Gpu, operation::operation::Operation, utils::error::VKSyncError};

use super::config::SequenceConfig;

/// Drives queued operations through one execution pass on a single command buffer.
pub struct Sequence {
    gpu: Arc<Gpu>,
    command_buffer: vk::CommandBuffer,
    fence: vk::Fence,
    fence_timeout_ns: u64,
    operations: Vec<Box<dyn Operation>>,
    submission: Submission,
}

/// Tracks whether the command buffer is still owned by the queue. A submission
/// that timed out stays in flight until a later wait observes its fence.
#[derive(Debug, Default)]
struct Submission {
    in_flight: bool,
}

impl Submission {
    fn begin(&mut self) {
        self.in_flight = true;
    }

    fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Run `wait` if work is outstanding. Stays in flight if `wait` fails.
    fn settle(
        &mut self,
        wait: impl FnOnce() -> Result<(), VKSyncError>,
    ) -> Result<(), VKSyncError> {
        if !self.in_flight {
            return Ok(());
        }

        wait()?;
        self.in_flight = false;
        Ok(())
    }
}

impl Sequence {
    pub fn new(gpu: Arc<Gpu>, config: SequenceConfig) -> Result<Self, VKSyncError> {
        let config = config.build()?;
        let command_buffer = gpu.allocate_command_buffer()?;
        let fence = match gpu.create_fence() {
            Ok(fence) => fence,
            Err(e) => {
                gpu.free_command_buffer(command_buffer);
                return Err(e);
            }
        };

        Ok(Self {
            gpu,
            command_buffer,
            fence,
            fence_timeout_ns: config.fence_timeout_ns,
            operations: Vec::new(),
            submission: Submission::default(),
        })
    }

    /// Queue an operation. Operations run in the order they are queued.
    pub fn record(&mut self, operation: Box<dyn Operation>) -> &mut Self {
        debug!("Sequence queued {:?}", operation);
        self.operations.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Run one pass over the queued operations and wait for the GPU.
    /// The operations are consumed once the pass starts, whether or not it
    /// succeeds. If an earlier pass timed out its fence is waited on first, and
    /// a second timeout returns `Timeout` with the queued operations kept.
    pub fn eval(&mut self) -> Result<(), VKSyncError> {
        let (gpu, fence, command_buffer, timeout) = (
            &self.gpu,
            self.fence,
            self.command_buffer,
            self.fence_timeout_ns,
        );
        // Fence wait then command buffer reset, the only way to reuse either
        let reclaim = || {
            gpu.wait_and_reset_fence(fence, timeout)?;
            gpu.reset_command_buffer(command_buffer)
        };

        if self.submission.is_in_flight() {
            debug!("Sequence waiting on a previous submission before eval");
        }
        self.submission.settle(reclaim)?;

        let operations = std::mem::take(&mut self.operations);
        if operations.is_empty() {
            return Ok(());
        }

        debug!("Sequence eval over {} operations", operations.len());

        pre_eval_all(&operations, command_buffer)?;

        gpu.begin_command_buffer(command_buffer)?;
        let recorded = record_all(&operations, command_buffer);
        gpu.end_command_buffer(command_buffer)?;

        if let Err(e) = recorded {
            gpu.reset_command_buffer(command_buffer)?;
            return Err(e);
        }

        gpu.submit_with_fence(&[command_buffer], fence)?;
        self.submission.begin();
        self.submission.settle(reclaim)?;

        post_eval_all(&operations, command_buffer)
    }
}

impl Drop for Sequence {
    fn drop(&mut self) {
        // A timed out submission may still be using the fence and command buffer
        if let Err(e) = self.gpu.wait_idle() {
            warn!("Waiting for GPU idle before dropping sequence failed: {}", e);
        }
        self.gpu.destroy_fence(self.fence);
        self.gpu.free_command_buffer(self.command_buffer);
    }
}

pub fn pre_eval_all(
    operations: &[Box<dyn Operation>],
    command_buffer: vk::CommandBuffer,
) -> Result<(), VKSyncError> {
    for operation in operations {
        operation.pre_eval(command_buffer)?;
    }
    Ok(())
}

pub fn record_all(
    operations: &[Box<dyn Operation>],
    command_buffer: vk::CommandBuffer,
) -> Result<(), VKSyncError> {
    for operation in operations {
        operation.record(command_buffer)?;
    }
    Ok(())
}

pub fn post_eval_all(
    operations: &[Box<dyn Operation>],
    command_buffer: vk::CommandBuffer,
) -> Result<(), VKSyncError> {
    for operation in operations {
        operation.post_eval(command_buffer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use vulkanalia::vk::Handle;

    use super::*;

    #[derive(Debug)]
    struct Traced {
        name: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
        fail_record: bool,
    }

    impl Traced {
        fn boxed(
            name: &'static str,
            trace: &Arc<Mutex<Vec<String>>>,
            fail_record: bool,
        ) -> Box<dyn Operation> {
            Box::new(Self {
                name,
                trace: Arc::clone(trace),
                fail_record,
            })
        }

        fn push(&self, phase: &str) {
            self.trace
                .lock()
                .unwrap()
                .push(format!("{}:{}", phase, self.name));
        }
    }

    impl Operation for Traced {
        fn pre_eval(&self, _command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
            self.push("pre");
            Ok(())
        }

        fn record(&self, _command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
            self.push("record");
            if self.fail_record {
                return Err(VKSyncError::Tensor(format!("{} refused to record", self.name)));
            }
            Ok(())
        }

        fn post_eval(&self, _command_buffer: vk::CommandBuffer) -> Result<(), VKSyncError> {
            self.push("post");
            Ok(())
        }
    }

    fn run_phases(operations: &[Box<dyn Operation>]) -> Result<(), VKSyncError> {
        let command_buffer = vk::CommandBuffer::null();
        pre_eval_all(operations, command_buffer)?;
        record_all(operations, command_buffer)?;
        post_eval_all(operations, command_buffer)
    }

    #[test]
    fn phases_complete_across_all_operations_in_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let operations = vec![
            Traced::boxed("a", &trace, false),
            Traced::boxed("b", &trace, false),
        ];

        run_phases(&operations).unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["pre:a", "pre:b", "record:a", "record:b", "post:a", "post:b"]
        );
    }

    #[test]
    fn idle_submission_skips_the_wait() {
        let mut submission = Submission::default();
        let mut waited = false;

        submission
            .settle(|| {
                waited = true;
                Ok(())
            })
            .unwrap();

        assert!(!waited);
        assert!(!submission.is_in_flight());
    }

    #[test]
    fn timed_out_submission_is_waited_on_again() {
        let mut submission = Submission::default();
        submission.begin();

        let timed_out = submission.settle(|| Err(VKSyncError::Timeout("fence".to_string())));
        assert!(matches!(timed_out, Err(VKSyncError::Timeout(_))));
        assert!(submission.is_in_flight());

        let still_pending = submission.settle(|| Err(VKSyncError::Timeout("fence".to_string())));
        assert!(matches!(still_pending, Err(VKSyncError::Timeout(_))));
        assert!(submission.is_in_flight());

        let mut waits = 0;
        submission
            .settle(|| {
                waits += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(waits, 1);
        assert!(!submission.is_in_flight());

        submission
            .settle(|| {
                waits += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(waits, 1);
    }

    #[test]
    fn record_failure_stops_before_post_eval() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let operations = vec![
            Traced::boxed("a", &trace, true),
            Traced::boxed("b", &trace, false),
        ];

        let result = run_phases(&operations);

        assert!(matches!(result, Err(VKSyncError::Tensor(_))));
        assert_eq!(*trace.lock().unwrap(), vec!["pre:a", "pre:b", "record:a"]);
    }
}
