use crate::core::RawSample;
use std::collections::VecDeque;
use std::sync::Mutex;

/// FIFO between a capture context and the frame loop.
///
/// One lock guards both `push` and the read-and-clear in `drain_all`, so a
/// batch becomes visible to the consumer entirely or not at all.
#[derive(Debug, Default)]
pub struct SampleQueue {
    samples: Mutex<VecDeque<RawSample>>,
}

impl SampleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample. Safe to call from a device callback thread.
    pub fn push(&self, sample: RawSample) {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(sample);
    }

    pub fn push_batch(&self, batch: impl IntoIterator<Item = RawSample>) {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(batch);
    }

    /// Take every buffered sample in arrival order, leaving the queue empty
    pub fn drain_all(&self) -> Vec<RawSample> {
        let mut guard = self.samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *guard).into()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clear();
    }
}
