use std::{
    collections::VecDeque,
    sync::{
        Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::error;

/// Sample FIFO shared between a cpal callback and the stream handle.
///
/// The callback side never blocks. The handle side waits on the condvar
/// with a deadline so a dead device surfaces as an error instead of a hang.
pub(crate) struct SampleQueue {
    samples: Mutex<VecDeque<i16>>,
    changed: Condvar,
    capacity: usize,
    failed: AtomicBool,
}

impl SampleQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            changed: Condvar::new(),
            capacity,
            failed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<i16>> {
        self.samples.lock().unwrap_or_else(|e| {
            error!("Sample queue lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    /// Callback side of an input stream. Oldest samples are dropped once
    /// the queue is full.
    pub(crate) fn push_overwrite(&self, data: impl IntoIterator<Item = i16>) {
        let mut buf = self.lock();
        buf.extend(data);
        while buf.len() > self.capacity {
            buf.pop_front();
        }
        self.changed.notify_all();
    }

    /// Handle side of an input stream: wait for exactly `count` samples.
    ///
    /// Returns `None` if the device failed or nothing arrived in time.
    pub(crate) fn pop_exact(&self, count: usize, timeout: Duration) -> Option<Vec<i16>> {
        let deadline = Instant::now() + timeout;
        let mut buf = self.lock();
        while buf.len() < count {
            if self.is_failed() {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            buf = match self.changed.wait_timeout(buf, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        Some(buf.drain(..count).collect())
    }

    /// Handle side of an output stream: wait for room, then enqueue.
    ///
    /// Returns `false` if the device failed or stopped consuming.
    pub(crate) fn push_blocking(&self, samples: &[i16], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut buf = self.lock();
        while !buf.is_empty() && buf.len() + samples.len() > self.capacity {
            if self.is_failed() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            buf = match self.changed.wait_timeout(buf, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        buf.extend(samples.iter().copied());
        true
    }

    /// Callback side of an output stream. Missing samples become silence.
    pub(crate) fn pop_into(&self, dest: &mut [f32]) {
        let mut buf = self.lock();
        for slot in dest.iter_mut() {
            *slot = buf.pop_front().map(i16_to_f32).unwrap_or(0.0);
        }
        self.changed.notify_all();
    }

    /// Wait until the callback has consumed everything queued.
    pub(crate) fn wait_empty(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut buf = self.lock();
        while !buf.is_empty() {
            if self.is_failed() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            buf = match self.changed.wait_timeout(buf, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
        self.changed.notify_all();
    }

    pub(crate) fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
        self.changed.notify_all();
    }

    pub(crate) fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// Unsigned samples are centred on 32768.
pub(crate) fn u16_to_i16(sample: u16) -> i16 {
    (i32::from(sample) - 32_768) as i16
}

pub(crate) fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / f32::from(i16::MAX)
}
