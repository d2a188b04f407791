//! Blocking buffer - bounded in-memory queue
//!
//! The default pipeline buffer: a capacity-bounded `VecDeque` guarded by a
//! mutex with two condvars. Writers block (up to the caller's timeout) when
//! the queue is full; readers block waiting for data and drain at most one
//! batch per call.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use weir_model::{Buffer, BufferError, PluginSetting, Record};

use crate::error::{PluginError, Result};
use crate::registry::{BufferFactory, ComponentKind};

const DEFAULT_CAPACITY: usize = 12800;
const DEFAULT_BATCH_SIZE: usize = 200;

/// Bounded in-memory blocking buffer
pub struct BlockingBuffer {
    capacity: usize,
    batch_size: usize,
    queue: Mutex<VecDeque<Record>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl BlockingBuffer {
    /// Create a buffer with the given capacity and read batch size
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            capacity,
            batch_size,
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Maximum number of queued records
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum records returned by one `read`
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Current queue depth
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Default for BlockingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_BATCH_SIZE)
    }
}

impl Buffer for BlockingBuffer {
    fn write(&self, record: Record, timeout: Duration) -> std::result::Result<(), BufferError> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.queue.lock();

        while queue.len() >= self.capacity {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(BufferError::WriteTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            self.not_full.wait_for(&mut queue, remaining);
        }

        queue.push_back(record);
        self.not_empty.notify_one();
        Ok(())
    }

    fn read(&self, timeout: Duration) -> Vec<Record> {
        let mut queue = self.queue.lock();

        if queue.is_empty() && !timeout.is_zero() {
            self.not_empty.wait_for(&mut queue, timeout);
        }

        let n = queue.len().min(self.batch_size);
        if n == 0 {
            return Vec::new();
        }

        let batch: Vec<Record> = queue.drain(..n).collect();
        self.not_full.notify_all();
        batch
    }

    fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

/// Factory for the `blocking` buffer
///
/// Attributes: `capacity` (default 12800), `batch_size` (default 200).
pub struct BlockingBufferFactory;

impl BufferFactory for BlockingBufferFactory {
    fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Buffer>> {
        let capacity = positive_attr(setting, "capacity", DEFAULT_CAPACITY)?;
        let batch_size = positive_attr(setting, "batch_size", DEFAULT_BATCH_SIZE)?;
        Ok(Arc::new(BlockingBuffer::new(capacity, batch_size)))
    }
}

fn positive_attr(setting: &PluginSetting, key: &str, default: usize) -> Result<usize> {
    match setting.attribute_i64(key) {
        None => Ok(default),
        Some(v) if v > 0 => Ok(v as usize),
        Some(v) => Err(PluginError::invalid_configuration(
            ComponentKind::Buffer,
            setting.name(),
            format!("{key} must be positive, got {v}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let buffer = BlockingBuffer::new(4, 2);
        for i in 0..3 {
            buffer
                .write(Record::from_string(format!("r{i}")), Duration::ZERO)
                .unwrap();
        }

        // Batch size caps one read
        let batch = buffer.read(Duration::ZERO);
        assert_eq!(batch.len(), 2);
        let batch = buffer.read(Duration::ZERO);
        assert_eq!(batch.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_write_times_out_when_full() {
        let buffer = BlockingBuffer::new(1, 10);
        buffer
            .write(Record::from_string("a"), Duration::ZERO)
            .unwrap();

        let err = buffer
            .write(Record::from_string("b"), Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, BufferError::WriteTimeout { .. }));
    }

    #[test]
    fn test_blocked_writer_resumes_after_read() {
        let buffer = Arc::new(BlockingBuffer::new(1, 10));
        buffer
            .write(Record::from_string("a"), Duration::ZERO)
            .unwrap();

        let writer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                buffer.write(Record::from_string("b"), Duration::from_secs(2))
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(buffer.read(Duration::ZERO).len(), 1);

        writer.join().unwrap().unwrap();
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_factory_rejects_non_positive_capacity() {
        let setting = PluginSetting::new("blocking").with_attribute("capacity", 0);
        let err = BlockingBufferFactory.create(&setting).unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_factory_defaults() {
        let buffer = BlockingBufferFactory
            .create(&PluginSetting::new("blocking"))
            .unwrap();
        assert!(buffer.is_empty());
    }
}
