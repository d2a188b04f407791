//! Buffer decorators
//!
//! The builder never hands a pipeline its raw buffer plugin. Decoration is
//! an ordered, data-driven list of wrapping steps:
//!
//! 1. always fan-out over the primary buffer plus any peer receive buffers,
//! 2. then, only for pipelines fed by a real source, circuit breaking when
//!    a process-wide breaker is configured.
//!
//! Connector-fed pipelines skip the breaker so that records already inside
//! a chain drain through it even while the breaker refuses new intake.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use weir_model::{Buffer, BufferError, Record};

use crate::breaker::CircuitBreaker;

/// Writes to a primary buffer and a set of secondary buffers; reads only
/// from the primary
///
/// Secondary writes are best-effort: a full secondary cannot retract a
/// record the primary already admitted, so its failure is logged and the
/// write succeeds.
pub struct FanOutBuffer {
    primary: Arc<dyn Buffer>,
    secondaries: Vec<Arc<dyn Buffer>>,
}

impl FanOutBuffer {
    pub fn new(primary: Arc<dyn Buffer>, secondaries: Vec<Arc<dyn Buffer>>) -> Self {
        Self {
            primary,
            secondaries,
        }
    }
}

impl Buffer for FanOutBuffer {
    fn write(&self, record: Record, timeout: Duration) -> Result<(), BufferError> {
        self.primary.write(record.clone(), timeout)?;
        for secondary in &self.secondaries {
            if let Err(e) = secondary.write(record.clone(), timeout) {
                debug!(error = %e, "secondary buffer rejected record");
            }
        }
        Ok(())
    }

    fn write_all(&self, records: Vec<Record>, timeout: Duration) -> Result<(), BufferError> {
        if self.secondaries.is_empty() {
            return self.primary.write_all(records, timeout);
        }
        self.primary.write_all(records.clone(), timeout)?;
        for secondary in &self.secondaries {
            if let Err(e) = secondary.write_all(records.clone(), timeout) {
                debug!(error = %e, "secondary buffer rejected batch");
            }
        }
        Ok(())
    }

    fn read(&self, timeout: Duration) -> Vec<Record> {
        self.primary.read(timeout)
    }

    fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondaries.iter().all(|b| b.is_empty())
    }
}

/// Refuses writes while the breaker is open; reads pass through so the
/// pipeline keeps draining
pub struct CircuitBreakingBuffer {
    inner: Arc<dyn Buffer>,
    breaker: Arc<dyn CircuitBreaker>,
}

impl CircuitBreakingBuffer {
    pub fn new(inner: Arc<dyn Buffer>, breaker: Arc<dyn CircuitBreaker>) -> Self {
        Self { inner, breaker }
    }
}

impl Buffer for CircuitBreakingBuffer {
    fn write(&self, record: Record, timeout: Duration) -> Result<(), BufferError> {
        if self.breaker.is_open() {
            return Err(BufferError::CircuitOpen);
        }
        self.inner.write(record, timeout)
    }

    fn write_all(&self, records: Vec<Record>, timeout: Duration) -> Result<(), BufferError> {
        if self.breaker.is_open() {
            return Err(BufferError::CircuitOpen);
        }
        self.inner.write_all(records, timeout)
    }

    fn read(&self, timeout: Duration) -> Vec<Record> {
        self.inner.read(timeout)
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

type DecorationStep = Box<dyn FnOnce(Arc<dyn Buffer>) -> Arc<dyn Buffer>>;

/// Apply the decoration chain for one pipeline's buffer
pub(crate) fn decorate_buffer(
    primary: Arc<dyn Buffer>,
    secondaries: Vec<Arc<dyn Buffer>>,
    source_is_connector: bool,
    breaker: Option<Arc<dyn CircuitBreaker>>,
) -> Arc<dyn Buffer> {
    let mut steps: Vec<DecorationStep> = vec![Box::new(move |buffer| {
        Arc::new(FanOutBuffer::new(buffer, secondaries))
    })];

    if !source_is_connector
        && let Some(breaker) = breaker
    {
        steps.push(Box::new(move |buffer| {
            Arc::new(CircuitBreakingBuffer::new(buffer, breaker))
        }));
    }

    steps.into_iter().fold(primary, |buffer, step| step(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    use crate::breaker::ManualBreaker;

    struct VecBuffer {
        records: Mutex<Vec<Record>>,
        full: bool,
    }

    impl VecBuffer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                full: false,
            })
        }

        fn full() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                full: true,
            })
        }

        fn len(&self) -> usize {
            self.records.lock().len()
        }
    }

    impl Buffer for VecBuffer {
        fn write(&self, record: Record, _timeout: Duration) -> Result<(), BufferError> {
            if self.full {
                return Err(BufferError::WriteTimeout { timeout_ms: 0 });
            }
            self.records.lock().push(record);
            Ok(())
        }

        fn read(&self, _timeout: Duration) -> Vec<Record> {
            std::mem::take(&mut self.records.lock())
        }

        fn is_empty(&self) -> bool {
            self.records.lock().is_empty()
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(10);

    #[test]
    fn test_fan_out_writes_everywhere_reads_primary() {
        let primary = VecBuffer::new();
        let secondary = VecBuffer::new();
        let fan_out = FanOutBuffer::new(primary.clone(), vec![secondary.clone()]);

        fan_out
            .write_all(
                vec![Record::from_string("a"), Record::from_string("b")],
                TIMEOUT,
            )
            .unwrap();
        assert_eq!(primary.len(), 2);
        assert_eq!(secondary.len(), 2);
        assert!(!fan_out.is_empty());

        assert_eq!(fan_out.read(TIMEOUT).len(), 2);
        assert!(primary.is_empty());
        // Secondary still holds records, so the fan-out is not drained
        assert!(!fan_out.is_empty());
    }

    #[test]
    fn test_fan_out_full_secondary_does_not_fail_write() {
        let primary = VecBuffer::new();
        let fan_out = FanOutBuffer::new(primary.clone(), vec![VecBuffer::full()]);

        fan_out.write(Record::from_string("a"), TIMEOUT).unwrap();
        assert_eq!(primary.len(), 1);
    }

    #[test]
    fn test_fan_out_full_primary_fails_write() {
        let fan_out = FanOutBuffer::new(VecBuffer::full(), vec![VecBuffer::new()]);
        assert!(fan_out.write(Record::from_string("a"), TIMEOUT).is_err());
    }

    #[test]
    fn test_circuit_breaking_buffer() {
        let inner = VecBuffer::new();
        let breaker = Arc::new(ManualBreaker::new());
        let buffer = CircuitBreakingBuffer::new(inner.clone(), breaker.clone());

        buffer.write(Record::from_string("a"), TIMEOUT).unwrap();

        breaker.open();
        assert_eq!(
            buffer.write(Record::from_string("b"), TIMEOUT),
            Err(BufferError::CircuitOpen)
        );
        // Reads keep draining while the breaker is open
        assert_eq!(buffer.read(TIMEOUT).len(), 1);

        breaker.close();
        buffer.write(Record::from_string("c"), TIMEOUT).unwrap();
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_decoration_skips_breaker_for_connector_sources() {
        let breaker = Arc::new(ManualBreaker::new());
        breaker.open();

        let gated = decorate_buffer(VecBuffer::new(), Vec::new(), false, Some(breaker.clone()));
        assert_eq!(
            gated.write(Record::from_string("a"), TIMEOUT),
            Err(BufferError::CircuitOpen)
        );

        let ungated = decorate_buffer(VecBuffer::new(), Vec::new(), true, Some(breaker));
        ungated.write(Record::from_string("a"), TIMEOUT).unwrap();
    }
}
