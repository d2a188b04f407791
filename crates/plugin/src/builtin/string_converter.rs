//! String converter processor
//!
//! Upper- or lowercases string payloads: plain string records and the
//! `message` field of object records. Instantiated once per worker; each
//! instance keeps its own conversion counter.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use weir_model::{PluginSetting, Processor, Record};

use crate::error::Result;
use crate::registry::{Instantiation, ProcessorFactory};

/// Processor converting string payloads to upper or lower case
pub struct StringConverterProcessor {
    upper: bool,
    converted: AtomicU64,
}

impl StringConverterProcessor {
    /// Create a converter; `upper` selects uppercase (true) or lowercase
    pub fn new(upper: bool) -> Self {
        Self {
            upper,
            converted: AtomicU64::new(0),
        }
    }

    /// How many values this instance has converted
    pub fn converted(&self) -> u64 {
        self.converted.load(Ordering::Relaxed)
    }

    fn convert(&self, s: &str) -> String {
        self.converted.fetch_add(1, Ordering::Relaxed);
        if self.upper {
            s.to_uppercase()
        } else {
            s.to_lowercase()
        }
    }
}

impl Processor for StringConverterProcessor {
    fn execute(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .map(|mut record| {
                match record.data_mut() {
                    Value::String(s) => *s = self.convert(s),
                    Value::Object(map) => {
                        if let Some(Value::String(s)) = map.get_mut("message") {
                            *s = self.convert(s);
                        }
                    }
                    _ => {}
                }
                record
            })
            .collect()
    }
}

/// Factory for the `string_converter` processor
///
/// Attributes: `upper_case` (default true). One instance per worker.
pub struct StringConverterFactory;

impl ProcessorFactory for StringConverterFactory {
    fn create(&self, setting: &PluginSetting) -> Result<Box<dyn Processor>> {
        let upper = setting.attribute_bool("upper_case").unwrap_or(true);
        Ok(Box::new(StringConverterProcessor::new(upper)))
    }

    fn instantiation(&self) -> Instantiation {
        Instantiation::PerWorker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uppercases_string_records() {
        let processor = StringConverterProcessor::new(true);
        let out = processor.execute(vec![Record::from_string("hello")]);
        assert_eq!(out[0].data(), &json!("HELLO"));
        assert_eq!(processor.converted(), 1);
    }

    #[test]
    fn test_lowercases_message_field() {
        let processor = StringConverterProcessor::new(false);
        let out = processor.execute(vec![Record::new(json!({"message": "LOUD", "level": 3}))]);
        assert_eq!(out[0].get("message"), Some(&json!("loud")));
        assert_eq!(out[0].get("level"), Some(&json!(3)));
    }

    #[test]
    fn test_non_string_payloads_untouched() {
        let processor = StringConverterProcessor::new(true);
        let out = processor.execute(vec![Record::new(json!(42))]);
        assert_eq!(out[0].data(), &json!(42));
        assert_eq!(processor.converted(), 0);
    }

    #[test]
    fn test_factory_is_per_worker() {
        assert_eq!(
            StringConverterFactory.instantiation(),
            Instantiation::PerWorker
        );
    }
}
