// ── Reading sink ──
//
// Where extracted readings go. The session machine pushes every batch it
// decodes; sinks are expected to be idempotent, and `MemorySink` performs
// the no-op check itself (same value, same flame flag -> skip) so hosts
// are not spammed with redundant updates.

use std::collections::HashMap;

use tracing::debug;

use crate::reading::{Reading, SensorKey};

/// Receiver of extracted readings.
pub trait ReadingSink {
    /// Publish one reading. Returns `true` if the stored value changed.
    fn upsert(&mut self, reading: &Reading) -> bool;
}

/// In-memory sink keeping the latest value per sensor.
///
/// Deduplicates on (value, flame) so downstream consumers only see real
/// changes. Also serves as the snapshot source for one-shot renders.
#[derive(Debug, Default)]
pub struct MemorySink {
    values: HashMap<SensorKey, Reading>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest reading for a sensor, if any poll has produced one.
    pub fn latest(&self, key: SensorKey) -> Option<&Reading> {
        self.values.get(&key)
    }

    /// All latest readings, in no particular order.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.values.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ReadingSink for MemorySink {
    fn upsert(&mut self, reading: &Reading) -> bool {
        match self.values.get(&reading.key) {
            Some(prev) if prev.value == reading.value && prev.flame == reading.flame => {
                debug!(key = ?reading.key, "reading unchanged, skipping update");
                false
            }
            _ => {
                self.values.insert(reading.key, reading.clone());
                true
            }
        }
    }
}
