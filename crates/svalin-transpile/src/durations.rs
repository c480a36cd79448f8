//! Instruction duration tables.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use svalin_ir::TimeUnit;

use crate::error::{TranspileError, TranspileResult};

/// A table of instruction durations keyed by name and qubit operands.
///
/// Entries with an empty qubit list act as wildcards: they answer for
/// the instruction name on any operands when no qubit-specific entry
/// exists. Values carry their own [`TimeUnit`]; queries in a different
/// unit are converted through the device `dt` when one is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionDurations {
    entries: FxHashMap<(String, Vec<u32>), (f64, TimeUnit)>,
    /// Device sample time in seconds, if known.
    dt: Option<f64>,
}

impl InstructionDurations {
    /// Create an empty table.
    pub fn new(dt: Option<f64>) -> Self {
        Self {
            entries: FxHashMap::default(),
            dt,
        }
    }

    /// Build a table from `(name, qubits, duration, unit)` tuples.
    ///
    /// An empty qubit list makes the entry a wildcard for that name.
    /// Later tuples override earlier ones with the same key.
    pub fn from_tuples(
        tuples: impl IntoIterator<Item = (String, Vec<u32>, f64, TimeUnit)>,
        dt: Option<f64>,
    ) -> Self {
        let mut table = Self::new(dt);
        for (name, qubits, duration, unit) in tuples {
            table.insert(name, qubits, duration, unit);
        }
        table
    }

    /// Insert or override one entry.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        qubits: Vec<u32>,
        duration: f64,
        unit: TimeUnit,
    ) {
        self.entries.insert((name.into(), qubits), (duration, unit));
    }

    /// Merge another table over this one; its entries win on conflict,
    /// and its `dt` wins when set.
    pub fn update(&mut self, other: &InstructionDurations) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), *value);
        }
        if other.dt.is_some() {
            self.dt = other.dt;
        }
    }

    /// Device sample time in seconds, if known.
    pub fn dt(&self) -> Option<f64> {
        self.dt
    }

    /// Set the device sample time.
    pub fn set_dt(&mut self, dt: Option<f64>) {
        self.dt = dt;
    }

    /// Number of entries, wildcards included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw lookup without unit conversion.
    ///
    /// Tries the qubit-specific entry first, then the wildcard.
    pub fn raw(&self, name: &str, qubits: &[u32]) -> Option<(f64, TimeUnit)> {
        let specific = (name.to_owned(), qubits.to_vec());
        if let Some(&v) = self.entries.get(&specific) {
            return Some(v);
        }
        let wildcard = (name.to_owned(), vec![]);
        self.entries.get(&wildcard).copied()
    }

    /// Duration of an instruction in the requested unit.
    ///
    /// Fails when the name/qubits pair has no entry or when conversion
    /// between `Dt` and `Seconds` is needed but `dt` is unknown.
    pub fn get(&self, name: &str, qubits: &[u32], unit: TimeUnit) -> TranspileResult<f64> {
        let (value, stored_unit) = self.raw(name, qubits).ok_or_else(|| {
            TranspileError::DurationUnresolved {
                name: name.to_owned(),
                qubits: qubits.to_vec(),
                reason: "no duration entry".to_owned(),
            }
        })?;
        self.convert(value, stored_unit, unit).map_err(|reason| {
            TranspileError::DurationUnresolved {
                name: name.to_owned(),
                qubits: qubits.to_vec(),
                reason,
            }
        })
    }

    /// Convert a value between time units through `dt`.
    pub fn convert(&self, value: f64, from: TimeUnit, to: TimeUnit) -> Result<f64, String> {
        if from == to {
            return Ok(value);
        }
        let Some(dt) = self.dt else {
            return Err(format!(
                "conversion between {from:?} and {to:?} requires dt, which is unknown"
            ));
        };
        Ok(match (from, to) {
            (TimeUnit::Seconds, TimeUnit::Dt) => value / dt,
            (TimeUnit::Dt, TimeUnit::Seconds) => value * dt,
            _ => unreachable!(),
        })
    }
}
