use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::models::Hospital;

/// In-memory hospital registry keyed by pincode.
///
/// Loaded once from CSV at startup and shared immutably across requests.
#[derive(Debug, Default)]
pub struct HospitalRegistry {
    by_pincode: HashMap<String, Vec<Hospital>>,
    total: usize,
}

impl HospitalRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open hospital registry at {}", path.display()))?;

        let mut by_pincode: HashMap<String, Vec<Hospital>> = HashMap::new();
        let mut total = 0;
        for record in reader.deserialize() {
            let hospital: Hospital = record
                .with_context(|| format!("malformed hospital record in {}", path.display()))?;
            by_pincode
                .entry(hospital.pincode.clone())
                .or_default()
                .push(hospital);
            total += 1;
        }

        tracing::info!("Loaded {} hospitals covering {} pincodes", total, by_pincode.len());

        Ok(Self { by_pincode, total })
    }

    /// All hospitals registered for the pincode; empty if none
    pub fn find_by_pincode(&self, pincode: &str) -> &[Hospital] {
        self.by_pincode
            .get(pincode)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
