use crate::model::{ExtractionResult, Site};
use std::collections::BTreeMap;
use tracing::warn;

/// Positional result collection: results arrive in any order tagged with
/// the index of their input URL.
pub struct ResultSlots {
    slots: Vec<Option<ExtractionResult>>,
}

impl ResultSlots {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn place(&mut self, index: usize, result: ExtractionResult) {
        match self.slots.get_mut(index) {
            Some(slot @ None) => *slot = Some(result),
            Some(Some(_)) => warn!("Duplicate result for slot {}, keeping the first", index),
            None => warn!("Result index {} out of range ({} slots)", index, self.slots.len()),
        }
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Produces one record per input URL. Empty slots become `Error`
    /// records carrying `missing_reason`.
    pub fn into_results(self, urls: &[String], missing_reason: &str) -> Vec<ExtractionResult> {
        self.slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| slot.unwrap_or_else(|| ExtractionResult::failed(url, missing_reason)))
            .collect()
    }
}

/// Per-site counts for the end-of-batch log line.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub by_site: BTreeMap<&'static str, usize>,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ExtractionResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            *summary.by_site.entry(result.site.label()).or_default() += 1;
            if result.site == Site::Error {
                summary.errors += 1;
            }
        }
        summary
    }
}
