use crate::catalog::{catalog, StageEntry};
use crate::error::{PipelineError, Result};
use crate::opportunity::Opportunity;
use crate::types::Taxonomy;
use serde::Serialize;
use std::cmp::Reverse;

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Bucket<'a> {
    pub stage: &'static StageEntry,
    pub records: Vec<&'a Opportunity>,
}

/// Records grouped by stage, one bucket per catalog entry in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct Partition<'a> {
    pub taxonomy: Taxonomy,
    pub buckets: Vec<Bucket<'a>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    pub stage: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub total_value: f64,
    /// Only computed for the forecast taxonomy; 0 for an empty bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_win_probability: Option<f64>,
}

/// Group `records` by their stage in `taxonomy`.
///
/// Every record lands in exactly one bucket. Within a bucket records are
/// ordered by descending priority; ties keep their input order.
pub fn partition(records: &[Opportunity], taxonomy: Taxonomy) -> Partition<'_> {
    let cat = catalog(taxonomy);
    let mut buckets: Vec<Bucket<'_>> = cat
        .entries
        .iter()
        .map(|stage| Bucket {
            stage,
            records: Vec::new(),
        })
        .collect();

    for record in records {
        // Stage fields are typed, so the lookup only misses if the catalog and
        // the enum disagree; fall back to the default bucket all the same.
        let idx = cat.position(record.stage_id(taxonomy)).unwrap_or(0);
        buckets[idx].records.push(record);
    }

    for bucket in &mut buckets {
        bucket.records.sort_by_key(|r| Reverse(r.priority));
    }

    Partition { taxonomy, buckets }
}

impl<'a> Partition<'a> {
    pub fn bucket(&self, stage_id: &str) -> Option<&Bucket<'a>> {
        self.buckets.iter().find(|b| b.stage.id == stage_id)
    }

    pub fn ids_in(&self, stage_id: &str) -> Vec<&'a str> {
        self.bucket(stage_id)
            .map(|b| b.records.iter().map(|r| r.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Stage currently holding `record_id`, if present.
    pub fn stage_of(&self, record_id: &str) -> Option<&'static str> {
        self.buckets
            .iter()
            .find(|b| b.records.iter().any(|r| r.id == record_id))
            .map(|b| b.stage.id)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn aggregate(&self) -> Vec<BucketSummary> {
        self.buckets
            .iter()
            .map(|b| {
                let total_value = b.records.iter().map(|r| r.value).sum();
                let mean_win_probability = match self.taxonomy {
                    Taxonomy::Forecast if b.records.is_empty() => Some(0.0),
                    Taxonomy::Forecast => Some(
                        b.records
                            .iter()
                            .map(|r| f64::from(r.win_probability))
                            .sum::<f64>()
                            / b.records.len() as f64,
                    ),
                    Taxonomy::Primary => None,
                };
                BucketSummary {
                    stage: b.stage.id,
                    label: b.stage.label,
                    count: b.records.len(),
                    total_value,
                    mean_win_probability,
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Local snapshot of the record list backing one board view.
///
/// `generation` increases every time the snapshot is replaced wholesale by a
/// refetch; optimistic edits do not bump it.
#[derive(Debug, Clone)]
pub struct Board {
    taxonomy: Taxonomy,
    records: Vec<Opportunity>,
    generation: u64,
}

impl Board {
    pub fn new(taxonomy: Taxonomy, records: Vec<Opportunity>) -> Self {
        Self {
            taxonomy,
            records,
            generation: 0,
        }
    }

    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn records(&self) -> &[Opportunity] {
        &self.records
    }

    pub fn find(&self, record_id: &str) -> Option<&Opportunity> {
        self.records.iter().find(|r| r.id == record_id)
    }

    pub fn partition(&self) -> Partition<'_> {
        partition(&self.records, self.taxonomy)
    }

    /// Replace the snapshot with a fresh server list.
    pub fn replace(&mut self, records: Vec<Opportunity>) {
        self.records = records;
        self.generation += 1;
    }

    /// Move one record to `stage_id` locally. Returns the stage it left.
    pub fn apply_stage(&mut self, record_id: &str, stage_id: &str) -> Result<&'static str> {
        let taxonomy = self.taxonomy;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| PipelineError::OpportunityNotFound(record_id.to_string()))?;
        record.set_stage(taxonomy, stage_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
