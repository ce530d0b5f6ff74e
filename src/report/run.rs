//! Run report

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::algorithm::aggregation::UnresolvedGroup;
use crate::algorithm::fusion::RegistryCollapse;
use crate::algorithm::resolution::Technique;
use crate::config::FusionConfig;
use crate::error::Result;
use crate::report::anomaly::Anomaly;
use crate::schema::SchemaRoles;

/// Metadata and findings of one fusion run
#[derive(Debug, Clone, Serialize)]
pub struct FusionRun {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall time of the run in milliseconds
    pub elapsed_ms: u64,
    /// Configuration used
    pub config: FusionConfig,
    /// Detected column roles
    pub schema: SchemaRoles,
    /// Records extracted from the table
    pub input_records: usize,
    /// Records whose location resolved
    pub matched_records: usize,
    /// Records whose location did not resolve
    pub unmatched_records: usize,
    /// Distinct raw locations resolved
    pub distinct_keys: usize,
    /// Records answered from the resolution cache
    pub cache_hits: usize,
    /// Distinct raw locations resolved flagged low-confidence
    pub low_confidence_keys: usize,
    /// Techniques per distinct raw location
    pub techniques_by_key: BTreeMap<Technique, usize>,
    /// Techniques per record
    pub techniques_by_record: BTreeMap<Technique, usize>,
    /// Records removed by the facility filter
    pub excluded_by_filter: usize,
    /// Records with nothing reported for the stratum
    pub skipped_no_data: usize,
    /// Units in the source registry
    pub registry_units: usize,
    /// Units in the deduplicated working copy
    pub working_units: usize,
    /// Registry duplicates collapsed
    pub registry_collapses: Vec<RegistryCollapse>,
    /// Ward metrics computed
    pub ward_metrics: usize,
    /// Rows with geometry
    pub fused_rows: usize,
    /// Ward metrics without geometry
    pub unjoined_wards: usize,
    /// Unresolved records pooled by raw names
    pub unresolved: Vec<UnresolvedGroup>,
    /// Non-fatal conditions
    pub anomalies: Vec<Anomaly>,
}

impl FusionRun {
    /// Start an empty report
    #[must_use]
    pub fn new(config: FusionConfig, schema: SchemaRoles) -> Self {
        Self {
            started_at: Utc::now(),
            elapsed_ms: 0,
            config,
            schema,
            input_records: 0,
            matched_records: 0,
            unmatched_records: 0,
            distinct_keys: 0,
            cache_hits: 0,
            low_confidence_keys: 0,
            techniques_by_key: BTreeMap::new(),
            techniques_by_record: BTreeMap::new(),
            excluded_by_filter: 0,
            skipped_no_data: 0,
            registry_units: 0,
            working_units: 0,
            registry_collapses: Vec::new(),
            ward_metrics: 0,
            fused_rows: 0,
            unjoined_wards: 0,
            unresolved: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    /// Whether every input record is accounted for as matched or unmatched
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.matched_records + self.unmatched_records == self.input_records
    }

    /// Share of records resolved, in percent
    #[must_use]
    pub fn match_rate(&self) -> f64 {
        if self.input_records == 0 {
            0.0
        } else {
            self.matched_records as f64 / self.input_records as f64 * 100.0
        }
    }

    /// Anomaly counts by type
    #[must_use]
    pub fn anomaly_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for anomaly in &self.anomalies {
            *counts.entry(anomaly.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Plain-text summary of the run
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Fusion Run Summary:\n");
        summary.push_str(&format!("  Started: {}\n", self.started_at.to_rfc3339()));
        summary.push_str(&format!("  Elapsed: {} ms\n", self.elapsed_ms));
        summary.push_str(&format!(
            "  Filter: {} facilities, {}\n",
            self.config.facility_filter, self.config.stratum
        ));
        summary.push_str(&format!("  Input Records: {}\n", self.input_records));
        summary.push_str(&format!(
            "  Matched Records: {} ({:.1}%)\n",
            self.matched_records,
            self.match_rate()
        ));
        summary.push_str(&format!("  Unmatched Records: {}\n", self.unmatched_records));
        summary.push_str(&format!(
            "  Distinct Locations: {} ({} low-confidence)\n",
            self.distinct_keys, self.low_confidence_keys
        ));

        summary.push_str("\nResolution Techniques:\n");
        for technique in Technique::ALL {
            let keys = self.techniques_by_key.get(&technique).copied().unwrap_or(0);
            let records = self
                .techniques_by_record
                .get(&technique)
                .copied()
                .unwrap_or(0);
            if keys > 0 {
                summary.push_str(&format!("    {technique}: {keys} locations, {records} records\n"));
            }
        }

        summary.push_str("\nAggregation:\n");
        summary.push_str(&format!("  Ward Metrics: {}\n", self.ward_metrics));
        summary.push_str(&format!("  Excluded by Filter: {}\n", self.excluded_by_filter));
        summary.push_str(&format!("  Without Stratum Data: {}\n", self.skipped_no_data));
        summary.push_str(&format!("  Unresolved Groups: {}\n", self.unresolved.len()));

        summary.push_str("\nFusion:\n");
        summary.push_str(&format!(
            "  Registry Units: {} ({} after deduplication)\n",
            self.registry_units, self.working_units
        ));
        summary.push_str(&format!("  Fused Rows: {}\n", self.fused_rows));
        summary.push_str(&format!("  Unjoined Wards: {}\n", self.unjoined_wards));

        if !self.schema.unused.is_empty() {
            summary.push_str(&format!(
                "\nUnused Columns: {}\n",
                self.schema.unused.join(", ")
            ));
        }

        let counts = self.anomaly_counts();
        if !counts.is_empty() {
            summary.push_str("\nAnomalies:\n");
            for (kind, count) in counts {
                summary.push_str(&format!("    {kind}: {count}\n"));
            }
        }

        summary
    }

    /// Serialize the run to pretty-printed JSON
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
