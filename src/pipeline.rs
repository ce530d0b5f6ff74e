//! The fusion pipeline
//!
//! One run takes an uploaded table and a boundary registry through schema
//! detection, record extraction, identity resolution, aggregation and
//! geometry fusion. Runs share nothing but the read-only registry, so several
//! uploads can be fused in parallel.

use std::collections::BTreeMap;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::algorithm::aggregation::{AggregationPolicy, MetricAggregator};
use crate::algorithm::fusion::{FusedDataset, GeometryFuser};
use crate::algorithm::resolution::{IdentityResolver, MatchResult, ResolutionKey};
use crate::config::FusionConfig;
use crate::error::{FusionError, Result};
use crate::models::BoundaryRegistry;
use crate::report::{Anomaly, FusionRun};
use crate::schema::{ColumnRole, SchemaDetector, extract_records};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
pub struct FusionOutput {
    /// Ward metrics with geometry
    pub dataset: FusedDataset,
    /// Run report
    pub report: FusionRun,
    /// Resolution of every distinct raw location
    pub matches: Vec<MatchResult>,
}

/// Runs uploads through detection, resolution, aggregation and fusion
#[derive(Debug, Clone)]
pub struct FusionPipeline {
    config: FusionConfig,
    detector: SchemaDetector,
}

impl FusionPipeline {
    /// Create a pipeline
    ///
    /// # Errors
    /// Returns [`FusionError::Config`] if the configuration is invalid
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: SchemaDetector::new(),
        })
    }

    /// Use a custom schema detector
    #[must_use]
    pub fn with_detector(mut self, detector: SchemaDetector) -> Self {
        self.detector = detector;
        self
    }

    /// The run configuration
    #[must_use]
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse one uploaded table with the registry
    ///
    /// # Errors
    /// Returns [`FusionError::StructuralValidation`] if the table has no
    /// usable metric or location columns. Every other problem is reported as
    /// an anomaly in the run report.
    pub fn run(&self, batch: &RecordBatch, registry: &BoundaryRegistry) -> Result<FusionOutput> {
        let start = Instant::now();
        log_operation_start("Fusing", format!("{} rows", batch.num_rows()));

        let roles = self.detector.detect(batch)?;
        let mut report = FusionRun::new(self.config, roles.clone());
        for warning in &roles.hierarchy_warnings {
            report.anomalies.push(Anomaly::from(warning));
        }

        let extraction = extract_records(batch, &roles)?;
        report.anomalies.extend(extraction.anomalies);
        let records = extraction.records;

        let fuser = GeometryFuser::new(registry);
        report.registry_units = registry.len();
        report.working_units = fuser.units().len();
        report.registry_collapses = fuser.collapses().to_vec();
        report.anomalies.extend(fuser.collapse_anomalies());

        let mut resolver = IdentityResolver::new(fuser.units(), &self.config);
        let positions: Vec<usize> = records
            .iter()
            .map(|record| resolver.resolve_position(&ResolutionKey::from_record(record)))
            .collect();
        let cache = resolver.into_cache();
        report.cache_hits = cache.hits();
        let matches = cache.into_results();

        let mut records_per_key = vec![0usize; matches.len()];
        for &position in &positions {
            records_per_key[position] += 1;
        }
        Self::record_resolutions(&mut report, &matches, &records_per_key);

        let per_record: Vec<&MatchResult> =
            positions.iter().map(|&position| &matches[position]).collect();
        let aggregation = MetricAggregator::new(AggregationPolicy::from(&self.config))
            .aggregate(&records, &per_record);
        report.excluded_by_filter = aggregation.excluded_by_filter;
        report.skipped_no_data = aggregation.skipped_no_data;
        report.ward_metrics = aggregation.metrics.len();
        report.unresolved = aggregation.unresolved;
        report.anomalies.extend(aggregation.anomalies);

        let mut dataset = fuser.fuse(&aggregation.metrics);
        report.fused_rows = dataset.rows.len();
        report.unjoined_wards = dataset.unjoined.len();
        report.anomalies.append(&mut dataset.anomalies);

        report.input_records = records.len();
        report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        if !report.is_complete() {
            warn!(
                "Record accounting mismatch: {} matched + {} unmatched != {} input",
                report.matched_records, report.unmatched_records, report.input_records
            );
        }
        info!(
            "Resolved {}/{} records over {} distinct locations ({} anomalies)",
            report.matched_records,
            report.input_records,
            report.distinct_keys,
            report.anomalies.len()
        );
        log_operation_complete("Fused", "upload", dataset.rows.len(), Some(start.elapsed()));

        Ok(FusionOutput {
            dataset,
            report,
            matches,
        })
    }

    /// Fill resolution counts and anomalies into the report
    fn record_resolutions(report: &mut FusionRun, matches: &[MatchResult], records_per_key: &[usize]) {
        report.distinct_keys = matches.len();
        let mut by_key: BTreeMap<_, usize> = BTreeMap::new();
        let mut by_record: BTreeMap<_, usize> = BTreeMap::new();

        for (result, &records) in matches.iter().zip(records_per_key) {
            *by_key.entry(result.technique).or_insert(0) += 1;
            *by_record.entry(result.technique).or_insert(0) += records;
            if result.low_confidence {
                report.low_confidence_keys += 1;
            }

            let parents = [
                (ColumnRole::State, result.state.as_ref()),
                (ColumnRole::Lga, result.lga.as_ref()),
            ];
            for (level, parent) in parents {
                let Some(parent) = parent.filter(|parent| parent.is_tied()) else {
                    continue;
                };
                if let (Some(chosen), Some(rule)) = (&parent.id, parent.tie_break) {
                    report.anomalies.push(Anomaly::TiedResolution {
                        raw: result.key.to_string(),
                        level,
                        candidates: parent.tied.clone(),
                        chosen: chosen.clone(),
                        rule,
                    });
                }
            }

            match (&result.unit_id, result.tie_break) {
                (Some(unit_id), Some(rule)) => {
                    report.anomalies.push(Anomaly::TiedResolution {
                        raw: result.key.to_string(),
                        level: ColumnRole::Ward,
                        candidates: result.tied.clone(),
                        chosen: unit_id.clone(),
                        rule,
                    });
                    report.matched_records += records;
                }
                (Some(_), None) => report.matched_records += records,
                (None, _) => {
                    report.unmatched_records += records;
                    let best = result.candidates.first();
                    report.anomalies.push(Anomaly::UnresolvedIdentity {
                        state: result.key.state.clone(),
                        lga: result.key.lga.clone(),
                        ward: result.key.ward.clone(),
                        records,
                        best_candidate: best.map(|candidate| candidate.name.clone()),
                        best_score: best.map(|candidate| candidate.score),
                        reason: (!result.notes.is_empty()).then(|| result.notes.join("; ")),
                    });
                }
            }
        }

        report.techniques_by_key = by_key;
        report.techniques_by_record = by_record;
    }

    /// Fuse several batches of one upload
    ///
    /// # Errors
    /// Returns an error if there are no batches, their schemas differ, or the
    /// run fails
    pub fn run_batches(
        &self,
        batches: &[RecordBatch],
        registry: &BoundaryRegistry,
    ) -> Result<FusionOutput> {
        let first = batches
            .first()
            .ok_or_else(|| FusionError::missing_role(ColumnRole::Ward, "no input batches"))?;
        let table = concat_batches(&first.schema(), batches)?;
        self.run(&table, registry)
    }

    /// Fuse independent uploads in parallel
    ///
    /// Each upload gets its own resolver cache and registry working copy;
    /// results are returned in input order.
    #[must_use]
    pub fn run_many(
        &self,
        uploads: &[RecordBatch],
        registry: &BoundaryRegistry,
    ) -> Vec<Result<FusionOutput>> {
        uploads
            .par_iter()
            .map(|upload| self.run(upload, registry))
            .collect()
    }
}
