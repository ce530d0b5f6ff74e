//! Pooling facility records into ward metrics

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::algorithm::aggregation::policy::{AggregationPolicy, MethodChoice, choose_method};
use crate::algorithm::resolution::MatchResult;
use crate::models::{RawRecord, Stratum, TestMethod};
use crate::report::{Anomaly, DataQualityKind};
use crate::utils::logging::log_operation_complete;

/// Test positivity of one ward in one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WardMetric {
    /// Resolved registry unit
    pub unit_id: String,
    /// Canonical state name
    pub state: String,
    /// Canonical LGA name
    pub lga: Option<String>,
    /// Canonical ward name
    pub ward: String,
    /// Reporting period
    pub period: Option<String>,
    /// Stratum the counts belong to
    pub stratum: Stratum,
    /// Persons tested, pooled over facilities
    pub tested: f64,
    /// Positives, pooled over facilities
    pub positive: f64,
    /// Pooled positivity in percent; `None` when nobody was tested
    pub rate: Option<f64>,
    /// Distinct contributing facilities
    pub facility_count: usize,
    /// Contributing records
    pub record_count: usize,
    /// Records per chosen test method
    pub method_mix: BTreeMap<TestMethod, usize>,
    /// Whether any contributing resolution was low-confidence
    pub low_confidence: bool,
}

/// Records whose location did not resolve, pooled by raw names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedGroup {
    /// Raw state name
    pub state: Option<String>,
    /// Raw LGA name
    pub lga: Option<String>,
    /// Raw ward name
    pub ward: Option<String>,
    /// Reporting period
    pub period: Option<String>,
    /// Persons tested
    pub tested: f64,
    /// Positives
    pub positive: f64,
    /// Pooled positivity in percent
    pub rate: Option<f64>,
    /// Distinct contributing facilities
    pub facility_count: usize,
    /// Contributing records
    pub record_count: usize,
}

/// Everything aggregation produces
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationOutput {
    /// Ward metrics sorted by unit id and period
    pub metrics: Vec<WardMetric>,
    /// Unresolved records pooled by raw names
    pub unresolved: Vec<UnresolvedGroup>,
    /// Zero denominators, rates above 100% and positives without tests
    pub anomalies: Vec<Anomaly>,
    /// Records pooled into a metric or the unresolved bucket
    pub aggregated_records: usize,
    /// Records removed by the facility filter
    pub excluded_by_filter: usize,
    /// Records with nothing reported for the stratum
    pub skipped_no_data: usize,
}

#[derive(Debug, Default)]
struct Pool {
    tested: f64,
    positive: f64,
    facilities: BTreeSet<String>,
    records: usize,
    method_mix: BTreeMap<TestMethod, usize>,
    low_confidence: bool,
}

impl Pool {
    fn add(&mut self, record: &RawRecord, method: Option<TestMethod>, tested: f64, positive: f64) {
        self.tested += tested;
        self.positive += positive;
        self.records += 1;
        self.facilities.insert(record.facility_key());
        if let Some(method) = method {
            *self.method_mix.entry(method).or_insert(0) += 1;
        }
    }

    /// Pooled rate in percent
    fn rate(&self) -> Option<f64> {
        (self.tested > 0.0).then(|| self.positive / self.tested * 100.0)
    }
}

type UnitKey = (String, Option<String>);
type RawKey = (Option<String>, Option<String>, Option<String>, Option<String>);

/// Aggregates facility records into ward metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricAggregator {
    policy: AggregationPolicy,
}

impl MetricAggregator {
    /// Create an aggregator with a policy
    #[must_use]
    pub fn new(policy: AggregationPolicy) -> Self {
        Self { policy }
    }

    /// The aggregation policy
    #[must_use]
    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Aggregate records with their resolutions
    ///
    /// `matches[i]` is the resolution of `records[i]`. Rates are pooled
    /// (sum of positives over sum of tests), never averaged over facilities.
    #[must_use]
    pub fn aggregate(&self, records: &[RawRecord], matches: &[&MatchResult]) -> AggregationOutput {
        let start = Instant::now();
        let policy = self.policy;

        let choices: Vec<Option<MethodChoice>> = records
            .par_iter()
            .map(|record| {
                let (category, _) = record.facility_category();
                policy
                    .facility_filter
                    .admits(category)
                    .then(|| choose_method(record, policy.stratum))
            })
            .collect();

        let mut output = AggregationOutput::default();
        let mut resolved: BTreeMap<UnitKey, (Pool, &MatchResult)> = BTreeMap::new();
        let mut unresolved: BTreeMap<RawKey, Pool> = BTreeMap::new();

        for ((record, resolution), choice) in records.iter().zip(matches).zip(choices) {
            let (method, tested, positive) = match choice {
                None => {
                    output.excluded_by_filter += 1;
                    continue;
                }
                Some(MethodChoice::NoData) => {
                    output.skipped_no_data += 1;
                    continue;
                }
                Some(MethodChoice::NoTests { positive }) => {
                    if positive > 0.0 {
                        output.anomalies.push(Anomaly::row_quality(
                            DataQualityKind::PositiveWithoutTests,
                            record.row,
                            format!("{positive} positive, 0 tested"),
                        ));
                    }
                    (None, 0.0, 0.0)
                }
                Some(MethodChoice::Selected {
                    method,
                    tested,
                    positive,
                    untested_positive,
                }) => {
                    if untested_positive > 0.0 {
                        output.anomalies.push(Anomaly::row_quality(
                            DataQualityKind::PositiveWithoutTests,
                            record.row,
                            format!(
                                "{untested_positive} positive under methods with 0 tested; \
                                 {method} {positive}/{tested} used"
                            ),
                        ));
                    }
                    (Some(method), tested, positive)
                }
            };

            output.aggregated_records += 1;
            match &resolution.unit_id {
                Some(unit_id) => {
                    let (pool, _) = resolved
                        .entry((unit_id.clone(), record.period.clone()))
                        .or_insert_with(|| (Pool::default(), *resolution));
                    pool.low_confidence |= resolution.low_confidence;
                    pool.add(record, method, tested, positive);
                }
                None => {
                    unresolved
                        .entry((
                            record.state.clone(),
                            record.lga.clone(),
                            record.ward.clone(),
                            record.period.clone(),
                        ))
                        .or_default()
                        .add(record, method, tested, positive);
                }
            }
        }

        for ((unit_id, period), (pool, resolution)) in resolved {
            let rate = pool.rate();
            match rate {
                None => output.anomalies.push(Anomaly::ward_quality(
                    DataQualityKind::ZeroDenominator,
                    &unit_id,
                    period.as_deref(),
                    format!("{}/{}", pool.positive, pool.tested),
                )),
                Some(rate) if rate > 100.0 => {
                    warn!(
                        "Positivity above 100% for {unit_id} in {}: {}/{}",
                        period.as_deref().unwrap_or("all periods"),
                        pool.positive,
                        pool.tested
                    );
                    output.anomalies.push(Anomaly::ward_quality(
                        DataQualityKind::RateAbove100,
                        &unit_id,
                        period.as_deref(),
                        format!("{}/{}", pool.positive, pool.tested),
                    ));
                }
                Some(_) => {}
            }

            let (state, lga, ward) = match &resolution.canonical {
                Some(canonical) => (
                    canonical.state.clone(),
                    canonical.lga.clone(),
                    canonical.ward.clone(),
                ),
                None => (
                    resolution.key.state.clone().unwrap_or_default(),
                    resolution.key.lga.clone(),
                    resolution.key.ward.clone().unwrap_or_default(),
                ),
            };
            output.metrics.push(WardMetric {
                unit_id,
                state,
                lga,
                ward,
                period,
                stratum: policy.stratum,
                tested: pool.tested,
                positive: pool.positive,
                rate,
                facility_count: pool.facilities.len(),
                record_count: pool.records,
                method_mix: pool.method_mix,
                low_confidence: pool.low_confidence,
            });
        }

        let groups: Vec<UnresolvedGroup> = unresolved
            .into_iter()
            .map(|((state, lga, ward, period), pool)| {
                let rate = pool.rate();
                if rate.is_none() {
                    output.anomalies.push(Anomaly::DataQualityWarning {
                        kind: DataQualityKind::ZeroDenominator,
                        unit_id: None,
                        period: period.clone(),
                        row: None,
                        raw: format!(
                            "unresolved {} / {}: {}/{}",
                            lga.as_deref().unwrap_or("?"),
                            ward.as_deref().unwrap_or("?"),
                            pool.positive,
                            pool.tested
                        ),
                    });
                }
                UnresolvedGroup {
                    rate,
                    state,
                    lga,
                    ward,
                    period,
                    tested: pool.tested,
                    positive: pool.positive,
                    facility_count: pool.facilities.len(),
                    record_count: pool.records,
                }
            })
            .collect();
        output.unresolved = groups;

        info!(
            "Aggregated {} records ({} excluded by {} filter, {} without {} data)",
            output.aggregated_records,
            output.excluded_by_filter,
            policy.facility_filter,
            output.skipped_no_data,
            policy.stratum
        );
        log_operation_complete(
            "Aggregated",
            "ward metrics",
            output.metrics.len(),
            Some(start.elapsed()),
        );
        output
    }
}

/// Aggregate records with their resolutions under a policy
#[must_use]
pub fn aggregate(
    records: &[RawRecord],
    matches: &[&MatchResult],
    policy: AggregationPolicy,
) -> AggregationOutput {
    MetricAggregator::new(policy).aggregate(records, matches)
}
