//! Record extraction once column roles are known
//!
//! Text cells pass through encoding repair, metric cells are cast to
//! `Float64`. Cells that cannot be repaired or counts that cannot be right are
//! reported as anomalies and never stop the extraction.

use std::time::Instant;

use arrow::array::{Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::Result;
use crate::models::{FacilityCategory, Observation, RawRecord};
use crate::report::{Anomaly, DataQualityKind};
use crate::schema::period::ReportingPeriod;
use crate::schema::{ColumnRef, LocationColumn, MetricColumn, SchemaRoles};
use crate::text::normalize;
use crate::utils::arrow::{float_column, float_value, string_column, string_value};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Records and anomalies of one table
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// One record per table row
    pub records: Vec<RawRecord>,
    /// Unrepairable text cells and negative counts
    pub anomalies: Vec<Anomaly>,
}

/// A text column read once and normalized value by value
struct TextColumn {
    name: String,
    values: StringArray,
    normalized: FxHashMap<String, String>,
    reported: FxHashSet<String>,
}

impl TextColumn {
    fn read(batch: &RecordBatch, column: &str, index: usize) -> Result<Self> {
        Ok(Self {
            name: column.to_string(),
            values: string_column(batch, index)?,
            normalized: FxHashMap::default(),
            reported: FxHashSet::default(),
        })
    }

    /// Normalized text at `row`; repeated values are normalized once
    fn value(&mut self, row: usize, anomalies: &mut Vec<Anomaly>) -> Option<String> {
        let raw = string_value(&self.values, row)?;
        if let Some(known) = self.normalized.get(raw) {
            return (!known.is_empty()).then(|| known.clone());
        }

        let normalized = normalize(raw);
        if normalized.low_confidence && self.reported.insert(raw.to_string()) {
            warn!("Could not repair text in '{}' row {row}: {raw:?}", self.name);
            anomalies.push(Anomaly::EncodingRepairLowConfidence {
                column: self.name.clone(),
                row,
                raw: raw.to_string(),
            });
        }
        self.normalized
            .insert(raw.to_string(), normalized.text.clone());
        (!normalized.text.is_empty()).then_some(normalized.text)
    }
}

fn text_column(
    batch: &RecordBatch,
    column: Option<(&str, usize)>,
) -> Result<Option<TextColumn>> {
    column
        .map(|(name, index)| TextColumn::read(batch, name, index))
        .transpose()
}

fn column_ref(column: Option<&ColumnRef>) -> Option<(&str, usize)> {
    column.map(|c| (c.name.as_str(), c.index))
}

fn location_ref(column: Option<&LocationColumn>) -> Option<(&str, usize)> {
    column.map(|c| (c.name.as_str(), c.index))
}

/// Canonical form of a period cell; unparseable cells are kept as written
fn period_value(raw: &str) -> String {
    raw.parse::<ReportingPeriod>()
        .map_or_else(|_| raw.trim().to_string(), |period| period.to_string())
}

/// Extract raw records from a table with detected roles
///
/// # Errors
/// Returns an error if a role column cannot be cast to its working type
pub fn extract_records(batch: &RecordBatch, roles: &SchemaRoles) -> Result<Extraction> {
    let start = Instant::now();
    log_operation_start("Extracting records from", format!("{} rows", batch.num_rows()));

    let mut state = text_column(batch, location_ref(roles.state.as_ref()))?;
    let mut lga = text_column(batch, location_ref(roles.lga.as_ref()))?;
    let mut ward = text_column(batch, location_ref(roles.ward.as_ref()))?;
    let mut facility = text_column(batch, location_ref(roles.facility.as_ref()))?;
    let mut category = text_column(batch, column_ref(roles.category.as_ref()))?;
    let period = roles
        .period
        .as_ref()
        .map(|c| string_column(batch, c.index))
        .transpose()?;

    let metrics: Vec<(&MetricColumn, Float64Array)> = roles
        .metrics
        .iter()
        .map(|metric| Ok((metric, float_column(batch, metric.index)?)))
        .collect::<Result<_>>()?;

    let mut extraction = Extraction::default();
    let mut periods: FxHashMap<String, String> = FxHashMap::default();

    for row in 0..batch.num_rows() {
        let anomalies = &mut extraction.anomalies;
        let mut read = |column: &mut Option<TextColumn>| -> Option<String> {
            column.as_mut().and_then(|c| c.value(row, anomalies))
        };
        let state_value = read(&mut state);
        let lga_value = read(&mut lga);
        let ward_value = read(&mut ward);
        let facility_value = read(&mut facility);
        let category_value =
            read(&mut category).and_then(|label| FacilityCategory::from_label(&label));

        let period_text = period
            .as_ref()
            .and_then(|values| string_value(values, row))
            .map(|raw| {
                periods
                    .entry(raw.to_string())
                    .or_insert_with(|| period_value(raw))
                    .clone()
            });

        let mut observations: SmallVec<[Observation; 8]> = SmallVec::new();
        for (metric, values) in &metrics {
            let Some(value) = float_value(values, row) else {
                continue;
            };
            if value < 0.0 {
                extraction.anomalies.push(Anomaly::row_quality(
                    DataQualityKind::NegativeCount,
                    row,
                    format!("{}={value}", metric.name),
                ));
                continue;
            }
            observations.push(Observation {
                spec: metric.spec,
                value,
            });
        }

        extraction.records.push(RawRecord {
            row,
            state: state_value,
            lga: lga_value,
            ward: ward_value,
            facility: facility_value,
            period: period_text,
            category: category_value,
            observations,
        });
    }

    log_operation_complete(
        "Extracted",
        "records",
        extraction.records.len(),
        Some(start.elapsed()),
    );
    Ok(extraction)
}
