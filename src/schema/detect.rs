//! Column role detection
//!
//! Metric columns are found by header vocabulary, the period column by header
//! hint and cell values, and the location hierarchy by header hints and then
//! by distinct-value counts: a state column has fewer distinct values than
//! the LGA column, which has fewer than the ward column.

use arrow::array::Array;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::{debug, info, warn};
use rustc_hash::FxHashSet;

use crate::error::{FusionError, Result};
use crate::schema::patterns::{
    LocationHint, classify_metric, is_category_header, is_id_like, is_period_header, location_hint,
};
use crate::schema::period::{PERIOD_SAMPLE_SIZE, is_period_like};
use crate::schema::{
    ColumnRef, ColumnRole, HierarchyWarning, LocationColumn, MetricColumn, SchemaRoles,
};
use crate::utils::arrow::{string_column, string_value};

/// Index of the ward role in [`ColumnRole::HIERARCHY`]
const WARD_SLOT: usize = 2;

/// Detects column roles in uploaded tables
#[derive(Debug, Clone)]
pub struct SchemaDetector {
    period_sample_size: usize,
}

impl Default for SchemaDetector {
    fn default() -> Self {
        Self {
            period_sample_size: PERIOD_SAMPLE_SIZE,
        }
    }
}

fn is_text_type(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, value) => is_text_type(value),
        _ => false,
    }
}

fn is_date_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _)
    )
}

fn slot(hint: LocationHint) -> usize {
    match hint {
        LocationHint::State => 0,
        LocationHint::Lga => 1,
        LocationHint::Ward => 2,
        LocationHint::Facility => 3,
    }
}

/// A text column that may hold a location level
struct Candidate {
    column: LocationColumn,
    hint: Option<LocationHint>,
}

impl SchemaDetector {
    /// Create a detector with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many cells are sampled when testing for a period column
    #[must_use]
    pub fn with_period_sample_size(mut self, size: usize) -> Self {
        self.period_sample_size = size.max(1);
        self
    }

    /// Detect column roles
    ///
    /// # Errors
    /// Returns [`FusionError::StructuralValidation`] when the table has no
    /// metric column or fewer than two location columns, or an Arrow error if
    /// a column cannot be read as text.
    pub fn detect(&self, batch: &RecordBatch) -> Result<SchemaRoles> {
        let schema = batch.schema();
        let mut roles = SchemaRoles::default();
        let mut candidates: Vec<Candidate> = Vec::new();

        for (index, field) in schema.fields().iter().enumerate() {
            let name = field.name();

            if let Some(spec) = classify_metric(name) {
                debug!("Column '{name}' is metric {spec}");
                roles.metrics.push(MetricColumn {
                    name: name.clone(),
                    index,
                    spec,
                });
                continue;
            }

            let text_like = is_text_type(field.data_type());
            if roles.period.is_none()
                && (is_period_header(name) || is_date_type(field.data_type()) || text_like)
                && self.is_period_column(batch, index)?
            {
                debug!("Column '{name}' is the reporting period");
                roles.period = Some(ColumnRef {
                    name: name.clone(),
                    index,
                });
                continue;
            }

            if roles.category.is_none() && is_category_header(name) {
                roles.category = Some(ColumnRef {
                    name: name.clone(),
                    index,
                });
                continue;
            }

            if !text_like || is_id_like(name) {
                roles.unused.push(name.clone());
                continue;
            }

            let distinct = distinct_count(batch, index)?;
            if distinct == 0 {
                roles.unused.push(name.clone());
                continue;
            }

            candidates.push(Candidate {
                column: LocationColumn {
                    name: name.clone(),
                    index,
                    distinct,
                    hinted: false,
                },
                hint: location_hint(name),
            });
        }

        assign_locations(&mut roles, candidates);
        check_hierarchy(&mut roles);

        if roles.metrics.is_empty() {
            return Err(FusionError::missing_role(
                ColumnRole::Metric,
                format!("no tested/positive column among {} columns", schema.fields().len()),
            ));
        }
        if roles.location_count() < 2 {
            let missing = if roles.ward.is_none() {
                ColumnRole::Ward
            } else {
                ColumnRole::Lga
            };
            return Err(FusionError::missing_role(
                missing,
                format!(
                    "found {} location column(s), at least two are required",
                    roles.location_count()
                ),
            ));
        }

        info!(
            "Detected schema: {} location, {} metric, period {}, {} unused columns",
            roles.location_count(),
            roles.metrics.len(),
            roles.period.as_ref().map_or("none", |p| p.name.as_str()),
            roles.unused.len()
        );
        Ok(roles)
    }

    fn is_period_column(&self, batch: &RecordBatch, index: usize) -> Result<bool> {
        let values = string_column(batch, index)?;
        let sample = (0..values.len())
            .filter_map(|row| string_value(&values, row))
            .take(self.period_sample_size);
        Ok(is_period_like(sample))
    }
}

/// Detect column roles with default settings
///
/// # Errors
/// See [`SchemaDetector::detect`]
pub fn detect_schema(batch: &RecordBatch) -> Result<SchemaRoles> {
    SchemaDetector::new().detect(batch)
}

fn distinct_count(batch: &RecordBatch, index: usize) -> Result<usize> {
    let values = string_column(batch, index)?;
    let distinct: FxHashSet<String> = (0..values.len())
        .filter_map(|row| string_value(&values, row))
        .map(|value| value.trim().to_lowercase())
        .collect();
    Ok(distinct.len())
}

/// Place location candidates into hierarchy slots
///
/// Hinted columns take their named slot (the first column per hint wins).
/// The remaining columns are ranked by ascending distinct count. When the
/// ward slot is pinned, columns with fewer distinct values than the ward go
/// above it and the rest below it; otherwise they fill the open slots in
/// hierarchy order.
fn assign_locations(roles: &mut SchemaRoles, candidates: Vec<Candidate>) {
    let mut slots: [Option<LocationColumn>; 4] = [None, None, None, None];
    let mut free: Vec<LocationColumn> = Vec::new();

    for Candidate { mut column, hint } in candidates {
        match hint.map(slot) {
            Some(s) if slots[s].is_none() => {
                column.hinted = true;
                slots[s] = Some(column);
            }
            _ => free.push(column),
        }
    }

    free.sort_by_key(|column| (column.distinct, column.index));
    let open: Vec<usize> = (0..slots.len()).filter(|&s| slots[s].is_none()).collect();

    let ward_distinct = slots[WARD_SLOT].as_ref().map(|ward| ward.distinct);
    match ward_distinct {
        Some(ward_distinct) => {
            let (above, below): (Vec<_>, Vec<_>) = free
                .into_iter()
                .partition(|column| column.distinct < ward_distinct);
            let open_above: Vec<usize> = open.iter().copied().filter(|&s| s < WARD_SLOT).collect();
            let open_below: Vec<usize> = open.iter().copied().filter(|&s| s > WARD_SLOT).collect();
            place(&mut slots, &open_above, above, &mut roles.unused);
            place(&mut slots, &open_below, below, &mut roles.unused);
        }
        None => place(&mut slots, &open, free, &mut roles.unused),
    }

    let [state, lga, ward, facility] = slots;
    roles.state = state;
    roles.lga = lga;
    roles.ward = ward;
    roles.facility = facility;
}

/// Fill `open` slots with columns sorted by ascending distinct count
///
/// Columns beyond the number of open slots are unused. With fewer columns
/// than slots, the deepest slots ending at the ward are filled, so two bare
/// columns become LGA and ward.
fn place(
    slots: &mut [Option<LocationColumn>; 4],
    open: &[usize],
    mut columns: Vec<LocationColumn>,
    unused: &mut Vec<String>,
) {
    if columns.len() > open.len() {
        for column in columns.drain(open.len()..) {
            warn!(
                "Location column '{}' ({} distinct values) exceeds the hierarchy depth and is unused",
                column.name, column.distinct
            );
            unused.push(column.name);
        }
    }

    let count = columns.len();
    let upper: Vec<usize> = open.iter().copied().filter(|&s| s <= WARD_SLOT).collect();
    let targets: &[usize] = if count < open.len() && count <= upper.len() {
        &upper[upper.len() - count..]
    } else {
        &open[..count]
    };

    for (&target, column) in targets.iter().zip(columns) {
        slots[target] = Some(column);
    }
}

/// Record parent/child pairs where the parent has more distinct values
fn check_hierarchy(roles: &mut SchemaRoles) {
    let warnings: Vec<HierarchyWarning> = roles
        .locations()
        .windows(2)
        .filter_map(|pair| {
            let (parent_role, parent) = pair[0];
            let (child_role, child) = pair[1];
            (parent.distinct > child.distinct).then(|| HierarchyWarning {
                parent: parent_role,
                child: child_role,
                parent_column: parent.name.clone(),
                child_column: child.name.clone(),
                parent_distinct: parent.distinct,
                child_distinct: child.distinct,
            })
        })
        .collect();

    for warning in &warnings {
        warn!(
            "Hierarchy violation: {} column '{}' has {} distinct values but {} column '{}' has {}",
            warning.parent,
            warning.parent_column,
            warning.parent_distinct,
            warning.child,
            warning.child_column,
            warning.child_distinct
        );
    }
    roles.hierarchy_warnings = warnings;
}
