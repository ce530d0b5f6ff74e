//! The authoritative boundary registry
//!
//! A registry is a list of administrative units, each with a geometry. It can
//! be built directly from units or from an Arrow table whose columns are found
//! by header name (`wardname`, `lganame`, `statename`, `geometry`, ...).

use std::collections::BTreeMap;

use arrow::record_batch::RecordBatch;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};
use crate::text::{NameRole, clean_admin_name, normalize};
use crate::utils::arrow::{find_column, string_column, string_value};

const ID_HINTS: &[&str] = &["unitid", "wardcode", "globalid", "uid", "id"];
const STATE_HINTS: &[&str] = &["statename", "state"];
const LGA_HINTS: &[&str] = &["lganame", "lga"];
const LGA_CODE_HINTS: &[&str] = &["lgacode"];
const WARD_HINTS: &[&str] = &["wardname", "ward"];
const GEOMETRY_HINTS: &[&str] = &["geometry", "wkt", "geom", "thegeom"];

/// One registry feature: a ward and its boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAdminUnit {
    /// Unique identifier
    pub unit_id: String,
    /// State name
    pub state: String,
    /// LGA name; `None` when the registry carries no LGA tier
    pub lga: Option<String>,
    /// LGA code when the registry carries one
    pub lga_code: Option<String>,
    /// Ward name
    pub ward: String,
    /// Boundary as supplied (WKT or GeoJSON text)
    pub geometry: String,
    /// Remaining registry columns
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CanonicalAdminUnit {
    /// Create a unit without LGA code or extra attributes
    pub fn new(
        unit_id: impl Into<String>,
        state: impl Into<String>,
        lga: Option<&str>,
        ward: impl Into<String>,
        geometry: impl Into<String>,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            state: state.into(),
            lga: lga.map(str::to_string),
            lga_code: None,
            ward: ward.into(),
            geometry: geometry.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Normalized (state, LGA, ward) identity used for duplicate detection
    /// and joins
    #[must_use]
    pub fn identity(&self) -> (String, Option<String>, String) {
        unit_identity(&self.state, self.lga.as_deref(), &self.ward)
    }
}

/// Normalized identity tuple of a (state, LGA, ward) triple
///
/// Names are cleaned for their role and lowercased, so `"Yola North LGA"` and
/// `"yola north"` give the same LGA component.
#[must_use]
pub fn unit_identity(state: &str, lga: Option<&str>, ward: &str) -> (String, Option<String>, String) {
    (
        clean_admin_name(state, NameRole::State).to_lowercase(),
        lga.map(|lga| clean_admin_name(lga, NameRole::Lga).to_lowercase()),
        clean_admin_name(ward, NameRole::Ward).to_lowercase(),
    )
}

/// The authoritative set of administrative units
///
/// Read-only once built; each run derives its own deduplicated working copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRegistry {
    units: Vec<CanonicalAdminUnit>,
}

impl BoundaryRegistry {
    /// Create a registry from units
    #[must_use]
    pub fn new(units: Vec<CanonicalAdminUnit>) -> Self {
        Self { units }
    }

    /// Build a registry from an Arrow table
    ///
    /// Ward and geometry columns are required. A missing id column is
    /// replaced by synthesized `unit-<row>` ids; a missing LGA column yields a
    /// registry without an LGA tier. Rows with a blank ward or geometry are
    /// skipped with a warning.
    ///
    /// # Errors
    /// Returns [`FusionError::Registry`] if a required column is missing
    pub fn from_batch(batch: &RecordBatch) -> Result<Self> {
        let ward_idx = find_column(batch, WARD_HINTS)
            .ok_or_else(|| FusionError::Registry("no ward name column".to_string()))?;
        let geometry_idx = find_column(batch, GEOMETRY_HINTS)
            .ok_or_else(|| FusionError::Registry("no geometry column".to_string()))?;
        let id_idx = find_column(batch, ID_HINTS);
        let state_idx = find_column(batch, STATE_HINTS);
        let lga_idx = find_column(batch, LGA_HINTS);
        let lga_code_idx = find_column(batch, LGA_CODE_HINTS);

        if id_idx.is_none() {
            warn!("Registry has no id column, synthesizing unit ids from row numbers");
        }
        if lga_idx.is_none() {
            warn!("Registry has no LGA column, joins will be ward-only");
        }

        let identity_columns: Vec<usize> = [
            Some(ward_idx),
            Some(geometry_idx),
            id_idx,
            state_idx,
            lga_idx,
            lga_code_idx,
        ]
        .into_iter()
        .flatten()
        .collect();

        let column = |idx: Option<usize>| idx.map(|i| string_column(batch, i)).transpose();
        let wards = string_column(batch, ward_idx)?;
        let geometries = string_column(batch, geometry_idx)?;
        let ids = column(id_idx)?;
        let states = column(state_idx)?;
        let lgas = column(lga_idx)?;
        let lga_codes = column(lga_code_idx)?;

        let schema = batch.schema();
        let extra: Vec<(String, arrow::array::StringArray)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(idx, _)| !identity_columns.contains(idx))
            .filter_map(|(idx, field)| {
                string_column(batch, idx)
                    .ok()
                    .map(|array| (field.name().clone(), array))
            })
            .collect();

        let text = |value: Option<&str>| value.map(|v| normalize(v).text);

        let mut units = Vec::with_capacity(batch.num_rows());
        let mut skipped = 0usize;
        for row in 0..batch.num_rows() {
            let (Some(ward), Some(geometry)) =
                (text(string_value(&wards, row)), string_value(&geometries, row))
            else {
                skipped += 1;
                continue;
            };

            let unit_id = ids
                .as_ref()
                .and_then(|ids| string_value(ids, row))
                .map_or_else(|| format!("unit-{row}"), str::to_string);
            let state = states
                .as_ref()
                .and_then(|states| text(string_value(states, row)))
                .unwrap_or_default();
            let lga = lgas.as_ref().and_then(|lgas| text(string_value(lgas, row)));
            let lga_code = lga_codes
                .as_ref()
                .and_then(|codes| string_value(codes, row))
                .map(str::to_string);
            let attributes = extra
                .iter()
                .filter_map(|(name, array)| {
                    string_value(array, row).map(|value| (name.clone(), value.to_string()))
                })
                .collect();

            units.push(CanonicalAdminUnit {
                unit_id,
                state,
                lga,
                lga_code,
                ward,
                geometry: geometry.to_string(),
                attributes,
            });
        }

        if skipped > 0 {
            warn!("Skipped {skipped} registry rows without a ward name or geometry");
        }
        info!("Built boundary registry with {} units", units.len());
        Ok(Self { units })
    }

    /// All units in registry order
    #[must_use]
    pub fn units(&self) -> &[CanonicalAdminUnit] {
        &self.units
    }

    /// Number of units
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the registry has no units
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Whether any unit carries an LGA name
    #[must_use]
    pub fn has_lga(&self) -> bool {
        self.units.iter().any(|unit| unit.lga.is_some())
    }
}

impl From<Vec<CanonicalAdminUnit>> for BoundaryRegistry {
    fn from(units: Vec<CanonicalAdminUnit>) -> Self {
        Self::new(units)
    }
}
