use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use ward_fusion::{BoundaryRegistry, CanonicalAdminUnit};

/// Header of the under-five RDT tested column used by the fixtures
pub const TESTED_U5: &str = "Persons tested RDT <5yrs";
/// Header of the under-five RDT positive column used by the fixtures
pub const POSITIVE_U5: &str = "Persons positive RDT <5yrs";

/// A text column
#[must_use]
pub fn text(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

/// A count column
#[must_use]
pub fn counts(values: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from(values.to_vec()))
}

/// Build a record batch from named columns
#[must_use]
pub fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// One upload row: state, LGA, ward, facility, tested, positive
pub type Row<'a> = (&'a str, &'a str, &'a str, &'a str, i64, i64);

/// An upload with hinted location headers and under-five RDT counts
#[must_use]
pub fn upload(rows: &[Row]) -> RecordBatch {
    let column = |index: usize| {
        let values: Vec<&str> = rows.iter().map(|r| [r.0, r.1, r.2, r.3][index]).collect();
        text(&values)
    };
    batch(vec![
        ("State", column(0)),
        ("LGA", column(1)),
        ("Ward", column(2)),
        ("Health Facility", column(3)),
        (TESTED_U5, counts(&rows.iter().map(|r| r.4).collect::<Vec<_>>())),
        (POSITIVE_U5, counts(&rows.iter().map(|r| r.5).collect::<Vec<_>>())),
    ])
}

/// A registry unit with a placeholder polygon named after its id
#[must_use]
pub fn unit(id: &str, state: &str, lga: Option<&str>, ward: &str) -> CanonicalAdminUnit {
    CanonicalAdminUnit::new(id, state, lga, ward, format!("POLYGON (({id}))"))
}

/// A small Adamawa registry
#[must_use]
pub fn adamawa_registry() -> BoundaryRegistry {
    BoundaryRegistry::new(vec![
        unit("AD001", "Adamawa", Some("Yola North"), "Jimeta"),
        unit("AD002", "Adamawa", Some("Yola North"), "Doubeli"),
        unit("AD003", "Adamawa", Some("Yola North"), "Gwale I"),
        unit("AD004", "Adamawa", Some("Yola North"), "Gwale II"),
        unit("AD005", "Adamawa", Some("Yola South"), "Jimeta"),
        unit("AD006", "Adamawa", Some("Fufore"), "Gurin"),
    ])
}
