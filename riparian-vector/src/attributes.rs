//! Shapefile-style attribute model: a collection-level field schema with
//! per-record value vectors.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDataType {
    Int,
    Real,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeField {
    pub name: String,
    pub field_type: FieldDataType,
}

impl AttributeField {
    pub fn new(name: &str, field_type: FieldDataType) -> AttributeField {
        AttributeField {
            name: name.to_string(),
            field_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl FieldData {
    pub fn is_null(&self) -> bool {
        match self {
            FieldData::Null => true,
            FieldData::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldData::Int(v) => Some(*v as f64),
            FieldData::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldData::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldData {
    /// Nulls render as the empty string, never a textual placeholder.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldData::Null => Ok(()),
            FieldData::Int(v) => write!(f, "{}", v),
            FieldData::Real(v) => write!(f, "{}", v),
            FieldData::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Total ordering used for deterministic grouping and slot assignment:
/// null first, then numeric values, then text.
pub fn compare_values(a: &FieldData, b: &FieldData) -> Ordering {
    fn rank(v: &FieldData) -> u8 {
        match v {
            FieldData::Null => 0,
            FieldData::Int(_) | FieldData::Real(_) => 1,
            FieldData::Text(_) => 2,
        }
    }
    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => match (a, b) {
            (FieldData::Null, FieldData::Null) => Ordering::Equal,
            (FieldData::Text(x), FieldData::Text(y)) => x.cmp(y),
            _ => {
                let x = a.as_f64().unwrap_or(0.0);
                let y = b.as_f64().unwrap_or(0.0);
                x.total_cmp(&y)
            }
        },
        other => other,
    }
}

/// Builds the output field list for a spatial join from an explicit
/// allow-list. A fresh projection is computed for every join; nothing is
/// carried over between calls. Target fields keep their position ahead of
/// source fields; a source field whose name collides with a retained target
/// field is suffixed with "_1".
pub fn project(
    target_fields: &[AttributeField],
    source_fields: &[AttributeField],
    keep: Option<&[&str]>,
) -> Vec<AttributeField> {
    let keep_name = |name: &str| -> bool {
        match keep {
            Some(list) => list.iter().any(|k| *k == name),
            None => true,
        }
    };
    let mut out: Vec<AttributeField> = Vec::new();
    for f in target_fields {
        if keep_name(&f.name) {
            out.push(f.clone());
        }
    }
    for f in source_fields {
        if keep_name(&f.name) {
            if out.iter().any(|existing| existing.name == f.name) {
                out.push(AttributeField::new(
                    &format!("{}_1", f.name),
                    f.field_type,
                ));
            } else {
                out.push(f.clone());
            }
        }
    }
    out
}
