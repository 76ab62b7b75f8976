//! Feature collections: an ordered set of records sharing one field schema.
//! Stages never edit a collection in place; each operation returns a new
//! collection.

use crate::attributes::{AttributeField, FieldData};
use crate::geometry::Geometry;
use crate::VectorError;

#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry,
    pub values: Vec<FieldData>,
}

#[derive(Debug, Clone)]
pub struct FeatureCollection {
    pub fields: Vec<AttributeField>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(fields: Vec<AttributeField>) -> FeatureCollection {
        FeatureCollection {
            fields,
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn require_field(&self, name: &str) -> Result<usize, VectorError> {
        self.field_index(name)
            .ok_or_else(|| VectorError::MissingField(name.to_string()))
    }

    pub fn push(&mut self, geometry: Geometry, mut values: Vec<FieldData>) {
        values.resize(self.fields.len(), FieldData::Null);
        self.features.push(Feature { geometry, values });
    }

    pub fn value(&self, record: usize, field: usize) -> &FieldData {
        &self.features[record].values[field]
    }

    pub fn set_value(&mut self, record: usize, field: usize, value: FieldData) {
        self.features[record].values[field] = value;
    }

    /// Appends a field, padding every existing record with null.
    pub fn add_field(&mut self, field: AttributeField) {
        self.fields.push(field);
        for f in &mut self.features {
            f.values.push(FieldData::Null);
        }
    }

    /// Keeps only the listed fields, in their current schema order. Names
    /// not present in the schema are ignored.
    pub fn retain_fields(&mut self, keep: &[&str]) {
        let mask: Vec<bool> = self
            .fields
            .iter()
            .map(|f| keep.iter().any(|k| *k == f.name))
            .collect();
        self.fields = self
            .fields
            .iter()
            .zip(&mask)
            .filter(|(_, m)| **m)
            .map(|(f, _)| f.clone())
            .collect();
        for feature in &mut self.features {
            feature.values = feature
                .values
                .iter()
                .zip(&mask)
                .filter(|(_, m)| **m)
                .map(|(v, _)| v.clone())
                .collect();
        }
    }

    pub fn drop_fields(&mut self, names: &[&str]) {
        let keep: Vec<String> = self
            .fields
            .iter()
            .filter(|f| !names.iter().any(|n| *n == f.name))
            .map(|f| f.name.clone())
            .collect();
        let refs: Vec<&str> = keep.iter().map(|s| s.as_str()).collect();
        self.retain_fields(&refs);
    }

    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<(), VectorError> {
        let idx = self.require_field(old)?;
        self.fields[idx].name = new.to_string();
        Ok(())
    }

    /// Applies an (old, new) rename list; a missing old name is an error.
    pub fn rename_fields(&mut self, renames: &[(&str, &str)]) -> Result<(), VectorError> {
        for (old, new) in renames {
            self.rename_field(old, new)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::FieldDataType;
    use crate::geometry::{Point2D, Polygon};

    fn sample() -> FeatureCollection {
        let mut fc = FeatureCollection::new(vec![
            AttributeField::new("WATERBODY_POLY_ID", FieldDataType::Int),
            AttributeField::new("GNIS_NAME_1", FieldDataType::Text),
        ]);
        fc.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 1.0, 1.0)),
            vec![FieldData::Int(7), FieldData::Text("Tezzeron Lake".into())],
        );
        fc.push(
            Geometry::Point(Point2D::new(5.0, 5.0)),
            vec![FieldData::Null],
        );
        fc
    }

    #[test]
    fn test_push_pads_missing_values() {
        let fc = sample();
        assert_eq!(*fc.value(1, 1), FieldData::Null);
    }

    #[test]
    fn test_add_field_pads_existing_records() {
        let mut fc = sample();
        fc.add_field(AttributeField::new("Lakes_Area_Ha", FieldDataType::Real));
        assert_eq!(fc.features[0].values.len(), 3);
        assert_eq!(*fc.value(0, 2), FieldData::Null);
    }

    #[test]
    fn test_retain_and_drop_fields() {
        let mut fc = sample();
        fc.retain_fields(&["GNIS_NAME_1"]);
        assert_eq!(fc.fields.len(), 1);
        assert_eq!(
            *fc.value(0, 0),
            FieldData::Text("Tezzeron Lake".to_string())
        );

        let mut fc2 = sample();
        fc2.drop_fields(&["GNIS_NAME_1"]);
        assert_eq!(fc2.fields.len(), 1);
        assert_eq!(fc2.fields[0].name, "WATERBODY_POLY_ID");
    }

    #[test]
    fn test_rename_missing_field_errors() {
        let mut fc = sample();
        assert!(fc.rename_field("NOT_THERE", "X").is_err());
        assert!(fc.rename_field("GNIS_NAME_1", "Lake_Name").is_ok());
        assert!(fc.field_index("Lake_Name").is_some());
    }
}
