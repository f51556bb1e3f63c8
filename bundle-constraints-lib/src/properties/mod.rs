//! The property model: typed facts describing a candidate bundle
//!
//! A bundle declares an ordered list of [`Property`] values. Constraints are evaluated against
//! such a list. First-party property types (`olm.gvk`, `olm.package`, `olm.label`,
//! `olm.deprecated`) are decoded into typed values when a property is built. Any other type keeps
//! its value as dynamic JSON, which only expression constraints look into.
//!
//! Duplicate properties are permitted. The order of the list never changes an evaluation result,
//! but it is preserved so that diagnostics are deterministic.

mod properties_file;
mod property;

pub use properties_file::PropertiesFile;
pub use property::{DEPRECATED_TYPE, GVK_TYPE, GvkValue, LABEL_TYPE, LabelValue, PACKAGE_TYPE, PackageValue, Property, PropertyValue};

/// Projects a property list into the `properties` list bound into expressions.
#[must_use]
pub fn to_records(properties: &[Property]) -> serde_json::Value {
    serde_json::Value::Array(properties.iter().map(Property::to_record).collect())
}
