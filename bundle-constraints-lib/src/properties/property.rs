use crate::constraints::{ConstraintError, ConstraintResult};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Property type describing a provided API.
pub const GVK_TYPE: &str = "olm.gvk";

/// Property type describing the package identity of a bundle.
pub const PACKAGE_TYPE: &str = "olm.package";

/// Property type attaching a free-form label to a bundle.
pub const LABEL_TYPE: &str = "olm.label";

/// Property type marking a bundle as deprecated.
pub const DEPRECATED_TYPE: &str = "olm.deprecated";

/// The group, version, and kind of a provided API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GvkValue {
    pub group: String,
    pub version: String,
    pub kind: String,
}

/// The name and version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageValue {
    pub package_name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelValue {
    pub label: String,
}

/// The typed value of a property.
///
/// First-party property types are decoded when the property is built, everything else is kept as
/// a dynamic JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Gvk(GvkValue),
    Package(PackageValue),
    Label(LabelValue),
    Deprecated(JsonValue),
    Other(JsonValue),
}

impl PropertyValue {
    /// The JSON form of the value, as seen by expressions.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let result = match self {
            Self::Gvk(gvk) => serde_json::to_value(gvk),
            Self::Package(package) => serde_json::to_value(package),
            Self::Label(label) => serde_json::to_value(label),
            Self::Deprecated(value) | Self::Other(value) => Ok(value.clone()),
        };

        // plain string structs always serialize
        result.unwrap_or(JsonValue::Null)
    }
}

/// A single typed fact about a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    property_type: String,
    value: PropertyValue,
}

impl Property {
    /// Builds a property, decoding first-party values into their typed form.
    ///
    /// # Errors
    /// Returns [`ConstraintError::InvalidProperty`] if the type is empty, or if a first-party
    /// property's value does not have the expected shape.
    pub fn new(property_type: impl Into<String>, value: JsonValue) -> ConstraintResult<Self> {
        let property_type = property_type.into();
        if property_type.is_empty() {
            return Err(ConstraintError::InvalidProperty {
                property_type,
                reason: "property type must not be empty".to_string(),
            });
        }

        let invalid = |e: serde_json::Error| ConstraintError::InvalidProperty {
            property_type: property_type.clone(),
            reason: e.to_string(),
        };

        let value = match property_type.as_str() {
            GVK_TYPE => PropertyValue::Gvk(serde_json::from_value(value).map_err(invalid)?),
            PACKAGE_TYPE => PropertyValue::Package(serde_json::from_value(value).map_err(invalid)?),
            LABEL_TYPE => PropertyValue::Label(serde_json::from_value(value).map_err(invalid)?),
            DEPRECATED_TYPE => PropertyValue::Deprecated(value),
            _ => PropertyValue::Other(value),
        };

        Ok(Self { property_type, value })
    }

    #[must_use]
    pub fn gvk(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            property_type: GVK_TYPE.to_string(),
            value: PropertyValue::Gvk(GvkValue {
                group: group.into(),
                version: version.into(),
                kind: kind.into(),
            }),
        }
    }

    #[must_use]
    pub fn package(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            property_type: PACKAGE_TYPE.to_string(),
            value: PropertyValue::Package(PackageValue {
                package_name: package_name.into(),
                version: version.into(),
            }),
        }
    }

    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            property_type: LABEL_TYPE.to_string(),
            value: PropertyValue::Label(LabelValue { label: label.into() }),
        }
    }

    #[must_use]
    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    #[must_use]
    pub const fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Projects this property into the `{type, value}` record bound into expressions.
    #[must_use]
    pub fn to_record(&self) -> JsonValue {
        serde_json::json!({
            "type": self.property_type,
            "value": self.value.to_json(),
        })
    }
}

impl Serialize for Property {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Property", 2)?;
        state.serialize_field("type", &self.property_type)?;
        state.serialize_field("value", &self.value.to_json())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Property {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct PropertyData {
            #[serde(rename = "type")]
            property_type: String,
            #[serde(default)]
            value: JsonValue,
        }

        let data = PropertyData::deserialize(deserializer)?;

        Self::new(data.property_type, data.value).map_err(D::Error::custom)
    }
}
