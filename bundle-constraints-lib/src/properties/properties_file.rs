use super::Property;
use crate::Result;
use camino::Utf8Path;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;

/// A document listing the properties a bundle declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertiesFile {
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl PropertiesFile {
    /// Loads a properties document, as YAML when the extension says so and as JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading properties file '{path}'"))?;

        if matches!(path.extension(), Some("yaml" | "yml")) {
            serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing properties file '{path}'"))
        } else {
            serde_json::from_str(&text).into_app_err_with(|| format!("parsing properties file '{path}'"))
        }
    }
}
