//! Work centers. A label carrying [`PROJECT_PREFIX`] names a project.

use serde::{Deserialize, Serialize};

use super::de;

/// Marker distinguishing projects from physical sites.
pub const PROJECT_PREFIX: &str = "[PROYECTO] ";

/// A work center as stored by the ERP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Center {
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub rowid: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub label: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub radius: Option<f64>,
}

impl Center {
    /// Whether this center is a project.
    #[must_use]
    pub fn is_project(&self) -> bool {
        is_project(&self.label)
    }

    /// Label without the project marker.
    #[must_use]
    pub fn display_label(&self) -> &str {
        clean_label(&self.label)
    }
}

#[must_use]
pub fn is_project(label: &str) -> bool {
    label.starts_with(PROJECT_PREFIX)
}

#[must_use]
pub fn clean_label(label: &str) -> &str {
    label.strip_prefix(PROJECT_PREFIX).unwrap_or(label)
}

#[must_use]
pub fn add_project_prefix(label: &str) -> String {
    if is_project(label) {
        label.to_string()
    } else {
        format!("{PROJECT_PREFIX}{label}")
    }
}

/// Label as it should be persisted for the given kind.
#[must_use]
pub fn format_label_for_save(label: &str, project: bool) -> String {
    let clean = clean_label(label);
    if project {
        add_project_prefix(clean)
    } else {
        clean.to_string()
    }
}
