//! UI schema metadata.
//!
//! An endpoint may describe how a front end should render its input or
//! output. The data is carried verbatim for documentation; only its shape is
//! checked at registration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How the fields are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiLayout {
    /// An input form.
    Form,
    /// A read-only card.
    Card,
    /// A tabular listing.
    Table,
}

/// Rendering hint for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiField {
    /// Widget type, e.g. `text` or `email`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Label shown next to the field.
    pub label: String,
    /// Display mode, e.g. `readonly`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Free-form validation hint for the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<serde_json::Value>,
}

impl UiField {
    /// Creates a field.
    #[must_use]
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
            display: None,
            validation: None,
        }
    }

    /// Sets the display mode.
    #[must_use]
    pub fn display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// UI schema attached to an endpoint.
///
/// Both parts are optional in the type so that incomplete schemas can be
/// deserialized and then reported by the registry.
///
/// ```
/// use tokendsl_core::ui::{UiField, UiLayout, UiSchema};
///
/// let ui = UiSchema::new(UiLayout::Form)
///     .field("name", UiField::new("text", "Full name"))
///     .field("email", UiField::new("email", "Email address"));
/// assert_eq!(ui.missing_part(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSchema {
    /// Layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<UiLayout>,
    /// Fields by name, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IndexMap<String, UiField>>,
}

impl UiSchema {
    /// Creates a schema with a layout and no fields yet.
    #[must_use]
    pub fn new(layout: UiLayout) -> Self {
        Self {
            layout: Some(layout),
            fields: Some(IndexMap::new()),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: UiField) -> Self {
        self.fields
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), field);
        self
    }

    /// Returns the name of the first absent part, if any.
    #[must_use]
    pub fn missing_part(&self) -> Option<&'static str> {
        if self.layout.is_none() {
            Some("layout")
        } else if self.fields.is_none() {
            Some("fields")
        } else {
            None
        }
    }
}
