//! Parameter metadata for coverage ranges.
//!
//! Parameters describe what a range measures: its observed property,
//! unit and descriptive text. They carry no numeric data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// UCUM unit system URI used for unit symbols.
pub const UCUM: &str = "http://www.opengis.net/def/uom/UCUM/";

/// A parameter (observed property) of a coverage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    /// The type of parameter (always "Parameter").
    #[serde(rename = "type")]
    pub type_: String,

    /// Name of the variable this parameter describes.
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,

    /// Multi-language description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<I18nString>,

    /// Unit of measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    /// The observed property.
    #[serde(rename = "observedProperty")]
    pub observed_property: ObservedProperty,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(variable_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            type_: "Parameter".to_string(),
            variable_name: Some(variable_name.into()),
            description: None,
            unit: None,
            observed_property: ObservedProperty::new(label),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(I18nString::english(&desc.into()));
        self
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// The unit symbol, if any.
    pub fn symbol(&self) -> Option<&str> {
        self.unit
            .as_ref()
            .and_then(|u| u.symbol.as_ref())
            .map(UnitSymbol::value)
    }
}

/// Internationalized string supporting multiple languages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum I18nString {
    /// Simple string (assumes English).
    Simple(String),
    /// Map of language codes to strings.
    Localized(BTreeMap<String, String>),
}

impl I18nString {
    /// Create an English-only i18n string.
    pub fn english(s: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert("en".to_string(), s.to_string());
        I18nString::Localized(map)
    }

    /// Get the English text, or any available text.
    pub fn text(&self) -> &str {
        match self {
            I18nString::Simple(s) => s,
            I18nString::Localized(map) => map
                .get("en")
                .or_else(|| map.values().next())
                .map(|s| s.as_str())
                .unwrap_or(""),
        }
    }
}

/// The observed property being measured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedProperty {
    /// URI identifier for the property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human-readable label.
    pub label: I18nString,
}

impl ObservedProperty {
    /// Create a new observed property with a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: I18nString::english(&label.into()),
        }
    }

    /// Set the ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Unit of measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Human-readable label for the unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<I18nString>,

    /// Symbol or abbreviation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<UnitSymbol>,
}

impl Unit {
    /// Create a unit with label and a UCUM symbol.
    pub fn new(label: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            label: Some(I18nString::english(&label.into())),
            symbol: Some(UnitSymbol::Structured {
                value: symbol.into(),
                type_: Some(UCUM.to_string()),
            }),
        }
    }
}

/// Unit symbol representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UnitSymbol {
    /// Simple string symbol.
    Simple(String),
    /// Structured symbol with type and value.
    Structured {
        /// Symbol value.
        value: String,
        /// Symbol type (e.g., "<http://www.opengis.net/def/uom/UCUM/>").
        #[serde(rename = "type")]
        type_: Option<String>,
    },
}

impl UnitSymbol {
    /// Get the symbol string.
    pub fn value(&self) -> &str {
        match self {
            UnitSymbol::Simple(s) => s,
            UnitSymbol::Structured { value, .. } => value,
        }
    }
}
