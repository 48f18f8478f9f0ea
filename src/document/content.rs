//! Body items and annotations carried by protocol steps.
//!
//! A step's body is an ordered list of [`ContentItem`]s: free text, or a typed
//! [`Parameter`] holding zero or more values. Steps additionally carry
//! [`Note`]s and [`DataReference`]s, an optional [`ValueTable`] overlay, and the
//! root step may carry [`ExperimentInfo`].
//!
//! # Example
//!
//! ```
//! use stepquill::document::content::{ContentItem, Parameter, ParamKind, ParamValue};
//!
//! let mut volume = Parameter::new("Volume", ParamKind::Number { units: Some("ml".to_string()) });
//! volume.push_value(ParamValue::Number(2.5));
//! assert_eq!(volume.value_count(), 1);
//!
//! let item = ContentItem::Parameter(volume);
//! assert_eq!(item.name(), Some("Volume"));
//! assert!(item.is_atomic_parameter());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{EditError, Result};

/// The kind of value a parameter holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    Text,
    Number { units: Option<String> },
    Enumeration { options: Vec<String> },
    Boolean,
    DateTime,
    /// Term picked from an external ontology
    Ontology,
    /// Link to a file or remote object
    Link,
}

impl ParamKind {
    /// Returns true for kinds that hold one scalar per row and can therefore
    /// be laid out as a column of a [`ValueTable`].
    pub fn is_atomic(&self) -> bool {
        !matches!(self, ParamKind::Ontology | ParamKind::Link)
    }
}

/// A single parameter value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParamValue {
    Text(String),
    Number(f64),
    Boolean(bool),
}

/// Numbers compare by total order, so a stored NaN still equals its own copy.
impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Text(a), ParamValue::Text(b)) => a == b,
            (ParamValue::Number(a), ParamValue::Number(b)) => a.total_cmp(b).is_eq(),
            (ParamValue::Boolean(a), ParamValue::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{}", s),
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl ParamValue {
    /// Parses user input, preferring finite numbers then booleans, falling
    /// back to text. `NaN` and `inf` stay text.
    pub fn parse(input: &str) -> Self {
        if let Some(n) = input.parse::<f64>().ok().filter(|n| n.is_finite()) {
            return ParamValue::Number(n);
        }
        match input {
            "true" => ParamValue::Boolean(true),
            "false" => ParamValue::Boolean(false),
            _ => ParamValue::Text(input.to_string()),
        }
    }
}

/// A typed parameter inside a step body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: Option<String>,
    kind: ParamKind,
    values: Vec<ParamValue>,
}

impl Parameter {
    /// Creates a named parameter with no values.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            values: Vec::new(),
        }
    }

    /// Creates an unnamed parameter with no values.
    pub fn unnamed(kind: ParamKind) -> Self {
        Self {
            name: None,
            kind,
            values: Vec::new(),
        }
    }

    /// Builder-style helper that appends values.
    pub fn with_values(mut self, values: impl IntoIterator<Item = ParamValue>) -> Self {
        self.values.extend(values);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn value_at(&self, index: usize) -> Option<&ParamValue> {
        self.values.get(index)
    }

    pub fn push_value(&mut self, value: ParamValue) {
        self.values.push(value);
    }

    /// Inserts a value at `index`, shifting later values right.
    pub fn insert_value(&mut self, index: usize, value: ParamValue) -> Result<()> {
        if index > self.values.len() {
            return Err(EditError::IndexOutOfBounds {
                what: "parameter values",
                index,
                len: self.values.len(),
            });
        }
        self.values.insert(index, value);
        Ok(())
    }

    /// Removes and returns the value at `index`.
    pub fn remove_value(&mut self, index: usize) -> Result<ParamValue> {
        if index >= self.values.len() {
            return Err(EditError::IndexOutOfBounds {
                what: "parameter values",
                index,
                len: self.values.len(),
            });
        }
        Ok(self.values.remove(index))
    }
}

/// An ordered element of a step body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentItem {
    Text(String),
    Parameter(Parameter),
}

impl ContentItem {
    /// Convenience constructor for free text.
    pub fn text(s: impl Into<String>) -> Self {
        ContentItem::Text(s.into())
    }

    /// The item's name. Free text is never named.
    pub fn name(&self) -> Option<&str> {
        match self {
            ContentItem::Text(_) => None,
            ContentItem::Parameter(p) => p.name(),
        }
    }

    /// Sets the item's name; ignored for free text.
    pub fn set_name(&mut self, name: Option<String>) {
        if let ContentItem::Parameter(p) = self {
            p.set_name(name);
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            ContentItem::Parameter(p) => Some(p),
            ContentItem::Text(_) => None,
        }
    }

    pub fn as_parameter_mut(&mut self) -> Option<&mut Parameter> {
        match self {
            ContentItem::Parameter(p) => Some(p),
            ContentItem::Text(_) => None,
        }
    }

    pub fn is_atomic_parameter(&self) -> bool {
        self.as_parameter().is_some_and(|p| p.kind().is_atomic())
    }
}

/// A free-form note attached to a step while it is part of an experiment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub name: String,
    pub text: String,
}

impl Note {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A reference from a step to an external data object (image, dataset, file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReference {
    pub name: String,
    pub target: String,
    pub mime_type: Option<String>,
}

impl DataReference {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Tabular overlay laying a step's atomic parameters out as columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueTable {
    pub columns: Vec<String>,
}

impl ValueTable {
    /// Builds a table with one column per atomic parameter in `content`.
    /// Unnamed parameters get a positional column name.
    pub fn for_content(content: &[ContentItem]) -> Self {
        let columns = content
            .iter()
            .filter_map(ContentItem::as_parameter)
            .filter(|p| p.kind().is_atomic())
            .enumerate()
            .map(|(i, p)| {
                p.name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Column {}", i + 1))
            })
            .collect();
        Self { columns }
    }
}

/// Root-only attribute set marking the document as a performed run rather
/// than a reusable template.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExperimentInfo {
    attributes: IndexMap<String, String>,
}

impl ExperimentInfo {
    pub const INVESTIGATOR: &'static str = "investigator";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_investigator(investigator: impl Into<String>) -> Self {
        let mut info = Self::new();
        info.set(Self::INVESTIGATOR, investigator);
        info
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn investigator(&self) -> Option<&str> {
        self.get(Self::INVESTIGATOR)
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_value_parse() {
        assert_eq!(ParamValue::parse("7"), ParamValue::Number(7.0));
        assert_eq!(ParamValue::parse("true"), ParamValue::Boolean(true));
        assert_eq!(ParamValue::parse("DAPI"), ParamValue::Text("DAPI".to_string()));
        assert_eq!(ParamValue::parse("NaN"), ParamValue::Text("NaN".to_string()));
        assert_eq!(ParamValue::parse("-inf"), ParamValue::Text("-inf".to_string()));
    }

    #[test]
    fn test_nan_equals_itself() {
        let nan = ParamValue::Number(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(ParamValue::Number(1.0), ParamValue::Text("1".to_string()));
    }

    #[test]
    fn test_remove_value_out_of_bounds() {
        let mut p = Parameter::new("Temp", ParamKind::Number { units: None });
        assert!(matches!(
            p.remove_value(0),
            Err(EditError::IndexOutOfBounds { index: 0, len: 0, .. })
        ));
    }

    #[test]
    fn test_insert_value_keeps_order() {
        let mut p = Parameter::new("Temp", ParamKind::Number { units: None })
            .with_values([ParamValue::Number(1.0), ParamValue::Number(3.0)]);
        p.insert_value(1, ParamValue::Number(2.0)).unwrap();
        assert_eq!(
            p.values(),
            &[
                ParamValue::Number(1.0),
                ParamValue::Number(2.0),
                ParamValue::Number(3.0)
            ]
        );
    }

    #[test]
    fn test_text_has_no_name() {
        let mut item = ContentItem::text("Incubate overnight");
        item.set_name(Some("ignored".to_string()));
        assert_eq!(item.name(), None);
    }

    #[test]
    fn test_value_table_skips_non_atomic() {
        let content = vec![
            ContentItem::Parameter(Parameter::new("Dye", ParamKind::Text)),
            ContentItem::Parameter(Parameter::new("Term", ParamKind::Ontology)),
            ContentItem::text("wash"),
            ContentItem::Parameter(Parameter::unnamed(ParamKind::Boolean)),
        ];
        let table = ValueTable::for_content(&content);
        assert_eq!(table.columns, vec!["Dye".to_string(), "Column 2".to_string()]);
    }
}
