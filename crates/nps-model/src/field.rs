//! Declarative anchor + offset field specifications.
//!
//! A [`FieldSpec`] locates a value relative to a text label (the anchor)
//! instead of a fixed cell address, so sheets whose layout drifts between
//! template revisions can still be read.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Target type of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int,
    Float,
    #[serde(alias = "str")]
    String,
}

impl DType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an anchor is compared with cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// Regex matched at the start of the cell text.
    #[default]
    Prefix,
    /// Regex matched anywhere in the cell text.
    Contains,
    /// Trimmed cell text equals the anchor literally.
    Exact,
}

/// Location and type of one logical clinical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub anchor: String,
    #[serde(alias = "row_diff", default)]
    pub row_offset: i64,
    #[serde(alias = "col_diff", default)]
    pub col_offset: i64,
    pub dtype: DType,
    #[serde(default)]
    pub anchor_mode: AnchorMode,
}

impl FieldSpec {
    pub fn new(anchor: impl Into<String>, row_offset: i64, col_offset: i64, dtype: DType) -> Self {
        Self {
            anchor: anchor.into(),
            row_offset,
            col_offset,
            dtype,
            anchor_mode: AnchorMode::default(),
        }
    }

    #[must_use]
    pub fn with_anchor_mode(mut self, mode: AnchorMode) -> Self {
        self.anchor_mode = mode;
        self
    }
}

/// Compiled anchor matcher for a [`FieldSpec`].
#[derive(Debug, Clone)]
pub enum AnchorMatcher {
    Pattern(Regex),
    Literal(String),
}

impl AnchorMatcher {
    pub fn compile(field: &str, spec: &FieldSpec) -> Result<Self, ModelError> {
        let pattern = match spec.anchor_mode {
            AnchorMode::Exact => return Ok(Self::Literal(spec.anchor.trim().to_string())),
            AnchorMode::Prefix => format!("^(?:{})", spec.anchor),
            AnchorMode::Contains => spec.anchor.clone(),
        };
        Regex::new(&pattern)
            .map(Self::Pattern)
            .map_err(|source| ModelError::InvalidAnchor {
                field: field.to_string(),
                source,
            })
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(text),
            Self::Literal(literal) => text.trim() == literal,
        }
    }
}

/// Field map keyed by output field name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldSpec>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        self.0.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of fields declared as integers.
    pub fn int_fields(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, spec)| spec.dtype == DType::Int)
            .map(|(name, _)| name)
    }

    /// Compile every anchor, failing on the first invalid pattern.
    pub fn compile(&self) -> Result<Vec<CompiledField<'_>>, ModelError> {
        self.iter()
            .map(|(name, spec)| {
                Ok(CompiledField {
                    name,
                    spec,
                    matcher: AnchorMatcher::compile(name, spec)?,
                })
            })
            .collect()
    }
}

impl FromIterator<(String, FieldSpec)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldSpec)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A field spec paired with its compiled anchor.
#[derive(Debug, Clone)]
pub struct CompiledField<'a> {
    pub name: &'a str,
    pub spec: &'a FieldSpec,
    pub matcher: AnchorMatcher,
}

/// Typed value of an extracted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Integer view of the value, if it represents a whole number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Self::Float(_) => None,
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
