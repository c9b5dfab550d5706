//! PIX container model.
//!
//! A container is an ordered list of sections. Each section has a type name,
//! ordered key/value properties, ordered data rows and ordered child sections.
//! The model is purely structural: nothing here knows what a `Look` or a
//! `Material` is, and nothing validates data rows against `Format`.

use serde::{Deserialize, Serialize};

use super::format::DataFormat;

/// A single scalar inside a data row or a property tuple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Int(i64),
    Float(f32),
    Str(String),
}

impl Scalar {
    /// Integer value, if this scalar is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value. Integers widen to float.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Scalar::Float(v) => Some(*v),
            Scalar::Int(v) => Some(*v as f32),
            Scalar::Str(_) => None,
        }
    }

    /// String value, if this scalar is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One data row. Arity and scalar kind are given by the section's `Format`.
pub type DataRow = Vec<Scalar>;

/// The value of a section property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Int(i64),
    Float(f32),
    /// A quoted string
    Str(String),
    /// A bare identifier such as `FLOAT3`
    Token(String),
    Bool(bool),
    /// A parenthesised tuple of scalars
    Array(Vec<Scalar>),
}

impl PropertyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value. Integers widen to float.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Text of a quoted string or a bare token.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) | PropertyValue::Token(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            PropertyValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// First integer of the value: the value itself for `Int`, or the first
    /// element of a tuple.
    pub fn first_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Array(items) => items.first().and_then(Scalar::as_int),
            _ => None,
        }
    }
}

/// A named node of the container tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section type, e.g. `Look` or `Material`
    pub kind: String,

    /// Properties in file order. Duplicate keys are kept.
    pub props: Vec<(String, PropertyValue)>,

    /// Data rows in file order
    pub data: Vec<DataRow>,

    /// Child sections in file order
    pub sections: Vec<Section>,
}

impl Section {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Value of the first property with the given key.
    ///
    /// Duplicate keys are not resolved here; use [`Section::props_named`]
    /// to see every occurrence.
    pub fn get_prop_value(&self, key: &str) -> Option<&PropertyValue> {
        self.props.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value stored under `key`, in insertion order.
    pub fn props_named<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a PropertyValue> + 'a {
        self.props.iter().filter(move |(k, _)| k == key).map(|(_, v)| v)
    }

    /// First child section of the given type.
    pub fn get_section(&self, kind: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// All child sections of the given type, in order.
    pub fn sections_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    pub fn push_prop(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.props.push((key.into(), value));
    }

    /// Append a data row. Arity is not checked against `Format`.
    pub fn push_row(&mut self, row: DataRow) {
        self.data.push(row);
    }

    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Builder-style variant of [`Section::push_prop`].
    pub fn with_prop(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.push_prop(key, value);
        self
    }

    /// Builder-style variant of [`Section::push_section`].
    pub fn with_section(mut self, section: Section) -> Self {
        self.push_section(section);
        self
    }

    /// Data format declared by the `Format` property, if it names a known tag.
    pub fn format(&self) -> Option<DataFormat> {
        self.get_prop_value("Format")
            .and_then(PropertyValue::as_str)
            .and_then(DataFormat::from_tag)
    }
}

/// Index path from the container root to a section.
///
/// Used by decoded records to point back into the tree they came from
/// without borrowing it. Resolve with [`Container::resolve`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionPath(pub Vec<usize>);

impl SectionPath {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of the `index`-th child of this section.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }
}

/// A decoded PIX file: the ordered top-level sections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub sections: Vec<Section>,
}

impl Container {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// First top-level section of the given type.
    pub fn get_section(&self, kind: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// All top-level sections of the given type, in order.
    pub fn sections_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Follow a section path. Returns `None` if any index is out of range.
    pub fn resolve(&self, path: &SectionPath) -> Option<&Section> {
        let (first, rest) = path.0.split_first()?;
        let mut section = self.sections.get(*first)?;
        for &index in rest {
            section = section.sections.get(index)?;
        }
        Some(section)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
