//! Typed producer for `Stream` sections.
//!
//! The container model accepts any row; this builder is where arity is
//! enforced on the way in, so sections it produces always encode cleanly.

use std::collections::BTreeSet;

use super::format::DataFormat;
use super::types::{PropertyValue, Scalar, Section};

/// Kind of per-vertex stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Position,
    Normal,
    Tangent,
    Rgb,
    Rgba,
    /// Texture coordinates, index 0-9
    Uv(u8),
    /// Texture-space coordinates, index 0-9
    Tuv(u8),
}

impl StreamKind {
    fn base_tag(self) -> &'static str {
        match self {
            StreamKind::Position => "_POSITION",
            StreamKind::Normal => "_NORMAL",
            StreamKind::Tangent => "_TANGENT",
            StreamKind::Rgb => "_RGB",
            StreamKind::Rgba => "_RGBA",
            StreamKind::Uv(_) => "_UV",
            StreamKind::Tuv(_) => "_TUV",
        }
    }

    /// Full tag, with the index appended for UV streams.
    pub fn tag(self) -> String {
        match self {
            StreamKind::Uv(i) | StreamKind::Tuv(i) if i < 10 => format!("{}{}", self.base_tag(), i),
            _ => self.base_tag().to_string(),
        }
    }

    /// Row format of the stream. `Tuv` streams carry no fixed format.
    pub fn format(self) -> Option<DataFormat> {
        match self {
            StreamKind::Position | StreamKind::Normal | StreamKind::Rgb => Some(DataFormat::Float3),
            StreamKind::Tangent | StreamKind::Rgba => Some(DataFormat::Float4),
            StreamKind::Uv(_) => Some(DataFormat::Float2),
            StreamKind::Tuv(_) => None,
        }
    }
}

/// Builder for one stream section.
#[derive(Clone, Debug)]
pub struct Stream {
    kind: StreamKind,
    aliases: BTreeSet<String>,
    data: Vec<Vec<f32>>,
}

impl Stream {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            aliases: BTreeSet::new(),
            data: Vec::new(),
        }
    }

    /// Append a row. Returns `false` and stores nothing if the row length
    /// does not match the stream format.
    pub fn add_entry(&mut self, value: &[f32]) -> bool {
        if let Some(format) = self.kind.format() {
            if value.len() != format.arity() {
                return false;
            }
        }
        self.data.push(value.to_vec());
        true
    }

    /// Register an alias. Returns `false` if it was already present.
    pub fn add_alias(&mut self, alias: impl Into<String>) -> bool {
        self.aliases.insert(alias.into())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn tag(&self) -> String {
        self.kind.tag()
    }

    /// Pack the stream into a `Stream` section.
    pub fn to_section(&self) -> Section {
        let format_tag = self.kind.format().map_or("UNKNOWN", DataFormat::tag);

        let mut section = Section::new("Stream")
            .with_prop("Format", PropertyValue::Token(format_tag.to_string()))
            .with_prop("Tag", PropertyValue::Str(self.kind.tag()));

        if !self.aliases.is_empty() {
            section.push_prop("AliasCount", PropertyValue::Int(self.aliases.len() as i64));
            section.push_prop(
                "Aliases",
                PropertyValue::Array(self.aliases.iter().cloned().map(Scalar::Str).collect()),
            );
        }

        for row in &self.data {
            section.push_row(row.iter().copied().map(Scalar::Float).collect());
        }

        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pix::{parse_pix, write_pix, Container};

    #[test]
    fn test_add_entry_checks_arity() {
        let mut stream = Stream::new(StreamKind::Position);
        assert!(stream.add_entry(&[0.0, 1.0, 2.0]));
        assert!(!stream.add_entry(&[0.0, 1.0]));
        assert!(!stream.add_entry(&[0.0, 1.0, 2.0, 3.0]));
        assert_eq!(stream.len(), 1);

        let mut uv = Stream::new(StreamKind::Uv(1));
        assert!(uv.add_entry(&[0.5, 0.5]));
        assert!(!uv.add_entry(&[0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_tags() {
        assert_eq!(StreamKind::Normal.tag(), "_NORMAL");
        assert_eq!(StreamKind::Uv(3).tag(), "_UV3");
        assert_eq!(StreamKind::Tuv(0).tag(), "_TUV0");
        assert_eq!(StreamKind::Uv(12).tag(), "_UV");
    }

    #[test]
    fn test_aliases_are_unique_and_sorted() {
        let mut stream = Stream::new(StreamKind::Uv(0));
        assert!(stream.add_alias("b"));
        assert!(stream.add_alias("a"));
        assert!(!stream.add_alias("b"));

        let section = stream.to_section();
        assert_eq!(section.get_prop_value("AliasCount"), Some(&PropertyValue::Int(2)));
        assert_eq!(
            section.get_prop_value("Aliases"),
            Some(&PropertyValue::Array(vec![
                Scalar::Str("a".into()),
                Scalar::Str("b".into()),
            ]))
        );
    }

    #[test]
    fn test_section_encodes_and_decodes() {
        let mut stream = Stream::new(StreamKind::Tangent);
        stream.add_entry(&[1.0, 0.0, 0.0, 1.0]);
        stream.add_entry(&[0.0, 1.0, 0.0, -1.0]);

        let container = Container::new(vec![stream.to_section()]);
        let decoded = parse_pix(&write_pix(&container).unwrap()).unwrap();

        assert_eq!(decoded, container);
        assert_eq!(decoded.sections[0].data.len(), 2);
    }
}
