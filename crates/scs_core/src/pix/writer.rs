//! PIX text encoder.
//!
//! Output is deterministic: properties, then data rows, then child sections,
//! each in stored order, indented four spaces per nesting level. Decoding the
//! output yields a container equal to the one encoded.

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;

use super::format::{DataFormat, ScalarKind};
use super::parser::is_identifier;
use super::types::{Container, DataRow, PropertyValue, Scalar, Section};

/// Errors raised while encoding a container.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Section '{section}' has data rows but no Format")]
    MissingFormat { section: String },

    #[error("Section '{section}' declares unknown format '{tag}'")]
    UnknownFormat { section: String, tag: String },

    #[error("'{text}' in section '{section}' is not a valid {role}")]
    InvalidIdentifier {
        section: String,
        role: &'static str,
        text: String,
    },

    #[error("Row {row} of section '{section}' does not match format {format}")]
    RowMismatch {
        section: String,
        row: usize,
        format: DataFormat,
    },
}

/// Result type for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

const INDENT: &str = "    ";

/// PIX container encoder.
#[derive(Default)]
pub struct PixWriter {
    out: String,
}

impl PixWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a container and return the text.
    pub fn write(mut self, container: &Container) -> EncodeResult<String> {
        for section in &container.sections {
            self.write_section(section, 0)?;
        }
        Ok(self.out)
    }

    fn write_section(&mut self, section: &Section, depth: usize) -> EncodeResult<()> {
        check_identifier(section, "section type", &section.kind)?;
        self.line(depth, &format!("{} {{", section.kind));

        for (key, value) in &section.props {
            check_identifier(section, "property key", key)?;
            if let PropertyValue::Token(token) = value {
                check_token(section, token)?;
            }
            self.line(depth + 1, &format!("{}: {}", key, format_value(value)));
        }

        if !section.data.is_empty() {
            let format = row_format(section)?;
            self.line(depth + 1, &format!("data[{}] {{", section.data.len()));
            for (i, row) in section.data.iter().enumerate() {
                check_row(section, i, row, format)?;
                let text: Vec<String> = row.iter().map(format_scalar).collect();
                self.line(depth + 2, &text.join(" "));
            }
            self.line(depth + 1, "}");
        }

        for child in &section.sections {
            self.write_section(child, depth + 1)?;
        }

        self.line(depth, "}");
        Ok(())
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

/// Declared format of a section that carries data rows.
fn row_format(section: &Section) -> EncodeResult<DataFormat> {
    let tag = section
        .get_prop_value("Format")
        .and_then(PropertyValue::as_str)
        .ok_or_else(|| EncodeError::MissingFormat {
            section: section.kind.clone(),
        })?;

    DataFormat::from_tag(tag).ok_or_else(|| EncodeError::UnknownFormat {
        section: section.kind.clone(),
        tag: tag.to_string(),
    })
}

fn check_identifier(section: &Section, role: &'static str, text: &str) -> EncodeResult<()> {
    if is_identifier(text) {
        Ok(())
    } else {
        Err(EncodeError::InvalidIdentifier {
            section: section.kind.clone(),
            role,
            text: text.to_string(),
        })
    }
}

/// Bare tokens must lex as identifiers and must not read back as booleans.
fn check_token(section: &Section, token: &str) -> EncodeResult<()> {
    if token == "true" || token == "false" {
        return Err(EncodeError::InvalidIdentifier {
            section: section.kind.clone(),
            role: "token",
            text: token.to_string(),
        });
    }
    check_identifier(section, "token", token)
}

/// Producer-side arity and kind check for one row.
fn check_row(section: &Section, index: usize, row: &DataRow, format: DataFormat) -> EncodeResult<()> {
    let kind_ok = row.iter().all(|scalar| {
        matches!(
            (format.kind(), scalar),
            (ScalarKind::Float, Scalar::Float(_))
                | (ScalarKind::Int, Scalar::Int(_))
                | (ScalarKind::Str, Scalar::Str(_))
        )
    });

    if row.len() != format.arity() || !kind_ok {
        return Err(EncodeError::RowMismatch {
            section: section.kind.clone(),
            row: index,
            format,
        });
    }
    Ok(())
}

/// Float text that always decodes back to the same `f32` and never reads
/// as an integer. Non-finite values use the `&` hex notation.
pub fn format_float(value: f32) -> String {
    if !value.is_finite() {
        return format!("&{:08x}", value.to_bits());
    }
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

fn format_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Int(v) => v.to_string(),
        Scalar::Float(v) => format_float(*v),
        Scalar::Str(s) => format_string(s),
    }
}

fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Int(v) => v.to_string(),
        PropertyValue::Float(v) => format_float(*v),
        PropertyValue::Str(s) => format_string(s),
        PropertyValue::Token(s) => s.clone(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Array(items) => {
            let mut out = String::from("(");
            for item in items {
                let _ = write!(out, " {}", format_scalar(item));
            }
            out.push_str(" )");
            out
        }
    }
}

/// Encode a container to PIX text.
pub fn write_pix(container: &Container) -> EncodeResult<String> {
    PixWriter::new().write(container)
}

/// Encode a container to file bytes.
pub fn encode(container: &Container) -> EncodeResult<Vec<u8>> {
    write_pix(container).map(String::into_bytes)
}

/// Encode a container and write it to `path`.
pub fn write_pix_file<P: AsRef<Path>>(container: &Container, path: P) -> EncodeResult<()> {
    let text = write_pix(container)?;
    std::fs::write(path, text)?;
    Ok(())
}
