//! PIX text decoder.
//!
//! Single pass over the input with one token of lookahead. Section
//! boundaries are explicit braces, so no backtracking is needed.
//!
//! # Syntax
//!
//! ```text
//! # comment
//! SectionType {
//!     Key: 12            # integer
//!     Key: 0.5           # float (or &3f000000 as raw IEEE-754 bits)
//!     Key: "text"        # string
//!     Key: FLOAT3        # bare token
//!     Key: ( 1 2 3 )     # tuple
//!     data[2] {          # rows * arity values, arity from Format
//!         0.0 1.0 2.0
//!         3.0 4.0 5.0
//!     }
//!     ChildType { ... }
//! }
//! ```

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use super::format::{DataFormat, ScalarKind};
use super::types::{Container, PropertyValue, Scalar, Section};

/// Structural failures while decoding a container.
///
/// Any of these aborts the decode of the whole file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid UTF-8 in container: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Unbalanced '}}' at line {line}")]
    UnbalancedBrace { line: usize },

    #[error("Property '{key}' outside of any section at line {line}")]
    PropertyOutsideSection { line: usize, key: String },

    #[error("Unexpected {found} at line {line}, expected {expected}")]
    UnexpectedToken {
        line: usize,
        found: String,
        expected: &'static str,
    },

    #[error("Unexpected character '{ch}' at line {line}")]
    UnexpectedChar { line: usize, ch: char },

    #[error("Unterminated string starting at line {0}")]
    UnterminatedString(usize),

    #[error("Invalid number '{text}' at line {line}")]
    InvalidNumber { line: usize, text: String },

    #[error("Data block at line {line} in section '{section}' has no preceding Format")]
    MissingFormat { line: usize, section: String },

    #[error("Unknown data format '{tag}' at line {line}")]
    UnknownFormat { line: usize, tag: String },

    #[error("Data block at line {line}: expected {expected} values ({rows} rows of {format}), found {found}")]
    DataCount {
        line: usize,
        rows: usize,
        format: DataFormat,
        expected: usize,
        found: usize,
    },

    #[error("Data block at line {line}: {rows} rows of {format} is too large")]
    DataTooLarge {
        line: usize,
        rows: usize,
        format: DataFormat,
    },

    #[error("Data block at line {line}: {found} does not fit format {format}")]
    DataKind {
        line: usize,
        format: DataFormat,
        found: String,
    },

    #[error("Unexpected end of input inside section '{section}' opened at line {line}")]
    UnclosedSection { section: String, line: usize },

    #[error("Unexpected end of input at line {0}")]
    UnexpectedEof(usize),
}

/// Result type for decoding operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f32),
    Colon,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Int(v) => write!(f, "integer {}", v),
            Token::Float(v) => write!(f, "float {}", v),
            Token::Colon => f.write_str("':'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
        }
    }
}

/// Character-level scanner producing line-tagged tokens.
struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            line: 1,
        }
    }

    /// Current line, used for end-of-input errors.
    fn line(&self) -> usize {
        self.line
    }

    fn next(&mut self) -> ParseResult<Option<(usize, Token)>> {
        self.skip_trivia();

        let (start, c) = match self.chars.next() {
            Some(x) => x,
            None => return Ok(None),
        };
        let line = self.line;

        let token = match c {
            ':' => Token::Colon,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '"' => Token::Str(self.scan_string(line)?),
            '&' => {
                let end = self.take_while(start + 1, |c| c.is_ascii_alphanumeric());
                let text = &self.src[start + 1..end];
                let bits = u32::from_str_radix(text, 16).map_err(|_| ParseError::InvalidNumber {
                    line,
                    text: format!("&{}", text),
                })?;
                Token::Float(f32::from_bits(bits))
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let end = self.take_while(start + c.len_utf8(), |c| {
                    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '+'
                });
                parse_number(&self.src[start..end], line)?
            }
            c if is_ident_start(c) => {
                let end = self.take_while(start + 1, is_ident_char);
                Token::Ident(self.src[start..end].to_string())
            }
            other => return Err(ParseError::UnexpectedChar { line, ch: other }),
        };

        Ok(Some((line, token)))
    }

    /// Skip whitespace and `#` comments, counting lines.
    fn skip_trivia(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                self.line += 1;
                self.chars.next();
            } else if c.is_whitespace() {
                self.chars.next();
            } else if c == '#' {
                while let Some(&(_, c)) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            } else {
                break;
            }
        }
    }

    /// Consume characters matching `pred`; returns the end byte offset.
    fn take_while(&mut self, mut end: usize, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                return i;
            }
            self.chars.next();
            end = i + c.len_utf8();
        }
        end
    }

    fn scan_string(&mut self, line: usize) -> ParseResult<String> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => return Ok(out),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, c)) if c != '\n' => out.push(c),
                    _ => return Err(ParseError::UnterminatedString(line)),
                },
                Some((_, '\n')) | None => return Err(ParseError::UnterminatedString(line)),
                Some((_, c)) => out.push(c),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `text` lexes as a single bare identifier.
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

fn parse_number(text: &str, line: usize) -> ParseResult<Token> {
    let invalid = || ParseError::InvalidNumber {
        line,
        text: text.to_string(),
    };

    let is_float = text.contains(['.', 'e', 'E']) || text.ends_with("inf") || text.ends_with("nan");
    if is_float {
        text.parse::<f32>().map(Token::Float).map_err(|_| invalid())
    } else {
        text.parse::<i64>().map(Token::Int).map_err(|_| invalid())
    }
}

/// PIX container decoder.
pub struct PixParser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> PixParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lexer: Lexer::new(content),
        }
    }

    /// Decode the whole input into a container.
    pub fn parse(&mut self) -> ParseResult<Container> {
        let mut container = Container::default();

        while let Some((line, token)) = self.lexer.next()? {
            match token {
                Token::Ident(kind) => match self.lexer.next()? {
                    Some((_, Token::LBrace)) => {
                        let section = self.parse_section_body(kind, line)?;
                        container.push_section(section);
                    }
                    Some((line, Token::Colon)) => {
                        return Err(ParseError::PropertyOutsideSection { line, key: kind });
                    }
                    Some((line, other)) => return Err(unexpected(line, &other, "'{'")),
                    None => return Err(ParseError::UnexpectedEof(self.lexer.line())),
                },
                Token::RBrace => return Err(ParseError::UnbalancedBrace { line }),
                other => return Err(unexpected(line, &other, "section type")),
            }
        }

        Ok(container)
    }

    /// Parse everything up to and including the `}` closing a section.
    fn parse_section_body(&mut self, kind: String, start_line: usize) -> ParseResult<Section> {
        let mut section = Section::new(kind);

        loop {
            let (line, token) = match self.lexer.next()? {
                Some(x) => x,
                None => {
                    return Err(ParseError::UnclosedSection {
                        section: section.kind,
                        line: start_line,
                    })
                }
            };

            let name = match token {
                Token::RBrace => return Ok(section),
                Token::Ident(name) => name,
                other => return Err(unexpected(line, &other, "property, data block or section")),
            };

            match self.lexer.next()? {
                Some((_, Token::Colon)) => {
                    let value = self.parse_value()?;
                    section.push_prop(name, value);
                }
                Some((_, Token::LBrace)) => {
                    let child = self.parse_section_body(name, line)?;
                    section.push_section(child);
                }
                Some((_, Token::LBracket)) if name == "data" => {
                    self.parse_data_block(&mut section, line)?;
                }
                Some((line, other)) => return Err(unexpected(line, &other, "':' or '{'")),
                None => {
                    return Err(ParseError::UnclosedSection {
                        section: section.kind,
                        line: start_line,
                    })
                }
            }
        }
    }

    /// Parse a property value following `Key:`.
    fn parse_value(&mut self) -> ParseResult<PropertyValue> {
        let (line, token) = self
            .lexer
            .next()?
            .ok_or_else(|| ParseError::UnexpectedEof(self.lexer.line()))?;

        let value = match token {
            Token::Int(v) => PropertyValue::Int(v),
            Token::Float(v) => PropertyValue::Float(v),
            Token::Str(s) => PropertyValue::Str(s),
            Token::Ident(s) => match s.as_str() {
                "true" => PropertyValue::Bool(true),
                "false" => PropertyValue::Bool(false),
                _ => PropertyValue::Token(s),
            },
            Token::LParen => PropertyValue::Array(self.parse_tuple()?),
            other => return Err(unexpected(line, &other, "property value")),
        };

        Ok(value)
    }

    /// Parse tuple items after `(` up to the matching `)`.
    fn parse_tuple(&mut self) -> ParseResult<Vec<Scalar>> {
        let mut items = Vec::new();
        loop {
            let (line, token) = self
                .lexer
                .next()?
                .ok_or_else(|| ParseError::UnexpectedEof(self.lexer.line()))?;
            match token {
                Token::RParen => return Ok(items),
                Token::Int(v) => items.push(Scalar::Int(v)),
                Token::Float(v) => items.push(Scalar::Float(v)),
                Token::Str(s) | Token::Ident(s) => items.push(Scalar::Str(s)),
                other => return Err(unexpected(line, &other, "tuple item or ')'")),
            }
        }
    }

    /// Parse `N] { ... }` after `data[`, splitting values into rows by the
    /// section's declared format.
    fn parse_data_block(&mut self, section: &mut Section, line: usize) -> ParseResult<()> {
        let rows = match self.lexer.next()? {
            Some((_, Token::Int(n))) if n >= 0 => n as usize,
            Some((line, other)) => return Err(unexpected(line, &other, "row count")),
            None => return Err(ParseError::UnexpectedEof(self.lexer.line())),
        };
        self.expect(Token::RBracket, "']'")?;
        self.expect(Token::LBrace, "'{'")?;

        let format = declared_format(section, line)?;
        let expected = rows
            .checked_mul(format.arity())
            .ok_or(ParseError::DataTooLarge { line, rows, format })?;

        // Sized by the input, not by the declared count.
        let mut values = Vec::new();
        loop {
            let (value_line, token) = self.lexer.next()?.ok_or_else(|| ParseError::UnclosedSection {
                section: section.kind.clone(),
                line,
            })?;
            let scalar = match token {
                Token::RBrace => break,
                Token::Int(v) => Scalar::Int(v),
                Token::Float(v) => Scalar::Float(v),
                Token::Str(s) => Scalar::Str(s),
                other => return Err(unexpected(value_line, &other, "data value or '}'")),
            };
            values.push(coerce(scalar, format, value_line)?);
        }

        if values.len() != expected {
            return Err(ParseError::DataCount {
                line,
                rows,
                format,
                expected,
                found: values.len(),
            });
        }

        let mut values = values.into_iter();
        for _ in 0..rows {
            section.push_row(values.by_ref().take(format.arity()).collect());
        }

        Ok(())
    }

    fn expect(&mut self, want: Token, expected: &'static str) -> ParseResult<()> {
        match self.lexer.next()? {
            Some((_, token)) if token == want => Ok(()),
            Some((line, other)) => Err(unexpected(line, &other, expected)),
            None => Err(ParseError::UnexpectedEof(self.lexer.line())),
        }
    }
}

fn unexpected(line: usize, found: &Token, expected: &'static str) -> ParseError {
    ParseError::UnexpectedToken {
        line,
        found: found.to_string(),
        expected,
    }
}

/// Format declared by a section before its data block.
fn declared_format(section: &Section, line: usize) -> ParseResult<DataFormat> {
    let tag = section
        .get_prop_value("Format")
        .and_then(PropertyValue::as_str)
        .ok_or_else(|| ParseError::MissingFormat {
            line,
            section: section.kind.clone(),
        })?;

    DataFormat::from_tag(tag).ok_or_else(|| ParseError::UnknownFormat {
        line,
        tag: tag.to_string(),
    })
}

/// Convert a scanned scalar to the kind the format requires.
fn coerce(scalar: Scalar, format: DataFormat, line: usize) -> ParseResult<Scalar> {
    match (format.kind(), scalar) {
        (ScalarKind::Float, Scalar::Int(v)) => Ok(Scalar::Float(v as f32)),
        (ScalarKind::Float, s @ Scalar::Float(_)) => Ok(s),
        (ScalarKind::Int, s @ Scalar::Int(_)) => Ok(s),
        (ScalarKind::Str, s @ Scalar::Str(_)) => Ok(s),
        (_, other) => Err(ParseError::DataKind {
            line,
            format,
            found: format!("{:?}", other),
        }),
    }
}

/// Decode a PIX container from text.
pub fn parse_pix(content: &str) -> ParseResult<Container> {
    let mut parser = PixParser::new(content);
    parser.parse()
}

/// Decode a PIX container from raw file bytes.
pub fn decode(bytes: &[u8]) -> ParseResult<Container> {
    let content = std::str::from_utf8(bytes)?;
    parse_pix(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_sections() {
        let pix = r#"
# exported by hand
Header {
    FormatVersion: 1
    Source: "scs_tools"
}
Look {
    Name: "default"
    Material {
        Alias: "m1"
        Effect: "eut2.dif"
    }
}
"#;

        let container = parse_pix(pix).unwrap();
        assert_eq!(container.len(), 2);
        assert_eq!(container.sections[0].kind, "Header");
        assert_eq!(
            container.sections[0].get_prop_value("FormatVersion"),
            Some(&PropertyValue::Int(1))
        );

        let look = &container.sections[1];
        let material = look.get_section("Material").unwrap();
        assert_eq!(
            material.get_prop_value("Effect").and_then(PropertyValue::as_str),
            Some("eut2.dif")
        );
    }

    #[test]
    fn test_parse_single_line_section() {
        let pix = r#"Look { Name: "default" Material { Alias: "m1" Effect: "eut2.dif" AttributeCount: 0 TextureCount: 0 } }"#;

        let container = parse_pix(pix).unwrap();
        let material = container.sections[0].get_section("Material").unwrap();
        assert_eq!(material.props.len(), 4);
        assert_eq!(material.get_prop_value("TextureCount"), Some(&PropertyValue::Int(0)));
    }

    #[test]
    fn test_parse_value_kinds() {
        let pix = r#"
Attribute {
    Format: FLOAT3
    Tag: "diffuse"
    Value: ( 1.0 0.5 &3f800000 )
    Enabled: true
    Count: -3
    Scale: 2.5e1
}
"#;

        let container = parse_pix(pix).unwrap();
        let section = &container.sections[0];
        assert_eq!(
            section.get_prop_value("Format"),
            Some(&PropertyValue::Token("FLOAT3".into()))
        );
        assert_eq!(
            section.get_prop_value("Value"),
            Some(&PropertyValue::Array(vec![
                Scalar::Float(1.0),
                Scalar::Float(0.5),
                Scalar::Float(1.0),
            ]))
        );
        assert_eq!(section.get_prop_value("Enabled"), Some(&PropertyValue::Bool(true)));
        assert_eq!(section.get_prop_value("Count"), Some(&PropertyValue::Int(-3)));
        assert_eq!(section.get_prop_value("Scale"), Some(&PropertyValue::Float(25.0)));
    }

    #[test]
    fn test_parse_data_rows_by_format() {
        let pix = r#"
Stream {
    Format: FLOAT2
    Tag: "_UV0"
    data[3] {
        0 0
        1.0 0.0
        1 1
    }
}
"#;

        let container = parse_pix(pix).unwrap();
        let stream = &container.sections[0];
        assert_eq!(stream.data.len(), 3);
        assert_eq!(stream.data[1], vec![Scalar::Float(1.0), Scalar::Float(0.0)]);
        // integers widen to float under a FLOAT format
        assert_eq!(stream.data[2], vec![Scalar::Float(1.0), Scalar::Float(1.0)]);
    }

    #[test]
    fn test_data_rows_ignore_line_layout() {
        let pix = "Faces { Format: INT3 data[2] { 0 1 2 2 3 0 } }";

        let container = parse_pix(pix).unwrap();
        let faces = &container.sections[0];
        assert_eq!(faces.data, vec![
            vec![Scalar::Int(0), Scalar::Int(1), Scalar::Int(2)],
            vec![Scalar::Int(2), Scalar::Int(3), Scalar::Int(0)],
        ]);
    }

    #[test]
    fn test_data_without_format_fails() {
        let pix = "Stream {\n    data[1] {\n        1 2 3\n    }\n}\n";
        let err = parse_pix(pix).unwrap_err();
        assert!(matches!(err, ParseError::MissingFormat { line: 2, .. }));
    }

    #[test]
    fn test_data_with_unknown_format_fails() {
        let pix = "Stream { Format: FLOAT7 data[1] { 1 } }";
        assert!(matches!(parse_pix(pix), Err(ParseError::UnknownFormat { .. })));
    }

    #[test]
    fn test_data_count_mismatch_fails() {
        let pix = "Stream { Format: FLOAT3 data[2] { 1 2 3 4 5 } }";
        let err = parse_pix(pix).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DataCount { expected: 6, found: 5, .. }
        ));
    }

    #[test]
    fn test_identifier_rule() {
        assert!(is_identifier("FLOAT3"));
        assert!(is_identifier("_POSITION"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("3d"));
        assert!(!is_identifier("two words"));
        assert!(!is_identifier("#x"));
    }

    #[test]
    fn test_data_row_count_overflow_fails() {
        let pix = "S { Format: FLOAT4x4 data[9223372036854775807] { } }";
        let err = parse_pix(pix).unwrap_err();
        assert!(matches!(err, ParseError::DataTooLarge { line: 1, .. }));
    }

    #[test]
    fn test_huge_row_count_with_little_data_fails() {
        let pix = "S { Format: FLOAT data[100000000000000] { 1.0 } }";
        let err = parse_pix(pix).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DataCount {
                rows: 100000000000000,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_data_kind_mismatch_fails() {
        let pix = "Faces { Format: INT data[1] { 1.5 } }";
        assert!(matches!(parse_pix(pix), Err(ParseError::DataKind { .. })));
    }

    #[test]
    fn test_unbalanced_brace_fails() {
        let pix = "Header {\n  Name: \"x\"\n}\n}\n";
        let err = parse_pix(pix).unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedBrace { line: 4 }));
    }

    #[test]
    fn test_property_outside_section_fails() {
        let pix = "Name: \"orphan\"\n";
        assert!(matches!(
            parse_pix(pix),
            Err(ParseError::PropertyOutsideSection { line: 1, .. })
        ));
    }

    #[test]
    fn test_eof_inside_section_fails() {
        let pix = "Look {\n    Name: \"default\"\n    Material {\n";
        let err = parse_pix(pix).unwrap_err();
        match err {
            ParseError::UnclosedSection { section, line } => {
                assert_eq!(section, "Material");
                assert_eq!(line, 3);
            }
            other => panic!("Expected UnclosedSection, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string_fails() {
        let pix = "Header { Name: \"oops\n}";
        assert!(matches!(parse_pix(pix), Err(ParseError::UnterminatedString(1))));
    }

    #[test]
    fn test_string_escapes_and_comments() {
        let pix = "Header { Name: \"a \\\"b\\\" # not a comment\" # comment\n}";
        let container = parse_pix(pix).unwrap();
        assert_eq!(
            container.sections[0].get_prop_value("Name").and_then(PropertyValue::as_str),
            Some("a \"b\" # not a comment")
        );
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let bytes = b"Header { Name: \"\xff\" }";
        assert!(matches!(decode(bytes), Err(ParseError::InvalidUtf8(_))));
    }

    #[test]
    fn test_empty_input_is_empty_container() {
        let container = parse_pix("  # nothing here\n").unwrap();
        assert!(container.is_empty());
    }
}
