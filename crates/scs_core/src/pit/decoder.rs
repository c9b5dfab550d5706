//! PIT schema decoder.
//!
//! Walks a decoded container and projects it into [`PitFile`] records.
//! Every problem short of a missing required section in strict mode is a
//! warning in the [`Diagnostics`] collector; the decoder returns whatever it
//! could reconstruct.

use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::pix::{Container, PropertyValue, Section, SectionPath};
use crate::token::{is_valid_token, tokenize_name};

use super::types::*;

/// Fatal decode failures (strict mode only).
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Required section '{0}' is missing")]
    MissingSection(&'static str),
}

/// Top-level PIT section types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PitSection {
    Header,
    Global,
    Look,
    Variant,
}

impl PitSection {
    fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "Header" => Some(PitSection::Header),
            "Global" => Some(PitSection::Global),
            "Look" => Some(PitSection::Look),
            "Variant" => Some(PitSection::Variant),
            _ => None,
        }
    }
}

/// Properties with these keys are comment rows and carry no data.
fn is_comment_key(key: &str) -> bool {
    key.is_empty() || key == "#"
}

fn read_string(
    value: &PropertyValue,
    context: &str,
    key: &str,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            diagnostics.invalid_value(context, key);
            None
        }
    }
}

fn read_int(value: &PropertyValue, context: &str, key: &str, diagnostics: &mut Diagnostics) -> Option<i64> {
    match value.as_int() {
        Some(v) => Some(v),
        None => {
            diagnostics.invalid_value(context, key);
            None
        }
    }
}

/// Warn unless `actual` matches the declared count. An absent declaration
/// with nothing found is accepted.
fn check_count(context: &str, field: &str, declared: Option<i64>, actual: usize, diagnostics: &mut Diagnostics) {
    let matches = match declared {
        Some(declared) => declared == actual as i64,
        None => actual == 0,
    };
    if !matches {
        diagnostics.count_mismatch(context, field, declared, actual);
    }
}

/// Decode a PIT container.
pub fn decode_pit(
    container: &Container,
    mode: DecodeMode,
    diagnostics: &mut Diagnostics,
) -> Result<PitFile, DecodeError> {
    let mut pit = PitFile::default();

    for (index, section) in container.sections.iter().enumerate() {
        match PitSection::from_kind(&section.kind) {
            Some(PitSection::Header) => {
                let header = pit.header.get_or_insert_with(PitHeader::default);
                decode_header(section, header, diagnostics);
            }
            Some(PitSection::Global) => {
                let global = pit.global.get_or_insert_with(PitGlobal::default);
                decode_global(section, global, diagnostics);
            }
            Some(PitSection::Look) => {
                pit.looks.push(decode_look(section, SectionPath::root(index), diagnostics));
            }
            Some(PitSection::Variant) => {
                pit.variants.push(decode_variant(section, diagnostics));
            }
            None => log::debug!("Ignoring top-level section '{}'", section.kind),
        }
    }

    if mode == DecodeMode::Strict {
        validate_strict(container, &pit, diagnostics)?;
    }

    Ok(pit)
}

fn decode_header(section: &Section, header: &mut PitHeader, diagnostics: &mut Diagnostics) {
    const CONTEXT: &str = "Header";

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "FormatVersion" => header.format_version = read_int(value, CONTEXT, key, diagnostics),
            "Source" => header.source = read_string(value, CONTEXT, key, diagnostics),
            "Type" => header.file_type = read_string(value, CONTEXT, key, diagnostics),
            "Name" => header.name = read_string(value, CONTEXT, key, diagnostics),
            "SourceFilename" => header.source_filename = read_string(value, CONTEXT, key, diagnostics),
            "Author" => header.author = read_string(value, CONTEXT, key, diagnostics),
            _ => diagnostics.unknown_field(CONTEXT, key),
        }
    }
}

fn decode_global(section: &Section, global: &mut PitGlobal, diagnostics: &mut Diagnostics) {
    const CONTEXT: &str = "Global";

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "LookCount" => global.look_count = read_int(value, CONTEXT, key, diagnostics),
            "VariantCount" => global.variant_count = read_int(value, CONTEXT, key, diagnostics),
            "PartCount" => global.part_count = read_int(value, CONTEXT, key, diagnostics),
            "MaterialCount" => global.material_count = read_int(value, CONTEXT, key, diagnostics),
            _ => diagnostics.unknown_field(CONTEXT, key),
        }
    }
}

fn decode_look(section: &Section, path: SectionPath, diagnostics: &mut Diagnostics) -> LookRecord {
    let mut look = LookRecord::default();

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "Name" => look.name = read_string(value, "Look", key, diagnostics),
            _ => diagnostics.unknown_field("Look", key),
        }
    }

    for (index, child) in section.sections.iter().enumerate() {
        if child.kind != "Material" {
            log::debug!("Ignoring '{}' section inside Look", child.kind);
            continue;
        }

        match decode_material(child, path.child(index), diagnostics) {
            (Some(alias), settings) => {
                if look.materials.insert(alias.clone(), settings).is_some() {
                    log::debug!("Material alias '{}' repeated in look, keeping the last one", alias);
                }
            }
            (None, settings) => look.unkeyed.push(settings),
        }
    }

    look
}

fn decode_material(
    section: &Section,
    path: SectionPath,
    diagnostics: &mut Diagnostics,
) -> (Option<String>, MaterialSettings) {
    const CONTEXT: &str = "Look/Material";

    let mut alias = None;
    let mut settings = MaterialSettings {
        section: path,
        ..Default::default()
    };

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "Alias" => alias = read_string(value, CONTEXT, key, diagnostics),
            "Effect" => settings.effect = read_string(value, CONTEXT, key, diagnostics),
            "Flags" => settings.flags = read_int(value, CONTEXT, key, diagnostics),
            "AttributeCount" => settings.attribute_count = read_int(value, CONTEXT, key, diagnostics),
            "TextureCount" => settings.texture_count = read_int(value, CONTEXT, key, diagnostics),
            _ => diagnostics.unknown_field(CONTEXT, key),
        }
    }

    for child in &section.sections {
        match child.kind.as_str() {
            "Attribute" => match decode_material_attribute(child, diagnostics) {
                (Some(tag), attribute) => {
                    settings.attributes.insert(tag, attribute);
                }
                (None, attribute) => settings.unkeyed_attributes.push(attribute),
            },
            "Texture" => match decode_texture(child, diagnostics) {
                (Some(tag), texture) => {
                    settings.textures.insert(tag, texture);
                }
                (None, texture) => settings.unkeyed_textures.push(texture),
            },
            other => log::debug!("Ignoring '{}' section inside Material", other),
        }
    }

    check_count(
        CONTEXT,
        "AttributeCount",
        settings.attribute_count,
        settings.attribute_total(),
        diagnostics,
    );
    check_count(
        CONTEXT,
        "TextureCount",
        settings.texture_count,
        settings.texture_total(),
        diagnostics,
    );

    if alias.is_none() {
        diagnostics.missing_field(CONTEXT, "Alias");
    }
    (alias, settings)
}

fn decode_material_attribute(
    section: &Section,
    diagnostics: &mut Diagnostics,
) -> (Option<String>, MaterialAttribute) {
    const CONTEXT: &str = "Look/Material/Attribute";

    let mut tag = None;
    let mut attribute = MaterialAttribute::default();

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "Format" => attribute.format = read_string(value, CONTEXT, key, diagnostics),
            "Tag" => tag = read_string(value, CONTEXT, key, diagnostics),
            "Value" => attribute.value = Some(value.clone()),
            _ => diagnostics.unknown_field(CONTEXT, key),
        }
    }

    if tag.is_none() {
        diagnostics.missing_field(CONTEXT, "Tag");
    }
    (tag, attribute)
}

fn decode_texture(section: &Section, diagnostics: &mut Diagnostics) -> (Option<String>, Option<String>) {
    const CONTEXT: &str = "Look/Material/Texture";

    let mut tag = None;
    let mut texture = None;

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "Tag" => tag = read_string(value, CONTEXT, key, diagnostics),
            "Value" => texture = read_string(value, CONTEXT, key, diagnostics),
            _ => diagnostics.unknown_field(CONTEXT, key),
        }
    }

    if tag.is_none() {
        diagnostics.missing_field(CONTEXT, "Tag");
    }
    (tag, texture)
}

fn decode_variant(section: &Section, diagnostics: &mut Diagnostics) -> VariantRecord {
    let mut variant = VariantRecord::default();

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "Name" => variant.name = read_string(value, "Variant", key, diagnostics),
            _ => diagnostics.unknown_field("Variant", key),
        }
    }

    for child in &section.sections {
        if child.kind == "Part" {
            decode_part(child, &mut variant, diagnostics);
        } else {
            log::debug!("Ignoring '{}' section inside Variant", child.kind);
        }
    }

    variant
}

fn decode_part(section: &Section, variant: &mut VariantRecord, diagnostics: &mut Diagnostics) {
    const CONTEXT: &str = "Variant/Part";

    let mut name = None;
    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "Name" => name = read_string(value, CONTEXT, key, diagnostics),
            // Declared but not needed: attributes are read from the child sections.
            "AttributeCount" => {}
            _ => diagnostics.unknown_field(CONTEXT, key),
        }
    }

    let part = match name {
        Some(name) if is_valid_token(&name) => name,
        Some(name) => {
            let token = tokenize_name(&name);
            log::debug!("Part name '{}' stored as token '{}'", name, token);
            token
        }
        None => {
            diagnostics.missing_field(CONTEXT, "Name");
            return;
        }
    };

    if !variant.known_parts.contains(&part) {
        variant.known_parts.push(part.clone());
    }

    for child in section.sections_of("Attribute") {
        let attribute = decode_part_attribute(child, &part, diagnostics);

        let is_visibility = attribute.format.as_deref() == Some("INT")
            && attribute.tag.as_deref() == Some("visible");

        if !is_visibility {
            log::debug!(
                "Part '{}' attribute {:?} = {:?} kept as extra data",
                part,
                attribute.tag,
                attribute.value
            );
            variant.attributes.push(attribute);
            continue;
        }

        match attribute.value.as_ref().and_then(PropertyValue::first_int) {
            Some(1) => {
                if !variant.is_part_visible(&part) {
                    variant.parts.push(part.clone());
                }
            }
            Some(_) => {}
            None => diagnostics.invalid_value("Variant/Part/Attribute", "Value"),
        }
    }
}

fn decode_part_attribute(section: &Section, part: &str, diagnostics: &mut Diagnostics) -> PartAttribute {
    const CONTEXT: &str = "Variant/Part/Attribute";

    let mut attribute = PartAttribute {
        part: part.to_string(),
        format: None,
        tag: None,
        value: None,
    };

    for (key, value) in &section.props {
        match key.as_str() {
            k if is_comment_key(k) => {}
            "Format" => attribute.format = read_string(value, CONTEXT, key, diagnostics),
            "Tag" => attribute.tag = read_string(value, CONTEXT, key, diagnostics),
            "Value" => attribute.value = Some(value.clone()),
            _ => diagnostics.unknown_field(CONTEXT, key),
        }
    }

    attribute
}

/// Strict-mode checks: required sections and `Global` counts.
fn validate_strict(container: &Container, pit: &PitFile, diagnostics: &mut Diagnostics) -> Result<(), DecodeError> {
    if pit.header.is_none() {
        return Err(DecodeError::MissingSection("Header"));
    }
    let global = pit.global.as_ref().ok_or(DecodeError::MissingSection("Global"))?;

    check_strict_count("LookCount", global.look_count, pit.looks.len(), diagnostics);
    check_strict_count("VariantCount", global.variant_count, pit.variants.len(), diagnostics);

    for look in &pit.looks {
        check_strict_count("MaterialCount", global.material_count, look.material_total(), diagnostics);
    }

    for variant in container.sections_of("Variant") {
        let parts = variant.sections_of("Part").count();
        check_strict_count("PartCount", global.part_count, parts, diagnostics);
    }

    Ok(())
}

fn check_strict_count(field: &str, declared: Option<i64>, actual: usize, diagnostics: &mut Diagnostics) {
    if declared != Some(actual as i64) {
        diagnostics.count_mismatch("Global", field, declared, actual);
    }
}
