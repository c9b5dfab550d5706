//! PIT records: header, global counts, looks and variants.
//!
//! These are the typed projection of a PIT container. Fields the file does
//! not provide (or provides with the wrong type) are `None`.

use glam::{Vec3, Vec4};
use indexmap::IndexMap;
use serde::Serialize;

use crate::pix::{PropertyValue, Scalar, SectionPath};

/// Contents of the `Header` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PitHeader {
    pub format_version: Option<i64>,
    pub source: Option<String>,
    /// The `Type` property
    pub file_type: Option<String>,
    pub name: Option<String>,
    pub source_filename: Option<String>,
    pub author: Option<String>,
}

/// Contents of the `Global` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PitGlobal {
    pub look_count: Option<i64>,
    pub variant_count: Option<i64>,
    pub part_count: Option<i64>,
    pub material_count: Option<i64>,
}

/// A material `Attribute`: format tag and raw value.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MaterialAttribute {
    pub format: Option<String>,
    pub value: Option<PropertyValue>,
}

impl MaterialAttribute {
    /// All numeric components of the value.
    fn components(&self) -> Option<Vec<f32>> {
        let value = self.value.as_ref()?;
        match value.as_array() {
            Some(items) => items.iter().map(Scalar::as_float).collect(),
            None => value.as_float().map(|v| vec![v]),
        }
    }

    /// Single float value (a bare number or a one-element tuple).
    pub fn as_float(&self) -> Option<f32> {
        match self.components()?.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Three-component value, e.g. a `FLOAT3` diffuse colour.
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self.components()?.as_slice() {
            [x, y, z] => Some(Vec3::new(*x, *y, *z)),
            _ => None,
        }
    }

    /// Four-component value.
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self.components()?.as_slice() {
            [x, y, z, w] => Some(Vec4::new(*x, *y, *z, *w)),
            _ => None,
        }
    }
}

/// Shader settings of one material inside a look.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MaterialSettings {
    /// Shader effect name, e.g. `eut2.dif.spec`
    pub effect: Option<String>,

    pub flags: Option<i64>,

    /// Declared `AttributeCount`
    pub attribute_count: Option<i64>,

    /// Declared `TextureCount`
    pub texture_count: Option<i64>,

    /// Attributes keyed by tag. On duplicate tags the last one wins.
    pub attributes: IndexMap<String, MaterialAttribute>,

    /// Texture paths keyed by tag. On duplicate tags the last one wins.
    pub textures: IndexMap<String, Option<String>>,

    /// Attributes that had no `Tag`, in file order
    pub unkeyed_attributes: Vec<MaterialAttribute>,

    /// Texture paths whose section had no `Tag`, in file order
    pub unkeyed_textures: Vec<Option<String>>,

    /// Location of the source `Material` section in the container
    pub section: SectionPath,
}

/// A named set of per-material shader settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LookRecord {
    pub name: Option<String>,

    /// Material settings keyed by material alias
    pub materials: IndexMap<String, MaterialSettings>,

    /// Materials that had no `Alias`, in file order
    pub unkeyed: Vec<MaterialSettings>,
}

impl MaterialSettings {
    /// Attributes parsed, with or without a tag.
    pub fn attribute_total(&self) -> usize {
        self.attributes.len() + self.unkeyed_attributes.len()
    }

    /// Textures parsed, with or without a tag.
    pub fn texture_total(&self) -> usize {
        self.textures.len() + self.unkeyed_textures.len()
    }
}

impl LookRecord {
    /// Materials parsed, with or without an alias.
    pub fn material_total(&self) -> usize {
        self.materials.len() + self.unkeyed.len()
    }
}

/// A `Part` attribute that is not the visibility flag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartAttribute {
    /// Part name token
    pub part: String,
    pub format: Option<String>,
    pub tag: Option<String>,
    pub value: Option<PropertyValue>,
}

/// A model configuration: which parts are shown.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VariantRecord {
    pub name: Option<String>,

    /// Tokens of the parts marked visible, in file order, without duplicates
    pub parts: Vec<String>,

    /// Tokens of every part listed in the variant, visible or not
    pub known_parts: Vec<String>,

    /// Other per-part attributes, kept as found
    pub attributes: Vec<PartAttribute>,
}

impl VariantRecord {
    pub fn is_part_visible(&self, part: &str) -> bool {
        self.parts.iter().any(|p| p == part)
    }
}

/// Everything decoded from one PIT container.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PitFile {
    pub header: Option<PitHeader>,
    pub global: Option<PitGlobal>,
    pub looks: Vec<LookRecord>,
    pub variants: Vec<VariantRecord>,
}

impl PitFile {
    /// Find a look by name.
    pub fn look(&self, name: &str) -> Option<&LookRecord> {
        self.looks.iter().find(|l| l.name.as_deref() == Some(name))
    }

    /// Find a variant by name.
    pub fn variant(&self, name: &str) -> Option<&VariantRecord> {
        self.variants.iter().find(|v| v.name.as_deref() == Some(name))
    }
}

/// How strictly a PIT container is validated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum DecodeMode {
    /// Tolerate missing sections; do not check `Global` counts.
    #[default]
    Lenient,

    /// Require `Header` and `Global`, and check `Global` counts against
    /// the decoded looks and variants.
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(value: PropertyValue) -> MaterialAttribute {
        MaterialAttribute {
            format: None,
            value: Some(value),
        }
    }

    #[test]
    fn test_attribute_vec3() {
        let diffuse = attribute(PropertyValue::Array(vec![
            Scalar::Float(1.0),
            Scalar::Float(0.5),
            Scalar::Int(0),
        ]));
        assert_eq!(diffuse.as_vec3(), Some(Vec3::new(1.0, 0.5, 0.0)));
        assert_eq!(diffuse.as_vec4(), None);
        assert_eq!(diffuse.as_float(), None);
    }

    #[test]
    fn test_attribute_float_forms() {
        assert_eq!(attribute(PropertyValue::Float(60.0)).as_float(), Some(60.0));
        assert_eq!(
            attribute(PropertyValue::Array(vec![Scalar::Float(0.25)])).as_float(),
            Some(0.25)
        );
        assert_eq!(attribute(PropertyValue::Str("x".into())).as_float(), None);
        assert_eq!(MaterialAttribute::default().as_float(), None);
    }

    #[test]
    fn test_attribute_with_string_component_is_not_numeric() {
        let mixed = attribute(PropertyValue::Array(vec![
            Scalar::Float(1.0),
            Scalar::Str("a".into()),
            Scalar::Float(1.0),
        ]));
        assert_eq!(mixed.as_vec3(), None);
    }
}
