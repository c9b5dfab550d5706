//! Data format tags used by the `Format` property of PIX sections.
//!
//! The format of a section decides how many scalars make up one data row
//! and what kind of scalar each one is. Data blocks are not self-describing,
//! so the codec needs the tag before it can split a block into rows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar kind carried by a data format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Float,
    Int,
    Str,
}

/// A `Format` tag from the PIX format family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFormat {
    Float,
    Float2,
    Float3,
    Float4,
    Float4x4,
    Int,
    Int2,
    Int3,
    Int4,
    UInt,
    Str,
}

impl DataFormat {
    /// All known format tags.
    pub const ALL: [DataFormat; 11] = [
        DataFormat::Float,
        DataFormat::Float2,
        DataFormat::Float3,
        DataFormat::Float4,
        DataFormat::Float4x4,
        DataFormat::Int,
        DataFormat::Int2,
        DataFormat::Int3,
        DataFormat::Int4,
        DataFormat::UInt,
        DataFormat::Str,
    ];

    /// Look up a format by its textual tag (e.g. `FLOAT3`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.tag() == tag)
    }

    /// The textual tag as written in files.
    pub fn tag(self) -> &'static str {
        match self {
            DataFormat::Float => "FLOAT",
            DataFormat::Float2 => "FLOAT2",
            DataFormat::Float3 => "FLOAT3",
            DataFormat::Float4 => "FLOAT4",
            DataFormat::Float4x4 => "FLOAT4x4",
            DataFormat::Int => "INT",
            DataFormat::Int2 => "INT2",
            DataFormat::Int3 => "INT3",
            DataFormat::Int4 => "INT4",
            DataFormat::UInt => "UINT",
            DataFormat::Str => "STRING",
        }
    }

    /// Number of scalars in one data row.
    pub fn arity(self) -> usize {
        match self {
            DataFormat::Float | DataFormat::Int | DataFormat::UInt | DataFormat::Str => 1,
            DataFormat::Float2 | DataFormat::Int2 => 2,
            DataFormat::Float3 | DataFormat::Int3 => 3,
            DataFormat::Float4 | DataFormat::Int4 => 4,
            DataFormat::Float4x4 => 16,
        }
    }

    /// Kind of every scalar in a row.
    pub fn kind(self) -> ScalarKind {
        match self {
            DataFormat::Float
            | DataFormat::Float2
            | DataFormat::Float3
            | DataFormat::Float4
            | DataFormat::Float4x4 => ScalarKind::Float,
            DataFormat::Int
            | DataFormat::Int2
            | DataFormat::Int3
            | DataFormat::Int4
            | DataFormat::UInt => ScalarKind::Int,
            DataFormat::Str => ScalarKind::Str,
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
