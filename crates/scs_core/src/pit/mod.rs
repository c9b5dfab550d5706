//! PIT (trait) file support: looks, materials and variants.
//!
//! A PIT file is a PIX container with four known top-level sections:
//!
//! - `Header`: format version and provenance
//! - `Global`: declared look/variant/part/material counts
//! - `Look`: named material settings, one nested `Material` per alias
//! - `Variant`: named part visibility sets, one nested `Part` per part
//!
//! Unknown top-level sections are skipped so newer files still load.

mod decoder;
mod types;

pub use decoder::*;
pub use types::*;
