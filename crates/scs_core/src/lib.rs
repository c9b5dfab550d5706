//! SCS Core - PIX container codec and PIT look/variant decoding.
//!
//! This crate provides:
//!
//! - **PIX containers**: the generic section tree shared by every SCS
//!   intermediate format, with a text decoder and encoder
//! - **PIT decoding**: looks (per-material shader settings) and variants
//!   (visible parts) with non-fatal diagnostics
//! - **Model import**: sibling discovery and sequential loading of a model's
//!   PIM, PIT, PIC, PIP, PIS and PIA files
//!
//! # Example
//!
//! ```ignore
//! use scs_core::loader::import_model;
//! use scs_core::settings::ImportSettings;
//!
//! let import = import_model("vehicle/truck/truck.pim", &ImportSettings::default());
//! println!("Loaded {} looks, {} variants",
//!     import.looks().len(),
//!     import.variants().len());
//! ```

pub mod diagnostics;
pub mod loader;
pub mod pit;
pub mod pix;
pub mod settings;
pub mod token;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use loader::{import_model, load_container, load_pit, LoadError, LoadStatus, ModelImport, PitLoad, PixKind};
pub use pit::{decode_pit, DecodeMode, LookRecord, MaterialSettings, VariantRecord};
pub use pix::{decode, encode, parse_pix, write_pix, Container, Section};
pub use settings::ImportSettings;
