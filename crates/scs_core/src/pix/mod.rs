//! PIX container support.
//!
//! Every SCS intermediate format (PIM, PIT, PIC, PIP, PIS, PIA) shares the
//! same self-describing section tree. This module holds the generic model
//! and the text codec; format-specific decoding lives elsewhere.
//!
//! # Example
//!
//! ```ignore
//! use scs_core::pix::{parse_pix, write_pix};
//!
//! let container = parse_pix(r#"Header { FormatVersion: 1 }"#)?;
//! let text = write_pix(&container)?;
//! ```

mod format;
mod parser;
mod stream;
mod types;
mod writer;

pub use format::*;
pub use parser::*;
pub use stream::*;
pub use types::*;
pub use writer::*;
