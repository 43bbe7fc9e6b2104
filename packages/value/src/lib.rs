//! Interpreter value layer.
//!
//! The blocking primitives in `anyready-core` name their resources with
//! plain strings, but the interpreter hands them whatever the script passed:
//! numbers, strings, or whole associative arrays. This crate holds the pieces
//! needed to turn those values into handles:
//!
//! - `Value`: a scalar as the interpreter sees it
//! - `Table`: an ordered, string-keyed associative array
//! - `NumberFormat`: a printf-style numeric conversion (the CONVFMT setting)
//! - `RuntimeVars`: live runtime variables (CONVFMT and OFS)
//!
//! # Example
//!
//! ```rust
//! use anyready_value::{NumberFormat, Value};
//!
//! let fmt = NumberFormat::parse("%.2f").unwrap();
//! assert_eq!(Value::Number(0.126).to_awk_string(&fmt), "0.13");
//! assert_eq!(Value::Number(3.0).to_awk_string(&fmt), "3");
//! ```

mod error;
mod format;
mod table;
mod tokenizer;
mod value;
mod vars;

pub use error::{FormatError, SettingsError};
pub use format::NumberFormat;
pub use table::{Iter as TableIter, Table};
pub use tokenizer::CharTokens;
pub use value::Value;
pub use vars::{RuntimeSettings, RuntimeVars, VariableManager};
