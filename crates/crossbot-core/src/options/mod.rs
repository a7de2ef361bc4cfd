//! Option schemas and the per-dispatch options handler.
//!
//! A component declares an ordered list of [`OptionSchema`] entries. At
//! dispatch time the raw options carried by the interaction are wrapped in an
//! [`OptionsHandler`] together with that schema, which then offers typed
//! getters, strict access via [`OptionsHandler::require`], and bulk validation
//! via [`OptionsHandler::validate`].

pub mod handler;
pub mod schema;

pub use handler::{OptionValue, OptionsHandler, coerce};
pub use schema::{OptionChoice, OptionSchema, OptionType, find_duplicate_name};
