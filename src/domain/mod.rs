//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifier value objects, errors)
//! - `sanitizer` - Pure text transform stripping provider citation markup
pub mod foundation;
pub mod sanitizer;
