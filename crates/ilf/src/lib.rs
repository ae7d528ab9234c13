//! INI-style Library Format.
//!
//! An ILF document is free-form preface text followed by sections. Each
//! section opens with a marker line and owns every line up to the next
//! marker:
//!
//! ```text
//! Users and their sessions.
//!
//! [get_user]
//! SELECT * FROM users WHERE id = $1
//!
//! [user_types:const]
//! SELECT id, label FROM user_types
//!
//! [all_users::rows]
//! SELECT * FROM users
//! ```
//!
//! ## Core Types
//!
//! - [`parse()`] — Splits text into a preface and raw sections
//! - [`Ilf`] — The parsed document
//! - [`RawSymbol`] — One section, annotations still unvalidated
mod marker;
mod parse;

pub use marker::*;
pub use parse::*;
