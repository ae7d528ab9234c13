//! Query libraries.
//!
//! A library is an immutable, ordered set of named statements ("symbols"),
//! each annotated with when it is resolved ([`Kind`]) and how it is called
//! ([`Method`]). Libraries come from ILF text or from explicit
//! [`Annotations`]; both paths produce the same [`Library`].
//!
//! ## Core Types
//!
//! - [`Symbol`] — A named statement with its annotations
//! - [`Kind`] — Resolution timing: default, preload, const, proc
//! - [`Method`] — Execution method: default, rows, chunks, first, ...
//! - [`Annotations`] — Symbols declared in code
//! - [`Library`] — The immutable symbol table
//! - [`Source`] / [`Loader`] — Path, name, or annotated library sources
mod annotations;
mod library;
mod source;
mod symbol;

pub use annotations::*;
pub use library::*;
pub use source::*;
pub use symbol::*;
