//! Attaching query libraries to live connections.
//!
//! A [`Binding`] is one [`Library`](qlib_library::Library) on one
//! connection. Eager symbols (`preload`, `const`, `proc`) are resolved when
//! the binding is made; plain symbols are prepared the first time they are
//! used, exactly once, however many tasks race for them.
//!
//! A [`Category`] groups libraries under attribute names and attaches all of
//! them to a connection at once, producing a [`Session`].
//!
//! ## Core Types
//!
//! - [`Binding`] — Resolved accessors of one library on one connection
//! - [`Accessor`] — A constant value or a callable [`BoundSymbol`]
//! - [`Input`] / [`Output`] — What a call takes and returns, by method
//! - [`First`] — The result of a `first` call
//! - [`Category`] — Libraries keyed by attribute name
//! - [`Session`] — A connection with the bindings a category attached
mod binding;
mod bound;
mod category;
mod io;

pub use binding::*;
pub use bound::*;
pub use category::*;
pub use io::*;

#[cfg(test)]
mod fake;
