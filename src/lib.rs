//! Named SQL statement libraries bound to PostgreSQL connections.
//!
//! This facade crate re-exports the querylib crates for convenient access
//! and adds [`open`], which connects and attaches a [`Category`] in one go.
//!
//! ## Crate Organization
//!
//! ### Definition
//! - [`core`] — Values, rows, errors, and constants
//! - [`ilf`] — The INI-style library format parser
//! - [`library`] — Symbols, annotations, libraries, and discovery
//!
//! ### Runtime
//! - [`pg`] — Connection contract and tokio-postgres adapter
//! - [`binding`] — Bindings, categories, and sessions
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! let users = querylib::library::load("users")?;
//! let category = querylib::Category::of([Arc::new(users)])?;
//! let session = querylib::open(&category).await?;
//! if let Some(users) = session.get("users") {
//!     let greeting = users.call("greet", querylib::Input::default()).await?;
//!     println!("{:?}", greeting);
//! }
//! # Ok(())
//! # }
//! ```

pub use qlib_core       as core;
pub use qlib_ilf        as ilf;
pub use qlib_library    as library;
pub use qlib_pg         as pg;
pub use qlib_binding    as binding;

// Re-export commonly used types at the root
pub use qlib_binding::*;
pub use qlib_core::*;
pub use qlib_library::Library;

use std::sync::Arc;
use tokio_postgres::Client;

/// Connects with `DB_URL` and attaches every library of `category`.
pub async fn open(category: &Category) -> anyhow::Result<Session<Arc<Client>>> {
    let client = qlib_pg::db().await.map_err(|e| anyhow::anyhow!(e))?;
    let session = category.apply(&client).await?;
    log::info!("session ready with {} libraries", session.len());
    Ok(session)
}
