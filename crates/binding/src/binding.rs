use crate::bound::BoundSymbol;
use crate::bound::Handle;
use crate::io::Input;
use crate::io::Output;
use indexmap::IndexMap;
use qlib_core::InvocationError;
use qlib_core::ResolutionError;
use qlib_library::Kind;
use qlib_library::Library;
use qlib_library::Method;
use qlib_library::Symbol;
use qlib_pg::Connection;
use qlib_pg::Outcome;
use qlib_pg::Shape;
use qlib_pg::Statement;
use std::sync::Arc;

/// What a name resolves to on a binding.
pub enum Accessor<'a, C: Connection> {
    /// The value a `const` symbol captured at bind time.
    Const(&'a Outcome),
    /// Anything callable.
    Symbol(BoundSymbol<'a, C>),
}

enum Entry<C: Connection> {
    Const(Outcome),
    Handle(Handle<C>),
}

/// One library attached to one connection.
///
/// Shares the library read-only and owns every statement handle prepared
/// for it. Safe to share between tasks; the only mutation is the one-time
/// preparation of each lazy symbol.
pub struct Binding<C: Connection> {
    library: Arc<Library>,
    conn: C,
    entries: IndexMap<String, Entry<C>>,
}

impl<C: Connection> Binding<C> {
    /// Resolves every eager symbol in declaration order and records a
    /// placeholder for the rest. The first failure aborts the bind.
    pub async fn bind(library: Arc<Library>, conn: C) -> Result<Self, ResolutionError> {
        let mut entries = IndexMap::with_capacity(library.len());
        for symbol in library.symbols() {
            let entry = Self::resolve(&library, &conn, symbol).await?;
            entries.insert(symbol.name().to_string(), entry);
        }
        let eager = library.symbols().filter(|s| s.kind().is_eager()).count();
        log::info!(
            "bound library {} ({} symbols, {} resolved eagerly)",
            library.name(),
            entries.len(),
            eager
        );
        Ok(Self {
            library,
            conn,
            entries,
        })
    }

    async fn resolve(library: &Library, conn: &C, symbol: &Symbol) -> Result<Entry<C>, ResolutionError> {
        let ref library = library.name().to_string();
        let ref name = symbol.name().to_string();
        match symbol.kind() {
            Kind::Default => Ok(Entry::Handle(Handle::lazy(symbol.body(), symbol.method()))),
            Kind::Preload => {
                log::debug!("{}.{}: preloading", library, name);
                let statement = conn.prepare(symbol.body()).await.map_err(|source| {
                    ResolutionError::Prepare {
                        library: library.clone(),
                        symbol: name.clone(),
                        source,
                    }
                })?;
                Ok(Entry::Handle(Handle::ready(symbol.body(), symbol.method(), statement)))
            }
            Kind::Proc => {
                let procedure = conn.procedure(symbol.body()).await.map_err(|source| {
                    ResolutionError::Procedure {
                        library: library.clone(),
                        symbol: name.clone(),
                        source,
                    }
                })?;
                let method = match procedure.shape {
                    Shape::Scalar => Method::First,
                    Shape::Set => Method::Rows,
                };
                log::debug!("{}.{}: procedure resolved with method {}", library, name, method);
                let statement = conn.prepare(&procedure.sql).await.map_err(|source| {
                    ResolutionError::Prepare {
                        library: library.clone(),
                        symbol: name.clone(),
                        source,
                    }
                })?;
                Ok(Entry::Handle(Handle::ready(&procedure.sql, method, statement)))
            }
            Kind::Const => {
                log::debug!("{}.{}: resolving constant", library, name);
                let statement = conn.prepare(symbol.body()).await.map_err(|source| {
                    ResolutionError::Prepare {
                        library: library.clone(),
                        symbol: name.clone(),
                        source,
                    }
                })?;
                let outcome = statement.execute(&[]).await.map_err(|source| {
                    ResolutionError::Constant {
                        library: library.clone(),
                        symbol: name.clone(),
                        source,
                    }
                })?;
                Ok(Entry::Const(outcome))
            }
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }
    pub fn connection(&self) -> &C {
        &self.conn
    }
    /// Declared symbol names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Accessor<'_, C>> {
        let (name, entry) = self.entries.get_key_value(name)?;
        match entry {
            Entry::Const(outcome) => Some(Accessor::Const(outcome)),
            Entry::Handle(handle) => Some(Accessor::Symbol(BoundSymbol::new(
                name,
                &self.conn,
                handle,
            ))),
        }
    }
    /// The callable symbol `name`.
    pub fn symbol(&self, name: &str) -> Result<BoundSymbol<'_, C>, InvocationError> {
        match self.get(name) {
            Some(Accessor::Symbol(symbol)) => Ok(symbol),
            Some(Accessor::Const(_)) => Err(InvocationError::Constant(name.to_string())),
            None => Err(InvocationError::Undefined(name.to_string())),
        }
    }
    /// The captured value of the `const` symbol `name`.
    pub fn constant(&self, name: &str) -> Option<&Outcome> {
        match self.entries.get(name)? {
            Entry::Const(outcome) => Some(outcome),
            Entry::Handle(_) => None,
        }
    }
    pub async fn call(&self, name: &str, input: impl Into<Input>) -> Result<Output, InvocationError> {
        self.symbol(name)?.call(input).await
    }
    /// Whether `name` holds a prepared statement or a captured constant.
    pub fn is_resolved(&self, name: &str) -> bool {
        match self.entries.get(name) {
            Some(Entry::Const(_)) => true,
            Some(Entry::Handle(handle)) => handle.is_prepared(),
            None => false,
        }
    }
}

impl<C: Connection> std::fmt::Debug for Binding<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("library", &self.library.name())
            .field("symbols", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
