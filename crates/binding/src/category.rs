use crate::binding::Binding;
use indexmap::IndexMap;
use qlib_core::DefinitionError;
use qlib_core::ResolutionError;
use qlib_library::Library;
use qlib_pg::Connection;
use std::sync::Arc;

/// Libraries keyed by the attribute name they are attached under.
///
/// Holds no connection state; one category is applied to every new
/// connection. Attribute names are checked when the category is built, so
/// a collision never reaches a connection.
#[derive(Debug, Clone, Default)]
pub struct Category {
    entries: IndexMap<String, Arc<Library>>,
}

impl Category {
    /// Builds a category from (library, attribute) pairs. A missing
    /// attribute defaults to the library's own name.
    pub fn new<I>(pairs: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = (Arc<Library>, Option<String>)>,
    {
        let mut entries = IndexMap::new();
        for (library, attribute) in pairs {
            let attribute = attribute.unwrap_or_else(|| library.name().to_string());
            if entries.contains_key(&attribute) {
                return Err(DefinitionError::Attribute(attribute));
            }
            entries.insert(attribute, library);
        }
        Ok(Self { entries })
    }
    /// Every library under its own name.
    pub fn of<I>(libraries: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = Arc<Library>>,
    {
        Self::new(libraries.into_iter().map(|library| (library, None)))
    }
    pub fn get(&self, attribute: &str) -> Option<&Arc<Library>> {
        self.entries.get(attribute)
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds every library to `conn` in insertion order.
    ///
    /// All or nothing: if any library fails to bind, the bindings made so
    /// far are dropped and the error is returned.
    pub async fn apply<C: Connection>(&self, conn: &C) -> Result<Session<C>, ResolutionError> {
        let mut bindings = IndexMap::with_capacity(self.entries.len());
        for (attribute, library) in self.entries.iter() {
            let binding = Binding::bind(library.clone(), conn.clone()).await?;
            bindings.insert(attribute.clone(), Arc::new(binding));
        }
        log::info!("attached {} libraries", bindings.len());
        Ok(Session {
            conn: conn.clone(),
            bindings,
        })
    }
}

/// A connection together with the bindings a [`Category`] attached to it.
pub struct Session<C: Connection> {
    conn: C,
    bindings: IndexMap<String, Arc<Binding<C>>>,
}

impl<C: Connection> Session<C> {
    pub fn connection(&self) -> &C {
        &self.conn
    }
    pub fn get(&self, attribute: &str) -> Option<&Arc<Binding<C>>> {
        self.bindings.get(attribute)
    }
    /// Attribute names, in category order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Arc<Binding<C>>)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn len(&self) -> usize {
        self.bindings.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<C: Connection> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("attributes", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}
