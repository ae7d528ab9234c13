use super::*;
use indexmap::IndexMap;
use qlib_core::DefinitionError;
use qlib_ilf::Ilf;
use std::fmt::Display;
use std::fmt::Formatter;

/// Anything that yields a preface and validated symbols in declaration order.
pub trait Records {
    fn records(self) -> Result<(String, Vec<Symbol>), DefinitionError>;
}

impl Records for Ilf {
    fn records(self) -> Result<(String, Vec<Symbol>), DefinitionError> {
        let symbols = self
            .symbols
            .into_iter()
            .map(Symbol::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((self.preface, symbols))
    }
}

impl Records for &str {
    fn records(self) -> Result<(String, Vec<Symbol>), DefinitionError> {
        qlib_ilf::parse(self)?.records()
    }
}

/// An immutable, named collection of symbols.
///
/// Holds no connection state, so one library can be shared by every
/// binding on every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    name: String,
    preface: String,
    symbols: IndexMap<String, Symbol>,
}

impl Library {
    /// Builds a library from ILF text or explicit [`Annotations`].
    /// Nothing is returned unless every symbol validates.
    pub fn build(name: impl Into<String>, source: impl Records) -> Result<Self, DefinitionError> {
        let name = name.into();
        let (preface, records) = source.records()?;
        let mut symbols = IndexMap::with_capacity(records.len());
        for symbol in records {
            if symbols.contains_key(symbol.name()) {
                return Err(DefinitionError::Duplicate(symbol.name().to_string()));
            }
            symbols.insert(symbol.name().to_string(), symbol);
        }
        log::debug!("built library {} with {} symbols", name, symbols.len());
        Ok(Self {
            name,
            preface,
            symbols,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Free text before the first section. Empty for annotation-built libraries.
    pub fn preface(&self) -> &str {
        &self.preface
    }
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
    /// Symbols in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }
}

impl Display for Library {
    /// Renders ILF text that parses back into an equal library.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.preface)?;
        if !self.preface.is_empty() && !self.preface.ends_with('\n') {
            writeln!(f)?;
        }
        let mut symbols = self.symbols.values().peekable();
        while let Some(symbol) = symbols.next() {
            write!(f, "{}", symbol)?;
            if symbols.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
