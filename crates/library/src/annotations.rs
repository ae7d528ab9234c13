use super::*;
use qlib_core::DefinitionError;
use std::collections::HashSet;

/// Symbols declared in code rather than in an ILF file.
///
/// Statements are declared in order with [`Annotations::symbol`]; the
/// annotation sets then name which symbols are preloaded, constant, or use a
/// non-default method. Method sets must not overlap, and constants must not
/// appear in any of them.
///
/// ```
/// use qlib_library::*;
/// let lib = Library::build(
///     "users",
///     Annotations::default()
///         .symbol("by_id", "SELECT * FROM users WHERE id = $1")
///         .symbol("all", "SELECT * FROM users")
///         .symbol("kinds", "SELECT id, label FROM user_kinds")
///         .preload(["by_id"])
///         .rows(["all"])
///         .constant(["kinds"]),
/// )
/// .unwrap();
/// assert_eq!(lib.get("all").unwrap().method(), Method::Rows);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    symbols: Vec<(String, String)>,
    preload: HashSet<String>,
    constant: HashSet<String>,
    rows: HashSet<String>,
    chunks: HashSet<String>,
    first: HashSet<String>,
    declare: HashSet<String>,
    load_rows: HashSet<String>,
    load_chunks: HashSet<String>,
}

fn extend<I, S>(set: &mut HashSet<String>, names: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    set.extend(names.into_iter().map(Into::into));
}

impl Annotations {
    /// Declares a symbol and its statement text.
    pub fn symbol(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.symbols.push((name.into(), body.into()));
        self
    }
    pub fn preload<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.preload, names);
        self
    }
    pub fn constant<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.constant, names);
        self
    }
    pub fn rows<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.rows, names);
        self
    }
    pub fn chunks<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.chunks, names);
        self
    }
    pub fn first<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.first, names);
        self
    }
    pub fn declare<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.declare, names);
        self
    }
    pub fn load_rows<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.load_rows, names);
        self
    }
    pub fn load_chunks<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        extend(&mut self.load_chunks, names);
        self
    }

    fn kinds(&self) -> [(&'static str, &HashSet<String>, Kind); 2] {
        [
            ("preload", &self.preload, Kind::Preload),
            ("const", &self.constant, Kind::Const),
        ]
    }
    fn methods(&self) -> [(&'static str, &HashSet<String>, Method); 6] {
        [
            ("rows", &self.rows, Method::Rows),
            ("chunks", &self.chunks, Method::Chunks),
            ("first", &self.first, Method::First),
            ("declare", &self.declare, Method::Declare),
            ("load_rows", &self.load_rows, Method::LoadRows),
            ("load_chunks", &self.load_chunks, Method::LoadChunks),
        ]
    }

    /// Every set member must name a declared symbol.
    fn check_declared(&self) -> Result<(), DefinitionError> {
        let declared = self
            .symbols
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<HashSet<_>>();
        let kinds = self.kinds().map(|(set, names, _)| (set, names));
        let methods = self.methods().map(|(set, names, _)| (set, names));
        for (set, names) in kinds.into_iter().chain(methods) {
            let mut names = names.iter().collect::<Vec<_>>();
            names.sort();
            if let Some(missing) = names.into_iter().find(|n| !declared.contains(n.as_str())) {
                return Err(DefinitionError::Undeclared {
                    symbol: missing.clone(),
                    set,
                });
            }
        }
        Ok(())
    }

    /// Picks the single annotation of one axis that names `symbol`.
    fn pick<T: Copy + Default>(
        symbol: &str,
        axis: impl IntoIterator<Item = (&'static str, T, bool)>,
    ) -> Result<T, DefinitionError> {
        let hits = axis
            .into_iter()
            .filter(|(_, _, hit)| *hit)
            .collect::<Vec<_>>();
        match hits.as_slice() {
            [] => Ok(T::default()),
            [(_, value, _)] => Ok(*value),
            [(first, _, _), (second, _, _), ..] => Err(DefinitionError::Conflict {
                symbol: symbol.to_string(),
                first: *first,
                second: *second,
            }),
        }
    }
}

impl Records for Annotations {
    fn records(self) -> Result<(String, Vec<Symbol>), DefinitionError> {
        self.check_declared()?;
        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(self.symbols.len());
        for (name, body) in self.symbols.iter() {
            if !seen.insert(name.as_str()) {
                return Err(DefinitionError::Duplicate(name.clone()));
            }
            let kind = Self::pick(
                name,
                self.kinds()
                    .map(|(set, names, kind)| (set, kind, names.contains(name))),
            )?;
            let method = Self::pick(
                name,
                self.methods()
                    .map(|(set, names, method)| (set, method, names.contains(name))),
            )?;
            symbols.push(Symbol::new(name.as_str(), kind, method, body.as_str())?);
        }
        Ok((String::new(), symbols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn base() -> Annotations {
        Annotations::default()
            .symbol("a", "SELECT 1")
            .symbol("b", "SELECT 2")
            .symbol("c", "COPY t FROM STDIN")
    }
    #[test]
    fn unannotated_symbols_take_defaults() {
        let (preface, symbols) = base().records().unwrap();
        assert!(preface.is_empty());
        assert!(symbols
            .iter()
            .all(|s| s.kind() == Kind::Default && s.method() == Method::Default));
    }
    #[test]
    fn declaration_order_is_kept() {
        let (_, symbols) = base().records().unwrap();
        let names = symbols.iter().map(Symbol::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
    #[test]
    fn annotations_apply() {
        let (_, symbols) = base()
            .preload(["a"])
            .first(["a"])
            .constant(["b"])
            .load_rows(["c"])
            .records()
            .unwrap();
        assert_eq!((symbols[0].kind(), symbols[0].method()), (Kind::Preload, Method::First));
        assert_eq!((symbols[1].kind(), symbols[1].method()), (Kind::Const, Method::Default));
        assert_eq!((symbols[2].kind(), symbols[2].method()), (Kind::Default, Method::LoadRows));
    }
    #[test]
    fn overlapping_method_sets() {
        let err = base().rows(["a"]).chunks(["a"]).records().unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::Conflict {
                first: "rows",
                second: "chunks",
                ..
            }
        ));
    }
    #[test]
    fn const_with_method() {
        let err = base().constant(["b"]).first(["b"]).records().unwrap_err();
        assert!(matches!(err, DefinitionError::ConstMethod { .. }));
    }
    #[test]
    fn const_and_preload() {
        let err = base().constant(["b"]).preload(["b"]).records().unwrap_err();
        assert!(matches!(err, DefinitionError::Conflict { .. }));
    }
    #[test]
    fn undeclared_member() {
        let err = base().declare(["zzz"]).records().unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::Undeclared { set: "declare", .. }
        ));
    }
    #[test]
    fn duplicate_declaration() {
        let err = base().symbol("a", "SELECT 3").records().unwrap_err();
        assert!(matches!(err, DefinitionError::Duplicate(name) if name == "a"));
    }
}
