use qlib_core::DefinitionError;
use qlib_ilf::RawSymbol;
use std::fmt::Display;
use std::fmt::Formatter;

/// When a symbol is resolved, and what its body means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    /// Prepared on first use and kept for reuse.
    #[default]
    Default,
    /// Prepared when the library is bound.
    Preload,
    /// Executed once at bind time; the result is the symbol's value.
    Const,
    /// The body names a stored procedure; the method follows its signature.
    Proc,
}

impl Kind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Preload => "preload",
            Self::Const => "const",
            Self::Proc => "proc",
        }
    }
    /// Reads a marker word. The empty word is the default kind.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "" => Some(Self::Default),
            "preload" => Some(Self::Preload),
            "const" => Some(Self::Const),
            "proc" => Some(Self::Proc),
            _ => None,
        }
    }
    /// Whether binding resolves this symbol up front.
    pub const fn is_eager(&self) -> bool {
        !matches!(self, Self::Default)
    }
}

/// What calling a bound symbol does and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// The whole result, or (tag, count) for statements without rows.
    #[default]
    Default,
    /// A stream of rows.
    Rows,
    /// A stream of row batches.
    Chunks,
    /// The single value, the first row, or the affected count.
    First,
    /// A stream of first-column values.
    Column,
    /// A scrollable server-side cursor.
    Declare,
    /// Feeds parameter rows (or COPY rows) into the statement.
    LoadRows,
    /// Feeds batches of parameter rows (or COPY rows) into the statement.
    LoadChunks,
}

impl Method {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Rows => "rows",
            Self::Chunks => "chunks",
            Self::First => "first",
            Self::Column => "column",
            Self::Declare => "declare",
            Self::LoadRows => "load_rows",
            Self::LoadChunks => "load_chunks",
        }
    }
    /// Reads a marker word. The empty word is the default method.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "" => Some(Self::Default),
            "rows" => Some(Self::Rows),
            "chunks" => Some(Self::Chunks),
            "first" => Some(Self::First),
            "column" => Some(Self::Column),
            "declare" => Some(Self::Declare),
            "load_rows" => Some(Self::LoadRows),
            "load_chunks" => Some(Self::LoadChunks),
            _ => None,
        }
    }
    /// Load methods consume input; every other method runs a query.
    pub const fn is_query(&self) -> bool {
        !matches!(self, Self::LoadRows | Self::LoadChunks)
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            k => write!(f, "{}", k.as_str()),
        }
    }
}
impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            m => write!(f, "{}", m.as_str()),
        }
    }
}

/// A named statement (or procedure reference) with its annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    kind: Kind,
    method: Method,
    body: String,
}

impl Symbol {
    /// Builds a symbol, rejecting annotation combinations that make no sense:
    /// constants take no method, and procedures get theirs from the catalog.
    pub fn new(
        name: impl Into<String>,
        kind: Kind,
        method: Method,
        body: impl Into<String>,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        match (kind, method) {
            (_, Method::Default) => {}
            (Kind::Const, m) => {
                return Err(DefinitionError::ConstMethod {
                    symbol: name,
                    method: m.to_string(),
                });
            }
            (Kind::Proc, m) => {
                return Err(DefinitionError::ProcMethod {
                    symbol: name,
                    method: m.to_string(),
                });
            }
            _ => {}
        }
        Ok(Self {
            name,
            kind,
            method,
            body: body.into(),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> Kind {
        self.kind
    }
    /// The declared method. Procedures report `Default` here; their
    /// effective method is only known once bound.
    pub fn method(&self) -> Method {
        self.method
    }
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl TryFrom<RawSymbol> for Symbol {
    type Error = DefinitionError;
    fn try_from(raw: RawSymbol) -> Result<Self, Self::Error> {
        let kind = Kind::parse(&raw.kind).ok_or_else(|| DefinitionError::UnknownType {
            symbol: raw.name.clone(),
            word: raw.kind.clone(),
        })?;
        let method = Method::parse(&raw.method).ok_or_else(|| DefinitionError::UnknownMethod {
            symbol: raw.name.clone(),
            word: raw.method.clone(),
        })?;
        Self::new(raw.name, kind, method, raw.body)
    }
}

impl Display for Symbol {
    /// Renders the symbol as an ILF section.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.kind, self.method) {
            (Kind::Default, Method::Default) => writeln!(f, "[{}]", self.name)?,
            (k, Method::Default) => writeln!(f, "[{}:{}]", self.name, k.as_str())?,
            (k, m) => writeln!(f, "[{}:{}:{}]", self.name, k.as_str(), m.as_str())?,
        }
        writeln!(f, "{}", self.body)
    }
}
