use std::path::PathBuf;

/// Any failure reported by the connection or its statements.
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Malformed library text.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("line {line}: malformed section marker {text:?}")]
    Marker { line: usize, text: String },
    #[error("line {line}: section marker {text:?} has no symbol name")]
    Unnamed { line: usize, text: String },
    #[error("line {line}: symbol {name:?} already declared on line {first}")]
    Duplicate {
        line: usize,
        first: usize,
        name: String,
    },
}

impl FormatError {
    /// 1-based line of the offending marker.
    pub fn line(&self) -> usize {
        match self {
            Self::Marker { line, .. } => *line,
            Self::Unnamed { line, .. } => *line,
            Self::Duplicate { line, .. } => *line,
        }
    }
}

/// A library or category that cannot be constructed as declared.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("symbol {0:?} declared more than once")]
    Duplicate(String),
    #[error("attribute {0:?} assigned to more than one library")]
    Attribute(String),
    #[error("symbol {symbol:?} has unknown type {word:?}")]
    UnknownType { symbol: String, word: String },
    #[error("symbol {symbol:?} has unknown method {word:?}")]
    UnknownMethod { symbol: String, word: String },
    #[error("proc symbol {symbol:?} cannot declare method {method:?}")]
    ProcMethod { symbol: String, method: String },
    #[error("const symbol {symbol:?} cannot declare method {method:?}")]
    ConstMethod { symbol: String, method: String },
    #[error("symbol {symbol:?} is annotated as both {first} and {second}")]
    Conflict {
        symbol: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("{set} annotation names undeclared symbol {symbol:?}")]
    Undeclared { symbol: String, set: &'static str },
}

/// A bind-time failure. Nothing from the failed bind remains usable.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("{library}.{symbol}: prepare failed")]
    Prepare {
        library: String,
        symbol: String,
        #[source]
        source: Cause,
    },
    #[error("{library}.{symbol}: constant resolution failed")]
    Constant {
        library: String,
        symbol: String,
        #[source]
        source: Cause,
    },
    #[error("{library}.{symbol}: procedure lookup failed")]
    Procedure {
        library: String,
        symbol: String,
        #[source]
        source: Cause,
    },
}

impl ResolutionError {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Prepare { symbol, .. } => symbol,
            Self::Constant { symbol, .. } => symbol,
            Self::Procedure { symbol, .. } => symbol,
        }
    }
}

/// A failed call of a bound symbol. The binding stays usable.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("no symbol named {0:?}")]
    Undefined(String),
    #[error("symbol {0:?} is a constant and cannot be called")]
    Constant(String),
    #[error("symbol {symbol:?} with method {method} cannot take this input")]
    Input { symbol: String, method: String },
    #[error("{symbol}: prepare failed")]
    Prepare {
        symbol: String,
        #[source]
        source: Cause,
    },
    #[error("{symbol}: execution failed")]
    Execute {
        symbol: String,
        #[source]
        source: Cause,
    },
}

/// Umbrella error for entry points that load, bind, and call in one go.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error("reading {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no library {name:?} on the search path {searched:?}")]
    NotFound { name: String, searched: Vec<PathBuf> },
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Self::Definition(DefinitionError::Format(e))
    }
}
