use futures::Stream;
use futures::StreamExt;
use futures::stream::BoxStream;
use qlib_core::InvocationError;
use qlib_core::Row;
use qlib_core::Value;
use qlib_pg::ChunkFeed;
use qlib_pg::Cursor;
use qlib_pg::Feed;
use qlib_pg::Outcome;

/// Rows of a `rows` call.
pub type RowStream = BoxStream<'static, Result<Row, InvocationError>>;
/// Batches of a `chunks` call.
pub type ChunkStream = BoxStream<'static, Result<Vec<Row>, InvocationError>>;
/// First-column values of a `column` call.
pub type ValueStream = BoxStream<'static, Result<Value, InvocationError>>;

/// Arguments of a call.
///
/// Query methods take parameters; `load_rows` takes a stream of parameter
/// rows and `load_chunks` a stream of batches.
pub enum Input {
    Params(Vec<Value>),
    Rows(Feed),
    Chunks(ChunkFeed),
}

impl Input {
    pub fn rows<S>(feed: S) -> Self
    where
        S: Stream<Item = Vec<Value>> + Send + 'static,
    {
        Self::Rows(feed.boxed())
    }
    pub fn chunks<S>(feed: S) -> Self
    where
        S: Stream<Item = Vec<Vec<Value>>> + Send + 'static,
    {
        Self::Chunks(feed.boxed())
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::Params(Vec::new())
    }
}

impl From<Vec<Value>> for Input {
    fn from(params: Vec<Value>) -> Self {
        Self::Params(params)
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Params(params) => f.debug_tuple("Params").field(params).finish(),
            Self::Rows(_) => f.write_str("Rows(..)"),
            Self::Chunks(_) => f.write_str("Chunks(..)"),
        }
    }
}

/// Result of a `first` call.
#[derive(Debug, Clone, PartialEq)]
pub enum First {
    /// The query returned no rows.
    Empty,
    /// Single-column result: the value of the first row.
    Value(Value),
    /// Multi-column result: the first row.
    Row(Row),
    /// Statement without rows: how many rows it affected.
    Count(u64),
}

/// Result of a call, shaped by the symbol's method.
pub enum Output {
    Result(Outcome),
    Rows(RowStream),
    Chunks(ChunkStream),
    Column(ValueStream),
    First(First),
    Cursor(Box<dyn Cursor>),
    Loaded,
}

impl Output {
    pub fn into_outcome(self) -> Option<Outcome> {
        match self {
            Self::Result(outcome) => Some(outcome),
            _ => None,
        }
    }
    pub fn into_rows(self) -> Option<RowStream> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }
    pub fn into_chunks(self) -> Option<ChunkStream> {
        match self {
            Self::Chunks(chunks) => Some(chunks),
            _ => None,
        }
    }
    pub fn into_column(self) -> Option<ValueStream> {
        match self {
            Self::Column(values) => Some(values),
            _ => None,
        }
    }
    pub fn into_first(self) -> Option<First> {
        match self {
            Self::First(first) => Some(first),
            _ => None,
        }
    }
    pub fn into_cursor(self) -> Option<Box<dyn Cursor>> {
        match self {
            Self::Cursor(cursor) => Some(cursor),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Result(outcome) => f.debug_tuple("Result").field(outcome).finish(),
            Self::Rows(_) => f.write_str("Rows(..)"),
            Self::Chunks(_) => f.write_str("Chunks(..)"),
            Self::Column(_) => f.write_str("Column(..)"),
            Self::First(first) => f.debug_tuple("First").field(first).finish(),
            Self::Cursor(cursor) => write!(f, "Cursor({})", cursor.name()),
            Self::Loaded => f.write_str("Loaded"),
        }
    }
}
