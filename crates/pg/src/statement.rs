use super::*;
use futures::StreamExt;
use futures::stream::BoxStream;
use qlib_core::CHUNK_SIZE;
use qlib_core::Row;
use qlib_core::Value;

/// Single-pass stream of rows. Dropping it releases the server-side result.
pub type Rows = BoxStream<'static, Result<Row, Cause>>;
/// Single-pass stream of row batches.
pub type Chunks = BoxStream<'static, Result<Vec<Row>, Cause>>;
/// Input rows for `load_rows`: parameter tuples, or COPY data rows.
pub type Feed = BoxStream<'static, Vec<Value>>;
/// Input batches for `load_chunks`.
pub type ChunkFeed = BoxStream<'static, Vec<Vec<Value>>>;

/// A fully buffered execution result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every row the statement produced.
    Rows(Vec<Row>),
    /// Statements without a result: the command and how many rows it touched.
    Command { tag: String, count: u64 },
}

impl Outcome {
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Command { .. } => None,
        }
    }
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Command { .. } => None,
        }
    }
    /// Affected rows for commands; the row count for queries.
    pub fn count(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Command { count, .. } => *count,
        }
    }
}

/// One prepared statement on one connection.
#[async_trait::async_trait]
pub trait Statement: Send + Sync + 'static {
    /// The text the statement was prepared from.
    fn sql(&self) -> &str;
    /// Result column names. Empty for statements that return no rows.
    fn columns(&self) -> &[String];
    /// Parameter type names, in placeholder order.
    fn params(&self) -> &[String];
    async fn execute(&self, params: &[Value]) -> Result<Outcome, Cause>;
    async fn rows(&self, params: &[Value]) -> Result<Rows, Cause>;
    /// Batches of at most [`CHUNK_SIZE`] rows; flattening yields `rows`.
    async fn chunks(&self, params: &[Value]) -> Result<Chunks, Cause> {
        let rows = self.rows(params).await?;
        Ok(rows
            .chunks(CHUNK_SIZE)
            .map(|chunk| chunk.into_iter().collect::<Result<Vec<_>, _>>())
            .boxed())
    }
    /// Opens a scrollable cursor. The caller owns and closes it.
    async fn declare(&self, params: &[Value]) -> Result<Box<dyn Cursor>, Cause>;
    async fn load_rows(&self, feed: Feed) -> Result<(), Cause>;
    async fn load_chunks(&self, feed: ChunkFeed) -> Result<(), Cause> {
        self.load_rows(feed.flat_map(futures::stream::iter).boxed())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    #[test]
    fn outcome_counts() {
        let columns: Arc<[String]> = vec!["i".to_string()].into();
        let rows = (0..3)
            .map(|i| Row::new(columns.clone(), vec![Value::Int(i)]))
            .collect::<Vec<_>>();
        assert_eq!(Outcome::Rows(rows).count(), 3);
        let command = Outcome::Command {
            tag: "DELETE".into(),
            count: 9,
        };
        assert_eq!(command.count(), 9);
        assert!(command.rows().is_none());
    }
}
