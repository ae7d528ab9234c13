use crate::io::First;
use crate::io::Input;
use crate::io::Output;
use futures::StreamExt;
use qlib_core::Cause;
use qlib_core::InvocationError;
use qlib_library::Method;
use qlib_pg::Connection;
use qlib_pg::Outcome;
use qlib_pg::Statement;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Statement text, effective method, and the once-only prepared statement
/// of one symbol on one binding.
pub(crate) struct Handle<C: Connection> {
    sql: String,
    method: Method,
    cell: OnceCell<Arc<C::Statement>>,
}

impl<C: Connection> Handle<C> {
    pub(crate) fn lazy(sql: &str, method: Method) -> Self {
        Self {
            sql: sql.to_string(),
            method,
            cell: OnceCell::new(),
        }
    }
    pub(crate) fn ready(sql: &str, method: Method, statement: C::Statement) -> Self {
        Self {
            sql: sql.to_string(),
            method,
            cell: OnceCell::new_with(Some(Arc::new(statement))),
        }
    }
    pub(crate) fn is_prepared(&self) -> bool {
        self.cell.initialized()
    }
}

/// A callable symbol of a [`Binding`](crate::Binding).
pub struct BoundSymbol<'a, C: Connection> {
    name: &'a str,
    conn: &'a C,
    handle: &'a Handle<C>,
}

impl<'a, C: Connection> BoundSymbol<'a, C> {
    pub(crate) fn new(name: &'a str, conn: &'a C, handle: &'a Handle<C>) -> Self {
        Self { name, conn, handle }
    }
    pub fn name(&self) -> &str {
        self.name
    }
    /// The effective method. For procedures this is derived from the
    /// catalog: `first` for scalar results, `rows` for sets.
    pub fn method(&self) -> Method {
        self.handle.method
    }
    /// The statement text that is prepared.
    pub fn sql(&self) -> &str {
        &self.handle.sql
    }

    /// The prepared statement, preparing it on first use.
    ///
    /// Concurrent first callers wait for one preparation and share it. A
    /// failed preparation leaves the symbol unprepared for a later retry.
    pub async fn statement(&self) -> Result<Arc<C::Statement>, InvocationError> {
        self.handle
            .cell
            .get_or_try_init(|| async {
                log::debug!("{}: preparing on first use", self.name);
                self.conn.prepare(&self.handle.sql).await.map(Arc::new)
            })
            .await
            .cloned()
            .map_err(|source| InvocationError::Prepare {
                symbol: self.name.to_string(),
                source,
            })
    }
    /// Forces preparation without executing anything.
    pub async fn prepare(&self) -> Result<(), InvocationError> {
        self.statement().await.map(|_| ())
    }
    /// Result column names of the prepared statement.
    pub async fn columns(&self) -> Result<Vec<String>, InvocationError> {
        Ok(self.statement().await?.columns().to_vec())
    }
    /// Parameter type names of the prepared statement.
    pub async fn params(&self) -> Result<Vec<String>, InvocationError> {
        Ok(self.statement().await?.params().to_vec())
    }

    /// Runs the symbol according to its method.
    pub async fn call(&self, input: impl Into<Input>) -> Result<Output, InvocationError> {
        let input = input.into();
        let method = self.method();
        let accepted = match &input {
            Input::Params(_) => method.is_query(),
            Input::Rows(_) => method == Method::LoadRows,
            Input::Chunks(_) => method == Method::LoadChunks,
        };
        if !accepted {
            return Err(self.mismatch());
        }
        let statement = self.statement().await?;
        let ref symbol = self.name.to_string();
        let fail = |source: Cause| execute(symbol, source);
        match (method, input) {
            (Method::Default, Input::Params(ref params)) => {
                let outcome = statement.execute(params).await.map_err(fail)?;
                Ok(Output::Result(outcome))
            }
            (Method::Rows, Input::Params(ref params)) => {
                let symbol = symbol.clone();
                let rows = statement.rows(params).await.map_err(fail)?;
                Ok(Output::Rows(
                    rows.map(move |row| row.map_err(|source| execute(&symbol, source)))
                        .boxed(),
                ))
            }
            (Method::Chunks, Input::Params(ref params)) => {
                let symbol = symbol.clone();
                let chunks = statement.chunks(params).await.map_err(fail)?;
                Ok(Output::Chunks(
                    chunks
                        .map(move |chunk| chunk.map_err(|source| execute(&symbol, source)))
                        .boxed(),
                ))
            }
            (Method::Column, Input::Params(ref params)) => {
                let symbol = symbol.clone();
                let rows = statement.rows(params).await.map_err(fail)?;
                Ok(Output::Column(
                    rows.map(move |row| {
                        row.map(|row| row.take(0))
                            .map_err(|source| execute(&symbol, source))
                    })
                    .boxed(),
                ))
            }
            (Method::First, Input::Params(ref params)) => {
                let first = self.first(&statement, params).await.map_err(fail)?;
                Ok(Output::First(first))
            }
            (Method::Declare, Input::Params(ref params)) => {
                let cursor = statement.declare(params).await.map_err(fail)?;
                Ok(Output::Cursor(cursor))
            }
            (Method::LoadRows, Input::Rows(feed)) => {
                statement.load_rows(feed).await.map_err(fail)?;
                Ok(Output::Loaded)
            }
            (Method::LoadChunks, Input::Chunks(feed)) => {
                statement.load_chunks(feed).await.map_err(fail)?;
                Ok(Output::Loaded)
            }
            _ => Err(self.mismatch()),
        }
    }

    fn mismatch(&self) -> InvocationError {
        InvocationError::Input {
            symbol: self.name.to_string(),
            method: match self.method() {
                Method::Default => "default".to_string(),
                m => m.to_string(),
            },
        }
    }

    async fn first(&self, statement: &C::Statement, params: &[qlib_core::Value]) -> Result<First, Cause> {
        if statement.columns().is_empty() {
            return match statement.execute(params).await? {
                Outcome::Command { count, .. } => Ok(First::Count(count)),
                Outcome::Rows(rows) => Ok(rows.into_iter().next().map_or(First::Empty, First::Row)),
            };
        }
        let single = statement.columns().len() == 1;
        let mut rows = statement.rows(params).await?;
        match rows.next().await.transpose()? {
            None => Ok(First::Empty),
            Some(row) if single => Ok(First::Value(row.take(0))),
            Some(row) => Ok(First::Row(row)),
        }
    }
}

fn execute(symbol: &str, source: Cause) -> InvocationError {
    InvocationError::Execute {
        symbol: symbol.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Binding;
    use crate::fake::Fake;
    use futures::TryStreamExt;
    use qlib_core::Row;
    use qlib_core::Value;
    use qlib_library::Library;
    use qlib_pg::Cursor;
    use qlib_pg::Seek;

    const SERIES: &str = "SELECT i, i * i AS square FROM generate_series(0,599) AS g(i)";

    fn fake() -> Fake {
        Fake::default()
            .query(SERIES, &["i", "square"], (0..600).map(|i| vec![Value::Int(i), Value::Int(i * i)]).collect())
            .command("INSERT INTO users VALUES ($1, $2)", "INSERT", 1)
            .command("COPY users FROM STDIN", "COPY", 0)
    }

    async fn series(fake: &Fake) -> Binding<Fake> {
        let ilf = format!(
            "[all::rows]\n{0}\n[batches::chunks]\n{0}\n[squares::column]\n{0}\n[scroll::declare]\n{0}\n\
             [insert::load_rows]\nINSERT INTO users VALUES ($1, $2)\n\
             [bulk::load_chunks]\nCOPY users FROM STDIN\n",
            SERIES
        );
        let library = Library::build("series", ilf.as_str()).unwrap();
        Binding::bind(Arc::new(library), fake.clone()).await.unwrap()
    }

    async fn collect(binding: &Binding<Fake>, name: &str) -> Vec<Row> {
        binding
            .call(name, Input::default())
            .await
            .unwrap()
            .into_rows()
            .unwrap()
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn flattened_chunks_equal_rows() {
        let ref fake = fake();
        let binding = series(fake).await;
        let rows = collect(&binding, "all").await;
        let chunks = binding
            .call("batches", Input::default())
            .await
            .unwrap()
            .into_chunks()
            .unwrap()
            .try_collect::<Vec<Vec<Row>>>()
            .await
            .unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= qlib_core::CHUNK_SIZE));
        assert_eq!(chunks.into_iter().flatten().collect::<Vec<_>>(), rows);
    }

    #[tokio::test]
    async fn column_projects_the_first_column() {
        let ref fake = fake();
        let binding = series(fake).await;
        let rows = collect(&binding, "all").await;
        let column = binding
            .call("squares", Input::default())
            .await
            .unwrap()
            .into_column()
            .unwrap()
            .try_collect::<Vec<Value>>()
            .await
            .unwrap();
        let projected = rows.into_iter().map(|r| r.take(0)).collect::<Vec<_>>();
        assert_eq!(column, projected);
    }

    #[tokio::test]
    async fn dropping_a_stream_early_releases_it() {
        let ref fake = fake();
        let binding = series(fake).await;
        let mut rows = binding
            .call("all", Input::default())
            .await
            .unwrap()
            .into_rows()
            .unwrap();
        assert!(rows.next().await.is_some());
        assert_eq!(fake.releases(), 0);
        drop(rows);
        assert_eq!(fake.releases(), 1);
        let _ = collect(&binding, "all").await;
        assert_eq!(fake.releases(), 2);
    }

    #[tokio::test]
    async fn cursors_read_and_seek() {
        let ref fake = fake();
        let binding = series(fake).await;
        let mut cursor = binding
            .call("scroll", Input::default())
            .await
            .unwrap()
            .into_cursor()
            .unwrap();
        let page = cursor.read(10).await.unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page[9].get(0), Some(&Value::Int(9)));
        cursor.seek(Seek::Absolute(595)).await.unwrap();
        let tail = cursor.read(10).await.unwrap();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0].get(0), Some(&Value::Int(595)));
        cursor.seek(Seek::Relative(-600)).await.unwrap();
        assert_eq!(cursor.read(1).await.unwrap()[0].get(0), Some(&Value::Int(0)));
        cursor.close().await.unwrap();
        assert!(cursor.read(1).await.is_err());
    }

    #[tokio::test]
    async fn load_rows_executes_per_row() {
        let ref fake = fake();
        let binding = series(fake).await;
        let feed = futures::stream::iter((0..4).map(|i| vec![Value::Int(i), Value::from("x")]));
        let output = binding.call("insert", Input::rows(feed)).await.unwrap();
        assert!(matches!(output, Output::Loaded));
        assert_eq!(fake.loaded().len(), 4);
        assert_eq!(fake.executions("INSERT INTO users VALUES ($1, $2)"), 4);
    }

    #[tokio::test]
    async fn load_chunks_consumes_every_batch() {
        let ref fake = fake();
        let binding = series(fake).await;
        let batches = vec![
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
            vec![],
            vec![vec![Value::Int(3)]],
        ];
        let output = binding
            .call("bulk", Input::chunks(futures::stream::iter(batches)))
            .await
            .unwrap();
        assert!(matches!(output, Output::Loaded));
        assert_eq!(
            fake.loaded(),
            vec![vec![Value::Int(1)], vec![Value::Int(2)], vec![Value::Int(3)]]
        );
    }

    #[tokio::test]
    async fn wrong_input_shape_is_rejected_before_prepare() {
        let ref fake = fake();
        let binding = series(fake).await;
        let e = binding.call("insert", Input::default()).await.unwrap_err();
        assert!(matches!(e, InvocationError::Input { ref method, .. } if method == "load_rows"));
        let feed = futures::stream::iter(vec![vec![Value::Int(1)]]);
        let e = binding.call("all", Input::rows(feed)).await.unwrap_err();
        assert!(matches!(e, InvocationError::Input { .. }));
        assert_eq!(fake.prepares("INSERT INTO users VALUES ($1, $2)"), 0);
    }

    #[tokio::test]
    async fn introspection_reports_columns() {
        let ref fake = fake();
        let binding = series(fake).await;
        let all = binding.symbol("all").unwrap();
        assert_eq!(all.columns().await.unwrap(), vec!["i".to_string(), "square".to_string()]);
        assert!(all.params().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn explicit_prepare_resolves_the_placeholder() {
        let ref fake = fake();
        let binding = series(fake).await;
        assert!(!binding.is_resolved("all"));
        binding.symbol("all").unwrap().prepare().await.unwrap();
        assert!(binding.is_resolved("all"));
        let _ = collect(&binding, "all").await;
        assert_eq!(fake.prepares(SERIES), 1);
    }
}
