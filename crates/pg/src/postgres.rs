use super::*;
use const_format::concatcp;
use futures::StreamExt;
use qlib_core::CHUNK_SIZE;
use qlib_core::Row;
use qlib_core::Value;
use tokio_postgres::types::ToSql;

// ===== CATALOG =====

const CURSOR_PREFIX: &str = "qlib_";

const RETURNS_ROW: &str = "(t.typtype = 'c' OR p.prorettype = 'record'::regtype)";

/// Qualified name, argument types, set-returning flag and composite flag
/// of one procedure, looked up by its `regprocedure` identifier.
const PROCEDURE: &str = concatcp!(
    "SELECT quote_ident(n.nspname) || '.' || quote_ident(p.proname), ",
    "p.proargtypes::regtype[]::text[], ",
    "p.proretset, ",
    RETURNS_ROW,
    " FROM pg_catalog.pg_proc p",
    " JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace",
    " JOIN pg_catalog.pg_type t ON t.oid = p.prorettype",
    " WHERE p.oid = $1::text::regprocedure"
);

// ===== CONNECTION =====

#[async_trait::async_trait]
impl Connection for Arc<Client> {
    type Statement = Prepared;
    async fn prepare(&self, sql: &str) -> Result<Prepared, Cause> {
        log::debug!("preparing: {}", sql);
        let inner = self.as_ref().prepare(sql).await?;
        let columns = inner
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>()
            .into();
        let params = inner.params().iter().map(|t| t.name().to_string()).collect();
        Ok(Prepared {
            client: self.clone(),
            inner,
            sql: sql.to_string(),
            columns,
            params,
        })
    }
    async fn procedure(&self, identifier: &str) -> Result<Procedure, Cause> {
        let row = self.as_ref().query_one(PROCEDURE, &[&identifier]).await?;
        let name = row.try_get::<_, String>(0)?;
        let args = row.try_get::<_, Vec<String>>(1)?;
        let set = row.try_get::<_, bool>(2)?;
        let composite = row.try_get::<_, bool>(3)?;
        let args = args
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("${}::{}", i + 1, ty))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = match set || composite {
            true => format!("SELECT * FROM {}({})", name, args),
            false => format!("SELECT {}({})", name, args),
        };
        let shape = match set {
            true => Shape::Set,
            false => Shape::Scalar,
        };
        log::debug!("resolved procedure {} as {}", identifier, sql);
        Ok(Procedure { sql, shape })
    }
}

// ===== STATEMENT =====

/// Statements a `WITH` clause can feed.
const MAIN: [&str; 7] = ["SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "VALUES", "TABLE"];

/// The command keyword of `sql`: its first word outside comments, quotes
/// and parentheses, or for `WITH` the statement the common table
/// expressions feed.
fn command(sql: &str) -> &str {
    let mut words = words(sql).into_iter();
    match words.next() {
        Some(with) if with.eq_ignore_ascii_case("WITH") => words
            .find(|w| MAIN.iter().any(|k| w.eq_ignore_ascii_case(k)))
            .unwrap_or(with),
        Some(word) => word,
        None => "",
    }
}

/// Words at the outermost nesting level. Parentheses opened before the
/// first word do not count as nesting.
fn words(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map_or(bytes.len(), |n| i + n);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |n| i + n + 4);
            }
            q @ (b'\'' | b'"') => {
                i = sql[i + 1..].find(q as char).map_or(bytes.len(), |n| i + n + 2);
            }
            b'(' if words.is_empty() => i += 1,
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let end = sql[i..]
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .map_or(bytes.len(), |n| i + n);
                if depth == 0 {
                    words.push(&sql[i..end]);
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    words
}

/// A statement prepared on a tokio-postgres client.
pub struct Prepared {
    client: Arc<Client>,
    inner: tokio_postgres::Statement,
    sql: String,
    columns: Arc<[String]>,
    params: Vec<String>,
}

impl Prepared {
    fn bind(params: &[Value]) -> Vec<Param<'_>> {
        params.iter().map(Param).collect()
    }
    fn tag(&self) -> String {
        command(&self.sql).to_uppercase()
    }
    fn hydrate(&self, rows: &[tokio_postgres::Row]) -> Result<Vec<Row>, PgErr> {
        rows.iter().map(|row| hydrate(row, &self.columns)).collect()
    }
}

impl std::fmt::Debug for Prepared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prepared")
            .field("sql", &self.sql)
            .field("columns", &self.columns)
            .field("params", &self.params)
            .finish()
    }
}

#[async_trait::async_trait]
impl Statement for Prepared {
    fn sql(&self) -> &str {
        &self.sql
    }
    fn columns(&self) -> &[String] {
        &self.columns
    }
    fn params(&self) -> &[String] {
        &self.params
    }
    async fn execute(&self, params: &[Value]) -> Result<Outcome, Cause> {
        let ref bound = Self::bind(params);
        let refs = bound
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect::<Vec<_>>();
        match self.columns.is_empty() {
            true => {
                let count = self.client.execute(&self.inner, &refs).await?;
                Ok(Outcome::Command {
                    tag: self.tag(),
                    count,
                })
            }
            false => {
                let rows = self.client.query(&self.inner, &refs).await?;
                Ok(Outcome::Rows(self.hydrate(&rows)?))
            }
        }
    }
    async fn rows(&self, params: &[Value]) -> Result<Rows, Cause> {
        let ref bound = Self::bind(params);
        let stream = self
            .client
            .query_raw(&self.inner, bound.iter().map(|p| p as &(dyn ToSql + Sync)))
            .await?;
        let columns = self.columns.clone();
        Ok(stream
            .map(move |row| {
                row.and_then(|ref row| hydrate(row, &columns))
                    .map_err(Cause::from)
            })
            .boxed())
    }
    async fn declare(&self, params: &[Value]) -> Result<Box<dyn Cursor>, Cause> {
        let name = format!("{}{}", CURSOR_PREFIX, uuid::Uuid::now_v7().simple());
        let body = self.sql.trim().trim_end_matches(';');
        let ref declare = format!("DECLARE {} SCROLL CURSOR WITH HOLD FOR {}", name, body);
        let ref bound = Self::bind(params);
        let refs = bound
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect::<Vec<_>>();
        self.client.execute(declare.as_str(), &refs).await?;
        log::debug!("declared cursor {}", name);
        Ok(Box::new(PgCursor {
            client: self.client.clone(),
            name,
            columns: self.columns.clone(),
            closed: false,
        }))
    }
    async fn load_rows(&self, feed: Feed) -> Result<(), Cause> {
        match is_copy(&self.sql) {
            true => {
                copy_in(&self.client, &self.inner, feed.chunks(CHUNK_SIZE)).await?;
            }
            false => {
                let mut feed = feed;
                while let Some(ref row) = feed.next().await {
                    self.execute(row).await?;
                }
            }
        }
        Ok(())
    }
    async fn load_chunks(&self, feed: ChunkFeed) -> Result<(), Cause> {
        match is_copy(&self.sql) {
            true => {
                copy_in(&self.client, &self.inner, feed).await?;
            }
            false => {
                let mut feed = feed;
                while let Some(batch) = feed.next().await {
                    for ref row in batch {
                        self.execute(row).await?;
                    }
                }
            }
        }
        Ok(())
    }
}

// ===== CURSOR =====

/// A `SCROLL CURSOR WITH HOLD`, which survives outside a transaction
/// block until closed.
///
/// Dropping an open cursor schedules its `CLOSE` on the current runtime.
pub struct PgCursor {
    client: Arc<Client>,
    name: String,
    columns: Arc<[String]>,
    closed: bool,
}

impl PgCursor {
    fn check(&self) -> Result<(), Cause> {
        match self.closed {
            true => Err(format!("cursor {} is closed", self.name).into()),
            false => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Cursor for PgCursor {
    fn name(&self) -> &str {
        &self.name
    }
    async fn read(&mut self, n: usize) -> Result<Vec<Row>, Cause> {
        self.check()?;
        if n == 0 {
            return Ok(Vec::new());
        }
        let ref sql = format!("FETCH FORWARD {} FROM {}", n, self.name);
        let rows = self.client.query(sql.as_str(), &[]).await?;
        Ok(rows
            .iter()
            .map(|row| hydrate(row, &self.columns))
            .collect::<Result<Vec<_>, _>>()?)
    }
    async fn seek(&mut self, to: Seek) -> Result<(), Cause> {
        self.check()?;
        let ref sql = match to {
            Seek::Absolute(n) => format!("MOVE ABSOLUTE {} IN {}", n, self.name),
            Seek::Relative(n) => format!("MOVE RELATIVE {} IN {}", n, self.name),
        };
        self.client.batch_execute(sql).await?;
        Ok(())
    }
    async fn close(&mut self) -> Result<(), Cause> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let ref sql = format!("CLOSE {}", self.name);
        self.client.batch_execute(sql).await?;
        log::debug!("closed cursor {}", self.name);
        Ok(())
    }
}

impl Drop for PgCursor {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let sql = format!("CLOSE {}", self.name);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let client = self.client.clone();
                handle.spawn(async move {
                    if let Err(e) = client.batch_execute(&sql).await {
                        log::warn!("failed to close cursor: {}", e);
                    }
                });
            }
            Err(_) => log::warn!("cursor {} dropped outside a runtime", self.name),
        }
    }
}
