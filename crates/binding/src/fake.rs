//! In-memory connection for binding tests.
//!
//! Results are scripted by statement text. Every prepare, execution, and
//! stream release is counted so tests can assert on resolution behaviour.
use futures::StreamExt;
use qlib_core::Cause;
use qlib_core::Row;
use qlib_core::Value;
use qlib_pg::Connection;
use qlib_pg::Cursor;
use qlib_pg::Feed;
use qlib_pg::Outcome;
use qlib_pg::Procedure;
use qlib_pg::Rows;
use qlib_pg::Seek;
use qlib_pg::Shape;
use qlib_pg::Statement;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Query {
        columns: Arc<[String]>,
        rows: Vec<Vec<Value>>,
    },
    Command {
        tag: String,
        count: u64,
    },
    Broken,
}

#[derive(Default)]
struct State {
    scripts: Mutex<HashMap<String, Script>>,
    procedures: Mutex<HashMap<String, Procedure>>,
    failing: Mutex<HashSet<String>>,
    prepares: Mutex<HashMap<String, usize>>,
    executions: Mutex<HashMap<String, usize>>,
    loaded: Mutex<Vec<Vec<Value>>>,
    releases: Arc<AtomicUsize>,
    delay: Mutex<Option<Duration>>,
}

impl State {
    fn count(map: &Mutex<HashMap<String, usize>>, sql: &str) {
        *map.lock().unwrap().entry(sql.to_string()).or_default() += 1;
    }
}

#[derive(Clone, Default)]
pub struct Fake {
    state: Arc<State>,
}

impl Fake {
    pub fn query(self, sql: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect::<Vec<_>>().into();
        self.script(sql, Script::Query { columns, rows })
    }
    pub fn command(self, sql: &str, tag: &str, count: u64) -> Self {
        let tag = tag.to_string();
        self.script(sql, Script::Command { tag, count })
    }
    /// Prepares fine, fails on every execution.
    pub fn broken(self, sql: &str) -> Self {
        self.script(sql, Script::Broken)
    }
    pub fn procedure(self, identifier: &str, sql: &str, shape: Shape) -> Self {
        let procedure = Procedure {
            sql: sql.to_string(),
            shape,
        };
        self.state
            .procedures
            .lock()
            .unwrap()
            .insert(identifier.to_string(), procedure);
        self
    }
    /// Makes every prepare of `sql` fail until healed.
    pub fn failing(self, sql: &str) -> Self {
        self.state.failing.lock().unwrap().insert(sql.to_string());
        self
    }
    pub fn heal(&self, sql: &str) {
        self.state.failing.lock().unwrap().remove(sql);
    }
    /// Slows every prepare down, widening the window for racing callers.
    pub fn delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = Some(delay);
        self
    }
    fn script(self, sql: &str, script: Script) -> Self {
        self.state
            .scripts
            .lock()
            .unwrap()
            .insert(sql.to_string(), script);
        self
    }

    pub fn prepares(&self, sql: &str) -> usize {
        self.state.prepares.lock().unwrap().get(sql).copied().unwrap_or(0)
    }
    pub fn executions(&self, sql: &str) -> usize {
        self.state.executions.lock().unwrap().get(sql).copied().unwrap_or(0)
    }
    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }
    pub fn loaded(&self) -> Vec<Vec<Value>> {
        self.state.loaded.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Connection for Fake {
    type Statement = FakeStatement;
    async fn prepare(&self, sql: &str) -> Result<FakeStatement, Cause> {
        let delay = *self.state.delay.lock().unwrap();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        State::count(&self.state.prepares, sql);
        if self.state.failing.lock().unwrap().contains(sql) {
            return Err(format!("cannot prepare {:?}", sql).into());
        }
        let script = self.state.scripts.lock().unwrap().get(sql).cloned();
        let script = script.ok_or_else(|| format!("syntax error in {:?}", sql))?;
        Ok(FakeStatement {
            sql: sql.to_string(),
            script,
            state: self.state.clone(),
        })
    }
    async fn procedure(&self, identifier: &str) -> Result<Procedure, Cause> {
        let procedures = self.state.procedures.lock().unwrap();
        let procedure = procedures.get(identifier).cloned();
        procedure.ok_or_else(|| format!("function {} does not exist", identifier).into())
    }
}

pub struct FakeStatement {
    sql: String,
    script: Script,
    state: Arc<State>,
}

impl FakeStatement {
    fn results(&self) -> Result<Vec<Row>, Cause> {
        State::count(&self.state.executions, &self.sql);
        match &self.script {
            Script::Query { columns, rows } => Ok(rows
                .iter()
                .map(|values| Row::new(columns.clone(), values.clone()))
                .collect()),
            Script::Command { .. } => Ok(Vec::new()),
            Script::Broken => Err(format!("execution of {:?} failed", self.sql).into()),
        }
    }
}

/// Counts a release when the stream holding it is dropped.
struct Release(Arc<AtomicUsize>);

impl Drop for Release {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Statement for FakeStatement {
    fn sql(&self) -> &str {
        &self.sql
    }
    fn columns(&self) -> &[String] {
        match &self.script {
            Script::Query { columns, .. } => &columns[..],
            _ => &[],
        }
    }
    fn params(&self) -> &[String] {
        &[]
    }
    async fn execute(&self, _: &[Value]) -> Result<Outcome, Cause> {
        let rows = self.results()?;
        match &self.script {
            Script::Command { tag, count } => Ok(Outcome::Command {
                tag: tag.clone(),
                count: *count,
            }),
            _ => Ok(Outcome::Rows(rows)),
        }
    }
    async fn rows(&self, _: &[Value]) -> Result<Rows, Cause> {
        let rows = self.results()?;
        let release = Release(self.state.releases.clone());
        Ok(futures::stream::iter(rows)
            .map(move |row| {
                let _ = &release;
                Ok::<_, Cause>(row)
            })
            .boxed())
    }
    async fn declare(&self, _: &[Value]) -> Result<Box<dyn Cursor>, Cause> {
        let rows = self.results()?;
        Ok(Box::new(FakeCursor {
            rows,
            position: 0,
            closed: false,
        }))
    }
    async fn load_rows(&self, mut feed: Feed) -> Result<(), Cause> {
        while let Some(row) = feed.next().await {
            State::count(&self.state.executions, &self.sql);
            self.state.loaded.lock().unwrap().push(row);
        }
        Ok(())
    }
}

struct FakeCursor {
    rows: Vec<Row>,
    position: usize,
    closed: bool,
}

#[async_trait::async_trait]
impl Cursor for FakeCursor {
    fn name(&self) -> &str {
        "fake"
    }
    async fn read(&mut self, n: usize) -> Result<Vec<Row>, Cause> {
        if self.closed {
            return Err("cursor is closed".into());
        }
        let start = self.position.min(self.rows.len());
        let end = (start + n).min(self.rows.len());
        self.position = end;
        Ok(self.rows[start..end].to_vec())
    }
    async fn seek(&mut self, to: Seek) -> Result<(), Cause> {
        let len = self.rows.len() as i64;
        let position = match to {
            Seek::Absolute(n) if n < 0 => len + 1 + n,
            Seek::Absolute(n) => n,
            Seek::Relative(n) => self.position as i64 + n,
        };
        self.position = position.clamp(0, len) as usize;
        Ok(())
    }
    async fn close(&mut self) -> Result<(), Cause> {
        self.closed = true;
        Ok(())
    }
}
