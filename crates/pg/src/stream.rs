use super::*;
use bytes::Bytes;
use futures::SinkExt;
use futures::Stream;
use futures::StreamExt;
use qlib_core::Value;
use std::fmt::Write;
use tokio_postgres::Client;
use tokio_postgres::ToStatement;

/// True for `COPY ...` statements, which load through the COPY protocol
/// instead of per-row execution.
pub fn is_copy(sql: &str) -> bool {
    sql.trim_start()
        .get(..4)
        .is_some_and(|word| word.eq_ignore_ascii_case("copy"))
}

/// Renders one row in COPY text format, newline included.
pub fn copy_line(values: &[Value]) -> String {
    let mut line = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push('\t');
        }
        match value {
            Value::Null => line.push_str("\\N"),
            Value::Bool(b) => line.push(if *b { 't' } else { 'f' }),
            Value::Int(n) => line.push_str(&n.to_string()),
            Value::Float(f) => line.push_str(&f.to_string()),
            Value::Text(s) => escape(s, &mut line),
            Value::Bytes(b) => {
                line.push_str("\\\\x");
                for byte in b {
                    let _ = write!(line, "{:02x}", byte);
                }
            }
        }
    }
    line.push('\n');
    line
}

fn escape(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

/// Streams batches of rows into a `COPY ... FROM STDIN` statement.
///
/// Each batch becomes one COPY data message. Returns the number of rows
/// the server reports as copied.
pub async fn copy_in<T, S>(client: &Client, statement: &T, batches: S) -> Result<u64, PgErr>
where
    T: ?Sized + ToStatement,
    S: Stream<Item = Vec<Vec<Value>>> + Send,
{
    let sink = client.copy_in::<_, Bytes>(statement).await?;
    futures::pin_mut!(sink);
    futures::pin_mut!(batches);
    while let Some(batch) = batches.next().await {
        if batch.is_empty() {
            continue;
        }
        let buffer = batch.iter().map(|row| copy_line(row)).collect::<String>();
        sink.as_mut().send(Bytes::from(buffer)).await?;
    }
    let count = sink.finish().await?;
    log::debug!("copied {} rows", count);
    Ok(count)
}
