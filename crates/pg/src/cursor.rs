use super::*;
use qlib_core::Row;

/// Cursor repositioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// To row `n`; 0 is before the first row, negative counts from the end.
    Absolute(i64),
    /// By `n` rows from the current position.
    Relative(i64),
}

/// A scrollable server-side cursor.
#[async_trait::async_trait]
pub trait Cursor: Send {
    fn name(&self) -> &str;
    /// Reads up to `n` rows forward. An empty result means the end.
    async fn read(&mut self, n: usize) -> Result<Vec<Row>, Cause>;
    async fn seek(&mut self, to: Seek) -> Result<(), Cause>;
    /// Releases the cursor on the server. Further calls are no-ops.
    async fn close(&mut self) -> Result<(), Cause>;
}
