use super::*;

/// Result shape of a stored procedure, as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Returns one value or one composite row per call.
    Scalar,
    /// Returns a set of rows.
    Set,
}

/// What a procedure symbol needs to become callable: the statement that
/// invokes the procedure, and the shape of what it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub sql: String,
    pub shape: Shape,
}

/// A live connection, as far as query libraries are concerned.
///
/// Implementations are cheap handles (`Clone`) onto one underlying session;
/// every binding made from the same connection shares that session.
#[async_trait::async_trait]
pub trait Connection: Clone + Send + Sync + 'static {
    type Statement: Statement;
    /// Prepares statement text on the server.
    async fn prepare(&self, sql: &str) -> Result<Self::Statement, Cause>;
    /// Resolves a procedure identifier such as `remove_user(bigint)`.
    async fn procedure(&self, identifier: &str) -> Result<Procedure, Cause>;
}
