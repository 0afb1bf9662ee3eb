//! Read-only database connections and prepared statements.

use crate::bridge::EngineVfs;
use crate::error::{SqliteError, SqliteResult};
use rangevfs_core::{SystemHost, VfsConfig, VfsRegistry};
use rangevfs_http::{HttpConfig, HttpSource, ReqwestClient};
use rusqlite::types::Value;
use rusqlite::{DatabaseName, OpenFlags};
use std::sync::Arc;
use tracing::debug;

/// Columns and rows produced by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Row values, one vector per row, indexed by column position.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Returns the single value of a one-row, one-column result.
    #[must_use]
    pub fn scalar(&self) -> Option<&Value> {
        match self.rows.as_slice() {
            [row] if row.len() == 1 => row.first(),
            _ => None,
        }
    }
}

/// A read-only connection to a database served through a registry.
///
/// # Example
///
/// ```no_run
/// use rangevfs_sqlite::Connection;
///
/// let conn = Connection::open("https://example.com/data/app.db").unwrap();
/// let result = conn.query("SELECT count(*) FROM sqlite_master", &[]).unwrap();
/// println!("{:?}", result.scalar());
/// ```
pub struct Connection {
    // Declared first: dropped before the registration it uses.
    conn: rusqlite::Connection,
    target: String,
    vfs: Arc<EngineVfs>,
}

impl Connection {
    /// Opens `url` over HTTP with the standard backend composition.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, the registry
    /// cannot be registered, or the database cannot be opened.
    pub fn open(url: &str) -> SqliteResult<Self> {
        let config = HttpConfig::default();
        let client = ReqwestClient::new(&config)?;
        let source = HttpSource::with_config(client, config);
        let registry = VfsRegistry::standard(
            &VfsConfig::default(),
            Arc::new(source),
            Arc::new(SystemHost::new()),
        )?;
        Self::open_with(url, EngineVfs::register(registry)?)
    }

    /// Opens `target` through an existing registration.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Open`] if the engine cannot open the database.
    pub fn open_with(target: &str, vfs: Arc<EngineVfs>) -> SqliteResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = rusqlite::Connection::open_with_flags_and_vfs(target, flags, vfs.name())
            .map_err(|source| SqliteError::Open {
                target: target.to_string(),
                source,
            })?;
        debug!(db = target, vfs = vfs.name(), "opened connection");
        Ok(Self {
            conn,
            target: target.to_string(),
            vfs,
        })
    }

    /// Returns the URL or path this connection was opened with.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the registration this connection reads through.
    #[must_use]
    pub fn vfs(&self) -> &Arc<EngineVfs> {
        &self.vfs
    }

    /// Returns the underlying engine connection.
    #[must_use]
    pub fn engine(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Compiles a single statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQL does not compile.
    pub fn prepare(&self, sql: &str) -> SqliteResult<Statement<'_>> {
        Ok(Statement {
            inner: self.conn.prepare(sql)?,
        })
    }

    /// Runs `sql` with positional parameters and collects every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQL does not compile, a parameter cannot be
    /// bound, or stepping fails.
    pub fn query(&self, sql: &str, params: &[Value]) -> SqliteResult<QueryResult> {
        self.prepare(sql)?.query(params)
    }

    /// Returns the main database as one contiguous image.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot read every page.
    pub fn serialize(&self) -> SqliteResult<Vec<u8>> {
        let data = self.conn.serialize(DatabaseName::Main)?;
        Ok(data.as_ref().to_vec())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("target", &self.target)
            .field("vfs", &self.vfs.name())
            .finish_non_exhaustive()
    }
}

/// A compiled statement.
pub struct Statement<'conn> {
    inner: rusqlite::Statement<'conn>,
}

impl Statement<'_> {
    /// Returns the result column names.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.inner
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Returns the number of bind parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    /// Binds `params` by position (the first value binds `?1`) and collects
    /// every row.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter cannot be bound or stepping fails.
    pub fn query(&mut self, params: &[Value]) -> SqliteResult<QueryResult> {
        for (index, value) in params.iter().enumerate() {
            self.inner.raw_bind_parameter(index + 1, value)?;
        }
        self.collect_rows()
    }

    /// Binds `params` by name (`:id`, `@id` or `$id`) and collects every row.
    ///
    /// Names the statement does not use are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter cannot be bound or stepping fails.
    pub fn query_named(&mut self, params: &[(&str, Value)]) -> SqliteResult<QueryResult> {
        for (name, value) in params {
            if let Some(index) = self.inner.parameter_index(name)? {
                self.inner.raw_bind_parameter(index, value)?;
            }
        }
        self.collect_rows()
    }

    fn collect_rows(&mut self) -> SqliteResult<QueryResult> {
        let columns = self.columns();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = self.inner.raw_query();
        while let Some(row) = cursor.next()? {
            let values = (0..width)
                .map(|index| row.get::<_, Value>(index))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(values);
        }
        Ok(QueryResult { columns, rows })
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("columns", &self.columns())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_requires_one_cell() {
        let single = QueryResult {
            columns: vec!["n".into()],
            rows: vec![vec![Value::Integer(3)]],
        };
        assert_eq!(single.scalar(), Some(&Value::Integer(3)));

        let empty = QueryResult {
            columns: vec!["n".into()],
            rows: Vec::new(),
        };
        assert_eq!(empty.scalar(), None);

        let wide = QueryResult {
            columns: vec!["a".into(), "b".into()],
            rows: vec![vec![Value::Null, Value::Null]],
        };
        assert_eq!(wide.scalar(), None);
    }
}
