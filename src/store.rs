use std::cell::OnceCell;

use chrono::Utc;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use uuid::Uuid;

/// Records move through the store as plain key/value maps, keyed by column
/// name. Handlers hand them to the front end unchanged.
pub type Record = serde_json::Map<String, Value>;

/// Spelling of the link table's foreign-key columns. Older workspaces were
/// created with capitalized names; everything since uses lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkColumns {
    pub package_id: &'static str,
    pub course_id: &'static str,
}

/// Record-oriented adapter over the workspace database. Owns the connection
/// and the cached link-column probe so callers never branch on the table's
/// actual column spelling.
pub struct Store {
    conn: Connection,
    link_cols: OnceCell<LinkColumns>,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Store {
            conn,
            link_cols: OnceCell::new(),
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Probes PRAGMA table_info once per connection and caches the result.
    pub fn link_columns(&self) -> rusqlite::Result<LinkColumns> {
        if let Some(cols) = self.link_cols.get() {
            return Ok(*cols);
        }
        let mut stmt = self.conn.prepare("PRAGMA table_info(package_courses)")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        let detected = if names.iter().any(|n| n == "Package_id") {
            LinkColumns {
                package_id: "Package_id",
                course_id: "Course_id",
            }
        } else {
            LinkColumns {
                package_id: "package_id",
                course_id: "course_id",
            }
        };
        Ok(*self.link_cols.get_or_init(|| detected))
    }

    pub fn fetch_all(&self, table: &str) -> rusqlite::Result<Vec<Record>> {
        require_identifier(table)?;
        let sql = format!("SELECT * FROM {} ORDER BY created_at DESC", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect()
    }

    pub fn fetch_by_id(&self, table: &str, id: &str) -> rusqlite::Result<Option<Record>> {
        require_identifier(table)?;
        let sql = format!("SELECT * FROM {} WHERE id = ?", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map([id], row_to_record)?;
        rows.next().transpose()
    }

    /// Inserts one record, assigning the id and creation stamp server-side.
    /// Returns the stored row re-read from the table.
    pub fn insert(&self, table: &str, fields: &Record) -> rusqlite::Result<Record> {
        require_identifier(table)?;
        let id = Uuid::new_v4().to_string();
        let mut stored = fields.clone();
        stored.insert("id".to_string(), Value::String(id.clone()));
        stored.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let mut columns = Vec::with_capacity(stored.len());
        let mut params = Vec::with_capacity(stored.len());
        for (key, value) in &stored {
            require_identifier(key)?;
            columns.push(key.as_str());
            params.push(to_sql_value(value));
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            table,
            columns.join(", "),
            placeholders
        );
        self.conn.execute(&sql, params_from_iter(params))?;

        self.fetch_by_id(table, &id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Applies a patch by id. Returns the updated row, or None when the id
    /// does not match anything.
    pub fn update(&self, table: &str, id: &str, patch: &Record) -> rusqlite::Result<Option<Record>> {
        require_identifier(table)?;
        if patch.is_empty() {
            return self.fetch_by_id(table, id);
        }

        let mut assignments = Vec::with_capacity(patch.len());
        let mut params = Vec::with_capacity(patch.len() + 1);
        for (key, value) in patch {
            require_identifier(key)?;
            assignments.push(format!("{} = ?", key));
            params.push(to_sql_value(value));
        }
        params.push(SqlValue::Text(id.to_string()));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            table,
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(params))?;
        if changed == 0 {
            return Ok(None);
        }
        self.fetch_by_id(table, id)
    }

    pub fn delete_by_id(&self, table: &str, id: &str) -> rusqlite::Result<usize> {
        require_identifier(table)?;
        let sql = format!("DELETE FROM {} WHERE id = ?", table);
        self.conn.execute(&sql, [id])
    }

    pub fn delete_by_filter(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> rusqlite::Result<usize> {
        let (clause, params) = filter_clause(table, filters)?;
        let sql = format!("DELETE FROM {} WHERE {}", table, clause);
        self.conn.execute(&sql, params_from_iter(params))
    }

    pub fn count_matching(&self, table: &str, filters: &[(&str, &str)]) -> rusqlite::Result<i64> {
        let (clause, params) = filter_clause(table, filters)?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", table, clause);
        self.conn
            .query_row(&sql, params_from_iter(params), |row| row.get(0))
    }
}

fn filter_clause<'a>(
    table: &str,
    filters: &[(&str, &'a str)],
) -> rusqlite::Result<(String, Vec<&'a str>)> {
    require_identifier(table)?;
    let mut terms = Vec::with_capacity(filters.len());
    let mut params = Vec::with_capacity(filters.len());
    for (column, value) in filters {
        require_identifier(column)?;
        terms.push(format!("{} = ?", column));
        params.push(*value);
    }
    if terms.is_empty() {
        // Refuse unfiltered bulk deletes rather than matching everything.
        return Err(rusqlite::Error::InvalidParameterName(
            "empty filter".to_string(),
        ));
    }
    Ok((terms.join(" AND "), params))
}

/// Column and table names are spliced into SQL, so they must never come from
/// request payloads unchecked.
fn require_identifier(name: &str) -> rusqlite::Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(rusqlite::Error::InvalidParameterName(name.to_string()))
    }
}

pub fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    let stmt = row.as_ref();
    let mut record = Record::new();
    for idx in 0..stmt.column_count() {
        let name = stmt.column_name(idx)?.to_string();
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(_) => Value::Null,
        };
        record.insert(name, value);
    }
    Ok(record)
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
