use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::error::StoreError;
use crate::models::{ColumnDescriptor, GridRow};

/// Quote an identifier for interpolation into SQL. Table and column names come
/// from configuration and the store itself, never from grid input.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Read the column set of `table` in declaration order. A table that does not
/// exist, or one declared `WITHOUT ROWID`, is a `StoreError::Schema` because
/// bindings address rows by rowid.
pub fn discover_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnDescriptor>, StoreError> {
    let schema_error = |source| StoreError::Schema {
        table: table.to_string(),
        source: Some(source),
    };

    let mut stmt = conn
        .prepare("SELECT name, type, pk FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(schema_error)?;
    let raw = stmt
        .query_map([table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .map_err(schema_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(schema_error)?;

    if raw.is_empty() {
        return Err(StoreError::Schema {
            table: table.to_string(),
            source: None,
        });
    }

    conn.prepare(&format!("SELECT rowid FROM {} LIMIT 0", quote_ident(table)))
        .map_err(schema_error)?;

    let key_columns = raw.iter().filter(|(_, _, pk)| *pk > 0).count();
    let columns = raw
        .into_iter()
        .map(|(name, declared_type, pk)| {
            let rowid_alias =
                key_columns == 1 && pk == 1 && declared_type.eq_ignore_ascii_case("INTEGER");
            ColumnDescriptor::new(name, declared_type, rowid_alias)
        })
        .collect();

    Ok(columns)
}

/// Full read of every row in rowid order, values rendered as display text.
pub fn fetch_rows(
    conn: &Connection,
    table: &str,
    columns: &[ColumnDescriptor],
) -> Result<Vec<GridRow>, StoreError> {
    let column_list = columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT rowid, {column_list} FROM {} ORDER BY rowid",
        quote_ident(table)
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            let rowid: i64 = row.get(0)?;
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(display_text(row.get_ref(idx + 1)?));
            }
            Ok(GridRow::stored(rowid, values))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Names of all user tables, used to hint at what is available when a
/// configured table is missing.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

fn display_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => number.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE flowers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, price REAL);
             CREATE TABLE flowers_composition (
                 flower_id INTEGER, composition_id INTEGER,
                 PRIMARY KEY (flower_id, composition_id)
             );
             CREATE TABLE keyed (code TEXT PRIMARY KEY, label TEXT) WITHOUT ROWID;
             INSERT INTO flowers (name, price) VALUES ('rose', 2.5), ('tulip', NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn discovers_columns_in_declaration_order() {
        let columns = discover_columns(&conn(), "flowers").unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "price"]);
        assert!(columns[0].rowid_alias);
        assert!(!columns[1].rowid_alias);
    }

    #[test]
    fn composite_key_is_not_a_rowid_alias() {
        let columns = discover_columns(&conn(), "flowers_composition").unwrap();
        assert!(columns.iter().all(|c| !c.rowid_alias));
    }

    #[test]
    fn missing_and_rowless_tables_are_schema_errors() {
        let conn = conn();
        assert!(matches!(
            discover_columns(&conn, "bouquets"),
            Err(StoreError::Schema { source: None, .. })
        ));
        assert!(matches!(
            discover_columns(&conn, "keyed"),
            Err(StoreError::Schema { source: Some(_), .. })
        ));
    }

    #[test]
    fn rows_render_as_text() {
        let conn = conn();
        let columns = discover_columns(&conn, "flowers").unwrap();
        let rows = fetch_rows(&conn, "flowers", &columns).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values, ["1", "rose", "2.5"]);
        assert_eq!(rows[1].values, ["2", "tulip", ""]);
        assert_eq!(rows[1].rowid, Some(2));
    }

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn lists_user_tables() {
        let tables = list_tables(&conn()).unwrap();
        assert_eq!(tables, ["flowers", "flowers_composition", "keyed"]);
    }
}
