use std::collections::BTreeSet;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, info, warn};

use super::connection::Store;
use super::schema::{discover_columns, fetch_rows, quote_ident};
use crate::error::{StoreError, ValidationError};
use crate::models::{ColumnDescriptor, GridRow, RowState};

/// Summary of a successful `commit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Number of rows written (inserts plus updates).
    pub written: usize,
    /// Rowids assigned to staged inserts, in grid order.
    pub inserted: Vec<i64>,
}

/// Live, editable view of one table. The column set is fixed when the binding
/// is created; rows are re-read on `refresh` and after a clean commit. Staged
/// inserts sit after the stored rows until they are committed.
#[derive(Debug)]
pub struct TableBinding {
    table: String,
    columns: Vec<ColumnDescriptor>,
    rows: Vec<GridRow>,
}

impl TableBinding {
    /// Attach to `table` and perform the initial full read.
    pub fn bind(store: &Store, table: &str) -> Result<Self, StoreError> {
        let columns = discover_columns(store.conn(), table)?;
        let rows =
            fetch_rows(store.conn(), table, &columns).map_err(|err| read_failure(table, err))?;
        info!(table, columns = columns.len(), rows = rows.len(), "bound table");
        Ok(Self {
            table: table.to_string(),
            columns,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&GridRow> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column whose label matches `label` ignoring case.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        let lowered = label.to_lowercase();
        self.columns.iter().position(|c| c.label_is(&lowered))
    }

    /// Visible index of the row carrying `rowid`.
    pub fn position_of(&self, rowid: i64) -> Option<usize> {
        self.rows.iter().position(|row| row.rowid == Some(rowid))
    }

    pub fn has_pending_changes(&self) -> bool {
        self.rows.iter().any(GridRow::is_dirty)
    }

    /// Re-read every row, dropping staged inserts and updates.
    pub fn refresh(&mut self, store: &Store) -> Result<(), StoreError> {
        let discarded = self.rows.iter().filter(|row| row.is_dirty()).count();
        self.rows = fetch_rows(store.conn(), &self.table, &self.columns)?;
        debug!(
            table = %self.table,
            rows = self.rows.len(),
            discarded,
            "refreshed table"
        );
        Ok(())
    }

    /// Stage a new row at the end of the grid. Nothing is written until
    /// `commit`. Returns the visible index of the staged row.
    pub fn insert_row(&mut self, values: Vec<String>) -> Result<usize, ValidationError> {
        if values.len() != self.columns.len() {
            return Err(ValidationError::ColumnCount {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(GridRow::staged(values));
        Ok(self.rows.len() - 1)
    }

    /// Stage a new value for one cell. Stored rows become `Modified`; staged
    /// inserts simply carry the new value. A stored row's rowid alias cannot
    /// be cleared.
    pub fn set_value(&mut self, row: usize, column: usize, value: String) -> Result<(), StoreError> {
        let len = self.rows.len();
        let width = self.columns.len();
        let target = self
            .rows
            .get_mut(row)
            .ok_or(StoreError::RowOutOfRange { row, len })?;
        let cell = target
            .values
            .get_mut(column)
            .ok_or(StoreError::ColumnOutOfRange { column, len: width })?;

        if *cell == value {
            return Ok(());
        }
        if target.state != RowState::Inserted
            && self.columns[column].rowid_alias
            && value.trim().is_empty()
        {
            return Err(StoreError::KeyRequired {
                table: self.table.clone(),
                column: self.columns[column].name.clone(),
            });
        }
        *cell = value;
        if target.state == RowState::Clean {
            target.state = RowState::Modified;
        }
        Ok(())
    }

    /// Remove the given visible rows. Stored rows are deleted from the store
    /// right away; staged inserts are just dropped. Indices are handled from
    /// the highest down so earlier removals never shift later ones, and the
    /// whole set is range-checked before anything is touched. A stored row
    /// that no longer matches anything in the store stops the deletion with
    /// `StoreError::Delete` and stays in the grid.
    pub fn delete_rows<I>(&mut self, store: &Store, rows: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = usize>,
    {
        let targets: BTreeSet<usize> = rows.into_iter().collect();
        if let Some(&row) = targets.iter().find(|&&row| row >= self.rows.len()) {
            return Err(StoreError::RowOutOfRange {
                row,
                len: self.rows.len(),
            });
        }

        let sql = format!("DELETE FROM {} WHERE rowid = ?1", quote_ident(&self.table));
        let mut removed = 0;
        for &index in targets.iter().rev() {
            if let Some(rowid) = self.rows[index].rowid {
                let deleted = store
                    .conn()
                    .execute(&sql, params![rowid])
                    .map_err(|source| StoreError::Delete {
                        table: self.table.clone(),
                        row: index,
                        source,
                    })?;
                if deleted == 0 {
                    return Err(StoreError::Delete {
                        table: self.table.clone(),
                        row: index,
                        source: rusqlite::Error::QueryReturnedNoRows,
                    });
                }
            }
            self.rows.remove(index);
            removed += 1;
        }

        info!(table = %self.table, removed, "deleted rows");
        Ok(removed)
    }

    /// Write every staged insert and update. Each row is attempted even when an
    /// earlier one fails; rows that made it stay written. The first failure is
    /// reported and the failed rows stay staged. After a clean batch the table
    /// is re-read so store-assigned keys and defaults show up.
    pub fn commit(&mut self, store: &Store) -> Result<CommitReport, StoreError> {
        let conn = store.conn();
        let mut report = CommitReport::default();
        let mut first_failure = None;

        for (index, row) in self.rows.iter_mut().enumerate() {
            let result = match row.state {
                RowState::Clean => continue,
                RowState::Inserted => write_insert(conn, &self.table, &self.columns, &row.values),
                RowState::Modified => match row.rowid {
                    Some(rowid) => {
                        write_update(conn, &self.table, &self.columns, rowid, &row.values).map(
                            |()| key_after_update(&self.columns, &row.values).unwrap_or(rowid),
                        )
                    }
                    None => continue,
                },
            };

            match result {
                Ok(rowid) => {
                    if row.state == RowState::Inserted {
                        report.inserted.push(rowid);
                    }
                    row.rowid = Some(rowid);
                    row.state = RowState::Clean;
                    report.written += 1;
                }
                Err(source) => {
                    warn!(table = %self.table, row = index, error = %source, "row write failed");
                    if first_failure.is_none() {
                        first_failure = Some((index, source));
                    }
                }
            }
        }

        if let Some((row, source)) = first_failure {
            return Err(StoreError::Commit {
                table: self.table.clone(),
                row,
                source,
            });
        }

        info!(table = %self.table, written = report.written, "committed staged rows");
        self.refresh(store)?;
        Ok(report)
    }

    /// Drop a staged insert that never reached the store. Rows in any other
    /// state are left alone; returns whether a row was dropped.
    pub(crate) fn discard_staged(&mut self, index: usize) -> bool {
        match self.rows.get(index) {
            Some(row) if row.state == RowState::Inserted => {
                self.rows.remove(index);
                true
            }
            _ => false,
        }
    }
}

fn write_insert(
    conn: &Connection,
    table: &str,
    columns: &[ColumnDescriptor],
    values: &[String],
) -> rusqlite::Result<i64> {
    let names = columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_ident(table)
    );

    // An empty rowid alias lets SQLite pick the key.
    let params = columns.iter().zip(values).map(|(column, value)| {
        if column.rowid_alias && value.trim().is_empty() {
            Value::Null
        } else {
            Value::Text(value.clone())
        }
    });
    conn.execute(&sql, params_from_iter(params))?;
    Ok(conn.last_insert_rowid())
}

/// A table that was found but could not be read is still a schema problem
/// at bind time.
fn read_failure(table: &str, err: StoreError) -> StoreError {
    match err {
        StoreError::Sql(source) => StoreError::Schema {
            table: table.to_string(),
            source: Some(source),
        },
        other => other,
    }
}

/// The rowid a row carries after an update: the value written to its rowid
/// alias column, when the table has one.
fn key_after_update(columns: &[ColumnDescriptor], values: &[String]) -> Option<i64> {
    columns
        .iter()
        .zip(values)
        .find(|(column, _)| column.rowid_alias)
        .and_then(|(_, value)| value.trim().parse().ok())
}

fn write_update(
    conn: &Connection,
    table: &str,
    columns: &[ColumnDescriptor],
    rowid: i64,
    values: &[String],
) -> rusqlite::Result<()> {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{} = ?{}", quote_ident(&column.name), idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {assignments} WHERE rowid = ?{}",
        quote_ident(table),
        columns.len() + 1
    );

    let mut params: Vec<Value> = values.iter().cloned().map(Value::Text).collect();
    params.push(Value::Integer(rowid));
    let updated = conn.execute(&sql, params_from_iter(params))?;
    if updated == 0 {
        Err(rusqlite::Error::QueryReturnedNoRows)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "CREATE TABLE flowers (
                     id INTEGER PRIMARY KEY,
                     name TEXT NOT NULL UNIQUE,
                     price REAL
                 );
                 INSERT INTO flowers (name, price) VALUES
                     ('rose', 2.5), ('tulip', 1.0), ('lily', 3.0), ('iris', 1.5);",
            )
            .unwrap();
        store
    }

    fn names(binding: &TableBinding) -> Vec<String> {
        binding.rows().iter().map(|row| row.values[1].clone()).collect()
    }

    fn stored_names(store: &Store) -> Vec<String> {
        let mut fresh = TableBinding::bind(store, "flowers").unwrap();
        fresh.refresh(store).unwrap();
        names(&fresh)
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn bind_reads_columns_and_rows() {
        let store = store();
        let binding = TableBinding::bind(&store, "flowers").unwrap();
        assert_eq!(binding.name(), "flowers");
        assert_eq!(binding.columns().len(), 3);
        assert_eq!(names(&binding), ["rose", "tulip", "lily", "iris"]);
        assert!(!binding.has_pending_changes());
    }

    #[test]
    fn bind_unknown_table_fails() {
        let store = store();
        let err = TableBinding::bind(&store, "orders").unwrap_err();
        assert!(matches!(err, StoreError::Schema { .. }));
    }

    #[test]
    fn committed_insert_is_visible_to_next_read() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        binding.insert_row(row(&["", "peony", "4.25"])).unwrap();

        let report = binding.commit(&store).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.inserted, [5]);

        let fresh = TableBinding::bind(&store, "flowers").unwrap();
        assert_eq!(fresh.row(4).unwrap().values, ["5", "peony", "4.25"]);
        assert_eq!(binding.position_of(5), Some(4));
    }

    #[test]
    fn insert_requires_one_value_per_column() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        let err = binding.insert_row(row(&["peony"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ColumnCount {
                expected: 3,
                actual: 1
            }
        );
        assert_eq!(binding.row_count(), 4);
    }

    #[test]
    fn refresh_discards_uncommitted_insert() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        binding.insert_row(row(&["", "peony", "4"])).unwrap();
        binding.set_value(0, 1, "red rose".into()).unwrap();
        assert_eq!(binding.row_count(), 5);
        assert!(binding.has_pending_changes());

        binding.refresh(&store).unwrap();
        assert_eq!(names(&binding), ["rose", "tulip", "lily", "iris"]);
        assert!(!binding.has_pending_changes());

        binding.refresh(&store).unwrap();
        assert_eq!(names(&binding), ["rose", "tulip", "lily", "iris"]);
    }

    #[test]
    fn delete_removes_exactly_the_requested_rows_in_any_order() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();

        let removed = binding.delete_rows(&store, [0, 3, 2]).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(names(&binding), ["tulip"]);
        assert_eq!(stored_names(&store), ["tulip"]);
    }

    #[test]
    fn delete_ignores_duplicate_indices() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();

        let removed = binding.delete_rows(&store, vec![1, 1, 1]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(stored_names(&store), ["rose", "lily", "iris"]);
    }

    #[test]
    fn delete_out_of_range_touches_nothing() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();

        let err = binding.delete_rows(&store, [0, 9]).unwrap_err();
        assert!(matches!(err, StoreError::RowOutOfRange { row: 9, len: 4 }));
        assert_eq!(stored_names(&store).len(), 4);
    }

    #[test]
    fn deleting_a_staged_row_never_reaches_the_store() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        binding.insert_row(row(&["", "peony", "4"])).unwrap();

        binding.delete_rows(&store, [4]).unwrap();
        assert!(!binding.has_pending_changes());
        assert_eq!(stored_names(&store), ["rose", "tulip", "lily", "iris"]);
    }

    #[test]
    fn staged_update_is_written_on_commit() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        binding.set_value(1, 2, "1.75".into()).unwrap();
        assert_eq!(binding.row(1).unwrap().state, RowState::Modified);

        binding.commit(&store).unwrap();
        let fresh = TableBinding::bind(&store, "flowers").unwrap();
        assert_eq!(fresh.row(1).unwrap().values[2], "1.75");
    }

    #[test]
    fn set_value_checks_bounds() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        assert!(matches!(
            binding.set_value(10, 0, "x".into()),
            Err(StoreError::RowOutOfRange { row: 10, len: 4 })
        ));
        assert!(matches!(
            binding.set_value(0, 5, "x".into()),
            Err(StoreError::ColumnOutOfRange { column: 5, len: 3 })
        ));
    }

    #[test]
    fn failed_row_does_not_roll_back_the_rest_of_the_batch() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        binding.insert_row(row(&["", "rose", "9"])).unwrap();
        binding.insert_row(row(&["", "peony", "4"])).unwrap();

        let err = binding.commit(&store).unwrap_err();
        match err {
            StoreError::Commit { table, row, .. } => {
                assert_eq!(table, "flowers");
                assert_eq!(row, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(binding.row(4).unwrap().state, RowState::Inserted);
        assert_eq!(binding.row(5).unwrap().state, RowState::Clean);
        assert_eq!(
            stored_names(&store),
            ["rose", "tulip", "lily", "iris", "peony"]
        );
    }

    #[test]
    fn discard_staged_only_drops_inserts() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        let index = binding.insert_row(row(&["", "peony", "4"])).unwrap();

        assert!(!binding.discard_staged(0));
        assert!(binding.discard_staged(index));
        assert_eq!(binding.row_count(), 4);
    }

    #[test]
    fn column_lookup_ignores_case() {
        let store = store();
        let binding = TableBinding::bind(&store, "flowers").unwrap();
        assert_eq!(binding.column_index("NAME"), Some(1));
        assert_eq!(binding.column_index("password"), None);
    }

    #[test]
    fn row_follows_its_new_key_after_a_failed_batch() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        binding.set_value(0, 0, "10".into()).unwrap();
        binding.insert_row(row(&["", "tulip", "1"])).unwrap();

        let err = binding.commit(&store).unwrap_err();
        assert!(matches!(err, StoreError::Commit { row: 4, .. }));
        assert_eq!(binding.row(0).unwrap().rowid, Some(10));
        assert_eq!(binding.row(0).unwrap().state, RowState::Clean);

        assert_eq!(binding.delete_rows(&store, [0]).unwrap(), 1);
        assert_eq!(stored_names(&store), ["tulip", "lily", "iris"]);
    }

    #[test]
    fn deleting_a_row_missing_from_the_store_fails() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();
        store
            .conn()
            .execute("DELETE FROM flowers WHERE id = 1", [])
            .unwrap();

        let err = binding.delete_rows(&store, [0]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Delete {
                row: 0,
                source: rusqlite::Error::QueryReturnedNoRows,
                ..
            }
        ));
        assert_eq!(names(&binding), ["rose", "tulip", "lily", "iris"]);
    }

    #[test]
    fn stored_key_cannot_be_cleared() {
        let store = store();
        let mut binding = TableBinding::bind(&store, "flowers").unwrap();

        let err = binding.set_value(0, 0, " ".into()).unwrap_err();
        assert!(matches!(err, StoreError::KeyRequired { ref column, .. } if column == "id"));
        assert!(!binding.has_pending_changes());

        let index = binding.insert_row(row(&["7", "peony", "4"])).unwrap();
        binding.set_value(index, 0, String::new()).unwrap();
        binding.commit(&store).unwrap();
        assert_eq!(binding.row(4).unwrap().values, ["5", "peony", "4"]);
    }

    #[test]
    fn read_failure_is_reported_as_schema_error() {
        let err = read_failure("flowers", StoreError::Sql(rusqlite::Error::InvalidQuery));
        assert!(matches!(
            err,
            StoreError::Schema { ref table, source: Some(_) } if table == "flowers"
        ));

        let err = read_failure("flowers", StoreError::RowOutOfRange { row: 1, len: 0 });
        assert!(matches!(err, StoreError::RowOutOfRange { .. }));
    }
}
