//! Sequence reconciliation.
//!
//! Explicit values written into sequence-backed columns do not advance the
//! sequence. After the batch has run, each touched sequence is moved to the
//! column's current maximum so later ordinary inserts do not collide.

use crate::codec::{format_sql_string, qualified_name, quote_identifier, SqlDialect};
use crate::schema::{Model, ScalarField};

/// Statement resetting one sequence from its bound column, or `None` when
/// the dialect keeps its counters in step on its own.
///
/// `ordinal` keeps SQL Server variable names unique within one batch.
pub fn sequence_fix(
    dialect: SqlDialect,
    model: &Model,
    field: &ScalarField,
    ordinal: usize,
) -> Option<String> {
    let sequence = field.sequence.as_ref()?;
    let sequence_schema = sequence.schema.as_deref().or(model.schema.as_deref());
    let table = qualified_name(dialect, model.schema.as_deref(), &model.table);
    let column = quote_identifier(dialect, &field.column);

    match dialect {
        SqlDialect::Postgres => {
            let name = qualified_name(dialect, sequence_schema, &sequence.identifier);
            Some(format!(
                "SELECT setval({}, COALESCE(MAX({}), 1), MAX({}) IS NOT NULL) FROM {}",
                format_sql_string(dialect, &name),
                column,
                column,
                table
            ))
        }
        SqlDialect::Mssql => {
            let name = qualified_name(dialect, sequence_schema, &sequence.identifier);
            let var = format!("@seq_next_{}", ordinal);
            Some(format!(
                "DECLARE {var} BIGINT = (SELECT COALESCE(MAX({column}), 0) + 1 FROM {table}); \
                 EXEC(N'ALTER SEQUENCE {seq} RESTART WITH ' + CAST({var} AS NVARCHAR(20)))",
                var = var,
                column = column,
                table = table,
                seq = name.replace('\'', "''"),
            ))
        }
        // AUTO_INCREMENT and SQLite rowids advance past explicit values.
        SqlDialect::MySql | SqlDialect::Sqlite => None,
    }
}

/// Sequence fixes for every sequence-backed field of the given models.
pub fn reconcile<'a>(
    dialect: SqlDialect,
    models: impl IntoIterator<Item = &'a Model>,
) -> Vec<String> {
    let mut statements = Vec::new();
    for model in models {
        for field in model.scalars() {
            if let Some(stmt) = sequence_fix(dialect, model, field, statements.len()) {
                statements.push(stmt);
            }
        }
    }
    statements
}
