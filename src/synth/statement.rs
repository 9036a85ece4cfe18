//! INSERT and patch UPDATE rendering for a single row.

use crate::codec::{qualified_name, quote_identifier, render_value, SqlDialect, SqlLiteral, Value};
use crate::schema::{Model, ScalarField};
use crate::store::Row;

/// Value of a scalar field in a row, looked up by field name and then by
/// column name. `None` if absent, `Some(None)` if explicitly null.
pub(crate) fn field_value<'r>(row: &'r Row, field: &ScalarField) -> Option<Option<&'r Value>> {
    row.get(&field.name).or_else(|| row.get(&field.column))
}

/// Render the INSERT for one row.
///
/// `deferred` lists columns written as NULL now and patched later.
pub(crate) fn render_insert(
    dialect: SqlDialect,
    model: &Model,
    row: &Row,
    deferred: &[&str],
) -> String {
    let mut columns: Vec<String> = Vec::new();
    let mut values: Vec<SqlLiteral> = Vec::new();
    let mut overrides_identity = false;

    for field in model.scalars() {
        // Generated non-id columns are computed by the database.
        if field.is_generated && !field.is_id {
            continue;
        }

        let literal = if deferred.contains(&field.column.as_str()) {
            SqlLiteral::null()
        } else {
            match field_value(row, field) {
                None if field.has_default || field.is_generated => SqlLiteral::Default,
                None => SqlLiteral::null(),
                Some(value) => {
                    if field.is_id && field.is_generated && value.is_some() {
                        overrides_identity = true;
                    }
                    SqlLiteral::Rendered(render_value(dialect, &field.field_type, value))
                }
            }
        };

        // SQLite has no DEFAULT keyword in VALUES; leave the column out.
        if literal.is_default() && !dialect.supports_default_keyword() {
            continue;
        }

        columns.push(quote_identifier(dialect, &field.column));
        values.push(literal);
    }

    let table = qualified_name(dialect, model.schema.as_deref(), &model.table);

    if columns.is_empty() {
        return match dialect {
            SqlDialect::MySql => format!("INSERT INTO {} () VALUES ()", table),
            _ => format!("INSERT INTO {} DEFAULT VALUES", table),
        };
    }

    let values_sql: Vec<&str> = values.iter().map(SqlLiteral::as_sql).collect();
    let column_list = columns.join(", ");
    let value_list = values_sql.join(", ");

    match (dialect, overrides_identity) {
        (SqlDialect::Postgres, true) => format!(
            "INSERT INTO {} ({}) OVERRIDING SYSTEM VALUE VALUES ({})",
            table, column_list, value_list
        ),
        (SqlDialect::Mssql, true) => format!(
            "SET IDENTITY_INSERT {table} ON; INSERT INTO {table} ({}) VALUES ({}); SET IDENTITY_INSERT {table} OFF",
            column_list,
            value_list,
            table = table
        ),
        _ => format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table, column_list, value_list
        ),
    }
}

/// Render the patch UPDATE restoring deferred columns, filtered by the
/// row's id values. Returns `None` when the row has no usable id.
pub(crate) fn render_patch(
    dialect: SqlDialect,
    model: &Model,
    row: &Row,
    deferred: &[&str],
) -> Option<String> {
    let mut filter = Vec::new();
    for field in model.id_fields() {
        let value = field_value(row, field).flatten()?;
        filter.push(format!(
            "{} = {}",
            quote_identifier(dialect, &field.column),
            render_value(dialect, &field.field_type, Some(value))
        ));
    }
    if filter.is_empty() {
        return None;
    }

    let assignments: Vec<String> = deferred
        .iter()
        .filter_map(|column| model.scalar_by_column(column))
        .map(|field| {
            format!(
                "{} = {}",
                quote_identifier(dialect, &field.column),
                render_value(
                    dialect,
                    &field.field_type,
                    field_value(row, field).flatten()
                )
            )
        })
        .collect();
    if assignments.is_empty() {
        return None;
    }

    Some(format!(
        "UPDATE {} SET {} WHERE {}",
        qualified_name(dialect, model.schema.as_deref(), &model.table),
        assignments.join(", "),
        filter.join(" AND ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn order() -> Model {
        Model::new("order")
            .in_schema("public")
            .field(ScalarField::new("id", FieldType::Int).identity("order_id_seq"))
            .field(ScalarField::new("customer_id", FieldType::Int).not_null())
            .field(
                ScalarField::new("quantity", FieldType::Int)
                    .not_null()
                    .with_default(),
            )
            .field(ScalarField::new("note", FieldType::Text))
            .field(ScalarField::new("total", FieldType::Decimal).generated())
    }

    #[test]
    fn test_insert_defaults_and_nulls() {
        let row = Row::new().set("customer_id", 2);
        let sql = render_insert(SqlDialect::Postgres, &order(), &row, &[]);
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"order\" (\"id\", \"customer_id\", \"quantity\", \"note\") VALUES (DEFAULT, 2, DEFAULT, NULL)"
        );
    }

    #[test]
    fn test_insert_override_identity_postgres() {
        let row = Row::new().set("id", 7).set("customer_id", 1).set("quantity", 3);
        let sql = render_insert(SqlDialect::Postgres, &order(), &row, &[]);
        assert!(sql.contains("OVERRIDING SYSTEM VALUE VALUES (7, 1, 3, NULL)"));
    }

    #[test]
    fn test_insert_override_identity_mssql() {
        let row = Row::new().set("id", 7).set("customer_id", 1);
        let sql = render_insert(SqlDialect::Mssql, &order(), &row, &[]);
        assert!(sql.starts_with("SET IDENTITY_INSERT [public].[order] ON; INSERT INTO"));
        assert!(sql.ends_with("SET IDENTITY_INSERT [public].[order] OFF"));
    }

    #[test]
    fn test_insert_sqlite_omits_defaults() {
        let row = Row::new().set("customer_id", 2);
        let sql = render_insert(SqlDialect::Sqlite, &order(), &row, &[]);
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"order\" (\"customer_id\", \"note\") VALUES (2, NULL)"
        );
    }

    #[test]
    fn test_insert_deferred_column_is_null() {
        let row = Row::new().set("id", 1).set("customer_id", 9);
        let sql = render_insert(SqlDialect::MySql, &order(), &row, &["customer_id"]);
        assert!(sql.contains("VALUES (1, NULL, DEFAULT, NULL)"));
    }

    #[test]
    fn test_insert_all_defaults() {
        let model = Model::new("tick")
            .field(ScalarField::new("id", FieldType::Int).identity("tick_id_seq"));
        assert_eq!(
            render_insert(SqlDialect::Sqlite, &model, &Row::new(), &[]),
            "INSERT INTO \"tick\" DEFAULT VALUES"
        );
        assert_eq!(
            render_insert(SqlDialect::Postgres, &model, &Row::new(), &[]),
            "INSERT INTO \"tick\" (\"id\") VALUES (DEFAULT)"
        );
    }

    #[test]
    fn test_patch_targets_id() {
        let row = Row::new().set("id", 1).set("customer_id", 9);
        let sql = render_patch(SqlDialect::Postgres, &order(), &row, &["customer_id"]).unwrap();
        assert_eq!(
            sql,
            "UPDATE \"public\".\"order\" SET \"customer_id\" = 9 WHERE \"id\" = 1"
        );
    }

    #[test]
    fn test_patch_without_id_value() {
        let row = Row::new().set("customer_id", 9);
        assert!(render_patch(SqlDialect::Postgres, &order(), &row, &["customer_id"]).is_none());
    }
}
