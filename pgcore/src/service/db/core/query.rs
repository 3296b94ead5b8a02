//! Query construction
//!
//! Pure functions that assemble SQL text and an ordered parameter vector
//! from structured inputs. Nothing in this module touches the database.
//!
//! Table names, column names, ORDER BY text, and DDL type strings are
//! interpolated into the SQL unescaped. They are trusted caller input;
//! this layer makes no attempt to sanitize identifiers.

use crate::service::db::core::types::{
    BuiltQuery, ColumnSpec, Condition, QueryParams, SelectOptions,
};
use crate::tool::error::AppError;

/// Rewrites legacy `%s` placeholders into positional `$N` syntax.
///
/// Walks the clause once, left to right. Occurrences inside single-quoted
/// literals (with `''` escapes) or double-quoted identifiers are copied
/// through untouched. Numbering starts at `start + 1`, so a caller that has
/// already emitted `start` placeholders gets a contiguous sequence.
///
/// Returns the rewritten clause and the number of placeholders rewritten.
pub fn rewrite_placeholders(clause: &str, start: usize) -> (String, usize) {
    enum Mode {
        Normal,
        SingleQuoted,
        DoubleQuoted,
    }

    let mut out = String::with_capacity(clause.len() + 8);
    let mut count = 0usize;
    let mut mode = Mode::Normal;
    let mut chars = clause.chars().peekable();

    while let Some(c) = chars.next() {
        match mode {
            Mode::Normal => match c {
                '%' if chars.peek() == Some(&'s') => {
                    chars.next();
                    count += 1;
                    out.push('$');
                    out.push_str(&(start + count).to_string());
                }
                '\'' => {
                    mode = Mode::SingleQuoted;
                    out.push(c);
                }
                '"' => {
                    mode = Mode::DoubleQuoted;
                    out.push(c);
                }
                _ => out.push(c),
            },
            Mode::SingleQuoted => {
                out.push(c);
                if c == '\'' {
                    // '' is an escaped quote, not the end of the literal
                    if chars.peek() == Some(&'\'') {
                        out.push('\'');
                        chars.next();
                    } else {
                        mode = Mode::Normal;
                    }
                }
            }
            Mode::DoubleQuoted => {
                out.push(c);
                if c == '"' {
                    mode = Mode::Normal;
                }
            }
        }
    }

    (out, count)
}

/// Rewrites a condition clause and verifies that the placeholder count
/// matches the number of supplied parameters.
fn rewrite_condition(condition: &Condition, start: usize) -> Result<String, AppError> {
    let (clause, count) = rewrite_placeholders(&condition.clause, start);
    if count != condition.params.len() {
        return Err(AppError::InvalidInput(format!(
            "condition '{}' has {} placeholder(s) but {} parameter(s)",
            condition.clause,
            count,
            condition.params.len()
        )));
    }
    Ok(clause)
}

/// Builds a filtered SELECT.
///
/// An empty or absent projection selects `*`. WHERE placeholders are
/// numbered from `$1`. A positive limit appends a LIMIT clause; `None`
/// leaves the result set unbounded.
pub fn build_select(table: &str, options: &SelectOptions) -> Result<BuiltQuery, AppError> {
    let cols = match options.columns.as_deref() {
        Some(cols) if !cols.is_empty() => cols.join(", "),
        _ => "*".to_string(),
    };

    let mut sql = format!("SELECT {} FROM {}", cols, table);
    let mut params = Vec::new();

    if let Some(condition) = &options.condition {
        let clause = rewrite_condition(condition, 0)?;
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
        params.extend(condition.params.iter().cloned());
    }

    if let Some(order_by) = options.order_by.as_deref() {
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
    }

    if let Some(limit) = options.limit {
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
    }

    Ok(BuiltQuery { sql, params })
}

/// Builds `INSERT ... RETURNING *`.
///
/// Placeholders are numbered `$1..$N` following the iteration order of the
/// data map, which is also the order of the parameter vector.
pub fn build_insert(table: &str, data: &QueryParams) -> Result<BuiltQuery, AppError> {
    if data.is_empty() {
        return Err(AppError::InvalidInput("INSERT data is empty".to_string()));
    }

    let columns: Vec<&str> = data.keys().map(String::as_str).collect();
    let placeholders: Vec<String> = (1..=data.len()).map(|i| format!("${}", i)).collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );

    Ok(BuiltQuery {
        sql,
        params: data.values().cloned().collect(),
    })
}

/// Builds `UPDATE ... SET ... WHERE ... RETURNING *`.
///
/// SET placeholders take `$1..$N` over the data map; condition placeholders
/// continue from `$N+1`. The parameter vector is the data values followed by
/// the condition parameters, matching that numbering exactly.
pub fn build_update(
    table: &str,
    data: &QueryParams,
    condition: &Condition,
) -> Result<BuiltQuery, AppError> {
    if data.is_empty() {
        return Err(AppError::InvalidInput("UPDATE data is empty".to_string()));
    }

    let set_clauses: Vec<String> = data
        .keys()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect();

    let clause = rewrite_condition(condition, data.len())?;

    let sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING *",
        table,
        set_clauses.join(", "),
        clause
    );

    let mut params: Vec<serde_json::Value> = data.values().cloned().collect();
    params.extend(condition.params.iter().cloned());

    Ok(BuiltQuery { sql, params })
}

/// Builds `DELETE ... WHERE ... RETURNING *`.
///
/// Condition placeholders are numbered from `$1`; the parameter vector is
/// the condition parameters unchanged.
pub fn build_delete(table: &str, condition: &Condition) -> Result<BuiltQuery, AppError> {
    let clause = rewrite_condition(condition, 0)?;
    let sql = format!("DELETE FROM {} WHERE {} RETURNING *", table, clause);

    Ok(BuiltQuery {
        sql,
        params: condition.params.clone(),
    })
}

/// Builds CREATE TABLE DDL by verbatim interpolation of names and types.
pub fn build_create_table(table: &str, columns: &[ColumnSpec]) -> String {
    let column_defs: Vec<String> = columns
        .iter()
        .map(|column| format!("{} {}", column.name, column.sql_type))
        .collect();

    format!("CREATE TABLE {} ({})", table, column_defs.join(", "))
}

/// Builds DROP TABLE DDL.
pub fn build_drop_table(table: &str) -> String {
    format!("DROP TABLE {}", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_map(value: serde_json::Value) -> QueryParams {
        value.as_object().unwrap().clone()
    }

    fn condition(clause: &str, params: Vec<serde_json::Value>) -> Condition {
        Condition {
            clause: clause.to_string(),
            params,
        }
    }

    // === Placeholder rewriting ===

    #[test]
    fn rewrites_placeholders_from_one() {
        let (clause, count) = rewrite_placeholders("id = %s", 0);
        assert_eq!(clause, "id = $1");
        assert_eq!(count, 1);
    }

    #[test]
    fn rewrites_placeholders_left_to_right_with_offset() {
        let (clause, count) = rewrite_placeholders("status = %s AND age > %s", 2);
        assert_eq!(clause, "status = $3 AND age > $4");
        assert_eq!(count, 2);
    }

    #[test]
    fn ignores_placeholders_inside_string_literals() {
        let (clause, count) = rewrite_placeholders("note = '100%s off' AND id = %s", 0);
        assert_eq!(clause, "note = '100%s off' AND id = $1");
        assert_eq!(count, 1);
    }

    #[test]
    fn handles_escaped_quotes_inside_literals() {
        let (clause, count) = rewrite_placeholders("tag = 'it''s %s here' AND id = %s", 0);
        assert_eq!(clause, "tag = 'it''s %s here' AND id = $1");
        assert_eq!(count, 1);
    }

    #[test]
    fn ignores_placeholders_inside_quoted_identifiers() {
        let (clause, count) = rewrite_placeholders(r#""odd%scol" = %s"#, 0);
        assert_eq!(clause, r#""odd%scol" = $1"#);
        assert_eq!(count, 1);
    }

    #[test]
    fn clause_without_placeholders_passes_through() {
        let (clause, count) = rewrite_placeholders("deleted_at IS NULL", 0);
        assert_eq!(clause, "deleted_at IS NULL");
        assert_eq!(count, 0);
    }

    // === Select ===

    #[test]
    fn select_defaults_to_star_and_the_row_cap() {
        let built = build_select("users", &SelectOptions::default()).unwrap();
        assert_eq!(built.sql, "SELECT * FROM users LIMIT 100");
        assert!(built.params.is_empty());
    }

    #[test]
    fn select_with_explicit_none_limit_is_unbounded() {
        let options = SelectOptions {
            limit: None,
            ..SelectOptions::default()
        };
        let built = build_select("users", &options).unwrap();
        assert_eq!(built.sql, "SELECT * FROM users");
    }

    #[test]
    fn select_joins_projection_verbatim() {
        let options = SelectOptions {
            columns: Some(vec!["id".to_string(), "name".to_string()]),
            ..SelectOptions::default()
        };
        let built = build_select("users", &options).unwrap();
        assert_eq!(built.sql, "SELECT id, name FROM users LIMIT 100");
    }

    #[test]
    fn select_with_empty_projection_selects_star() {
        let options = SelectOptions {
            columns: Some(Vec::new()),
            limit: None,
            ..SelectOptions::default()
        };
        let built = build_select("users", &options).unwrap();
        assert_eq!(built.sql, "SELECT * FROM users");
    }

    #[test]
    fn select_condition_placeholders_start_at_one() {
        let options = SelectOptions {
            condition: Some(condition("status = %s AND age > %s", vec![json!("active"), json!(21)])),
            order_by: Some("created_at DESC".to_string()),
            limit: Some(10),
            ..SelectOptions::default()
        };
        let built = build_select("users", &options).unwrap();
        assert_eq!(
            built.sql,
            "SELECT * FROM users WHERE status = $1 AND age > $2 ORDER BY created_at DESC LIMIT 10"
        );
        assert_eq!(built.params, vec![json!("active"), json!(21)]);
    }

    #[test]
    fn select_accepts_a_zero_placeholder_condition() {
        let options = SelectOptions {
            condition: Some(condition("deleted_at IS NULL", Vec::new())),
            limit: None,
            ..SelectOptions::default()
        };
        let built = build_select("users", &options).unwrap();
        assert_eq!(built.sql, "SELECT * FROM users WHERE deleted_at IS NULL");
        assert!(built.params.is_empty());
    }

    #[test]
    fn select_rejects_a_parameter_count_mismatch() {
        let options = SelectOptions {
            condition: Some(condition("id = %s", vec![json!(1), json!(2)])),
            ..SelectOptions::default()
        };
        let err = build_select("users", &options).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    // === Insert ===

    #[test]
    fn insert_numbers_placeholders_in_data_order() {
        let data = data_map(json!({"name": "a", "age": 3}));
        let built = build_insert("users", &data).unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO users (name, age) VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(built.params, vec![json!("a"), json!(3)]);
    }

    #[test]
    fn insert_rejects_empty_data() {
        let err = build_insert("users", &QueryParams::new()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    // === Update ===

    #[test]
    fn update_numbers_set_first_then_condition() {
        let data = data_map(json!({"name": "b", "age": 4}));
        let built = build_update(
            "users",
            &data,
            &condition("id = %s AND status = %s", vec![json!(7), json!("active")]),
        )
        .unwrap();
        assert_eq!(
            built.sql,
            "UPDATE users SET name = $1, age = $2 WHERE id = $3 AND status = $4 RETURNING *"
        );
        assert_eq!(
            built.params,
            vec![json!("b"), json!(4), json!(7), json!("active")]
        );
    }

    #[test]
    fn update_parameter_vector_is_data_then_condition() {
        // One SET entry, so the condition placeholder renumbers to $2.
        let data = data_map(json!({"age": 30}));
        let built = build_update("users", &data, &condition("id = %s", vec![json!(5)])).unwrap();
        assert_eq!(built.sql, "UPDATE users SET age = $1 WHERE id = $2 RETURNING *");
        assert_eq!(built.params, vec![json!(30), json!(5)]);
    }

    #[test]
    fn update_rejects_empty_data() {
        let err = build_update(
            "users",
            &QueryParams::new(),
            &condition("id = %s", vec![json!(1)]),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn update_rejects_a_parameter_count_mismatch() {
        let data = data_map(json!({"age": 30}));
        let err = build_update("users", &data, &condition("id = %s", Vec::new())).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    // === Delete ===

    #[test]
    fn delete_condition_placeholders_start_at_one() {
        let built = build_delete("users", &condition("id = %s", vec![json!(9)])).unwrap();
        assert_eq!(built.sql, "DELETE FROM users WHERE id = $1 RETURNING *");
        assert_eq!(built.params, vec![json!(9)]);
    }

    // === DDL ===

    #[test]
    fn create_table_interpolates_columns_verbatim() {
        let columns = vec![
            ColumnSpec {
                name: "id".to_string(),
                sql_type: "SERIAL PRIMARY KEY".to_string(),
            },
            ColumnSpec {
                name: "title".to_string(),
                sql_type: "VARCHAR(255) NOT NULL".to_string(),
            },
        ];
        assert_eq!(
            build_create_table("posts", &columns),
            "CREATE TABLE posts (id SERIAL PRIMARY KEY, title VARCHAR(255) NOT NULL)"
        );
    }

    #[test]
    fn drop_table_names_the_table() {
        assert_eq!(build_drop_table("posts"), "DROP TABLE posts");
    }
}
