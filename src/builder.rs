use regex::{Captures, Regex};

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::value::Param;

/// SQL text together with the parameters bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

/// Rewrites a leading `select *` into the given column list.
///
/// The rest of the query is kept as is. Queries that do not start with
/// `select *` (ignoring ASCII case) are only trimmed.
///
/// # Examples
///
/// ```
/// use sqlx_dbutils::builder::expand_select_star;
///
/// let sql = expand_select_star("  SELECT * FROM users WHERE id = $1", ["id", "name"]);
/// assert_eq!(sql, "SELECT id, name FROM users WHERE id = $1");
/// ```
pub fn expand_select_star<'a, I>(sql: &str, columns: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let sql = sql.trim();
    match sql.get(..8) {
        Some(head) if head.eq_ignore_ascii_case("select *") => {
            let columns: Vec<&str> = columns.into_iter().collect();
            format!("{}{}{}", &sql[..7], columns.join(", "), &sql[8..])
        }
        _ => sql.to_owned(),
    }
}

/// Adds `offset` to the number of every placeholder of `dialect` in `sql`.
///
/// # Examples
///
/// ```
/// use sqlx_dbutils::{builder::offset_placeholders, Dialect};
///
/// let sql = offset_placeholders("WHERE id = $1 AND owner = $2", 3, Dialect::Postgres)?;
/// assert_eq!(sql, "WHERE id = $4 AND owner = $5");
/// # Ok::<(), sqlx_dbutils::Error>(())
/// ```
pub fn offset_placeholders(sql: &str, offset: usize, dialect: Dialect) -> Result<String> {
    let prefix = dialect.arg_prefix();
    let regex = Regex::new(&format!(r"{}(\d+)", regex::escape(prefix)))?;
    let replaced = regex.replace_all(sql, |caps: &Captures| match caps[1].parse::<usize>() {
        Ok(n) => dialect.placeholder(n + offset),
        Err(_) => caps[0].to_owned(),
    });
    Ok(replaced.into_owned())
}

/// `INSERT INTO <table>(<columns>) VALUES(<placeholders>)`
pub fn insert_statement(
    table: &str,
    columns: Vec<(String, Param)>,
    dialect: Dialect,
) -> Result<Statement> {
    if columns.is_empty() {
        return Err(Error::NoColumns(table.to_owned()));
    }
    let (names, params): (Vec<String>, Vec<Param>) = columns.into_iter().unzip();
    let placeholders: Vec<String> = (1..=names.len()).map(|n| dialect.placeholder(n)).collect();
    let sql = format!(
        "INSERT INTO {}({}) VALUES({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    );
    Ok(Statement { sql, params })
}

/// `UPDATE <table> SET <column>=<placeholder>, ... <where_clause>`
///
/// Placeholders in `where_clause` are numbered from 1 and shifted past the
/// SET arguments. `where_params` follow the SET parameters.
pub fn update_statement(
    table: &str,
    columns: Vec<(String, Param)>,
    dialect: Dialect,
    where_clause: &str,
    where_params: &[Param],
) -> Result<Statement> {
    if columns.is_empty() {
        return Err(Error::NoColumns(table.to_owned()));
    }
    let set_count = columns.len();
    let mut sets = Vec::with_capacity(set_count);
    let mut params = Vec::with_capacity(set_count + where_params.len());
    for (n, (column, param)) in columns.into_iter().enumerate() {
        sets.push(format!("{}={}", column, dialect.placeholder(n + 1)));
        params.push(param);
    }
    params.extend_from_slice(where_params);

    let mut sql = format!("UPDATE {} SET {}", table, sets.join(", "));
    let where_clause = offset_placeholders(where_clause.trim(), set_count, dialect)?;
    if !where_clause.is_empty() {
        sql.push(' ');
        sql.push_str(&where_clause);
    }
    Ok(Statement { sql, params })
}

/// `DELETE FROM <table> WHERE <key_column>=<placeholder>`
pub fn delete_statement(table: &str, key_column: &str, key: Param, dialect: Dialect) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {}={}",
            table,
            key_column,
            dialect.placeholder(1)
        ),
        params: vec![key],
    }
}
