//! The shared filter/sort/paginate executor behind every list view.
//!
//! One implementation parameterized by a [`ListConfig`] replaces what
//! would otherwise be a near-identical query per entity type.

use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};

use taskboard_core::query::{FilterKind, ListConfig, QuerySpec, SortDirection};

use crate::DbError;

/// One page of rows plus the pagination facts for rendering it.
///
/// `current_page` carries the requested page even when it lies past the
/// end; the rows are then empty and `last_page` reflects true totals.
#[derive(Debug)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    pub current_page: i64,
    pub last_page: i64,
    pub total: i64,
    pub per_page: i64,
}

impl<T> PageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            rows: self.rows.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            total: self.total,
            per_page: self.per_page,
        }
    }
}

/// Run one list query: filters (AND-ed), ordering, then the page slice,
/// in that fixed sequence over the full matching set.
///
/// `scope` prepends a fixed constraint (e.g. `project_id = ?`) for nested
/// lists. The sort column is re-checked against the whitelist here even
/// though decode already rejected unknown fields; a raw field name is
/// never interpolated into SQL.
pub(crate) fn fetch_page<T>(
    conn: &Connection,
    table: &str,
    scope: Option<(&str, &dyn ToSql)>,
    spec: &QuerySpec,
    config: &ListConfig,
    row_fn: fn(&Row) -> rusqlite::Result<T>,
) -> Result<PageResult<T>, DbError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    if let Some((clause, value)) = scope {
        clauses.push(clause.to_string());
        params.push(value);
    }

    // Iterate the config, not the spec, so only whitelisted field names
    // ever reach the SQL text.
    for field in config.filters {
        if let Some(value) = spec.filters.get(field.name) {
            match field.kind {
                FilterKind::Substring => clauses.push(format!(
                    "LOWER({}) LIKE '%' || LOWER(?) || '%'",
                    field.name
                )),
                FilterKind::Exact => clauses.push(format!("{} = ?", field.name)),
            }
            params.push(value);
        }
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table}{where_sql}"),
        params.as_slice(),
        |row| row.get(0),
    )?;

    let per_page = config.per_page;
    let last_page = if total == 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    };

    let sort_field = if config.is_sortable(&spec.sort_field) {
        spec.sort_field.as_str()
    } else {
        config.default_sort
    };
    let direction = match spec.sort_direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };

    // Stable secondary key: without it, rows tied on the sort field could
    // be skipped or duplicated across consecutive page requests.
    let sql = format!(
        "SELECT * FROM {table}{where_sql} \
         ORDER BY {sort_field} {direction}, id ASC LIMIT ? OFFSET ?"
    );

    let limit = per_page;
    // Saturate: an absurdly large page number must land past the end
    // (empty rows), never wrap into a negative OFFSET.
    let offset = spec.page.saturating_sub(1).saturating_mul(per_page);
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), row_fn)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PageResult {
        rows,
        current_page: spec.page,
        last_page,
        total,
        per_page,
    })
}
