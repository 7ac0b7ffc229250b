//! SELECT configuration, assembly, and read terminals.

use crate::builder::{Builder, State};
use crate::error::{Error, Result};
use crate::ident;
use crate::row::{FromRow, Row};

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    fn reversed(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinMode {
    Inner,
    Left,
}

impl JoinMode {
    fn as_sql(self) -> &'static str {
        match self {
            JoinMode::Inner => "INNER JOIN",
            JoinMode::Left => "LEFT JOIN",
        }
    }
}

/// One JOIN clause; validated at assembly time.
#[derive(Debug)]
pub(crate) struct Join {
    pub(crate) mode: JoinMode,
    pub(crate) table: String,
    pub(crate) on: String,
}

impl Builder {
    // ==================== Configuration ====================

    /// Add an INNER JOIN. The ON expression is embedded verbatim.
    ///
    /// The joined table and a non-empty ON clause are checked when the
    /// statement is assembled, not here.
    pub fn join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.state.join_list.push(Join {
            mode: JoinMode::Inner,
            table: table.into(),
            on: on.into(),
        });
        self
    }

    /// Add a LEFT JOIN. The ON expression is embedded verbatim.
    pub fn left_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.state.join_list.push(Join {
            mode: JoinMode::Left,
            table: table.into(),
            on: on.into(),
        });
        self
    }

    /// Add GROUP BY columns. Columns failing identifier validation are
    /// skipped without recording an error.
    pub fn group_by(&mut self, columns: &[&str]) -> &mut Self {
        for column in columns {
            if ident::validate(column).is_err() {
                continue;
            }
            self.state.group_by.push(column.to_string());
        }
        self
    }

    /// Add an ORDER BY expression.
    pub fn order_by(&mut self, column: &str, direction: Direction) -> &mut Self {
        match ident::validate(column) {
            Ok(()) => self.state.order_by.push((column.to_string(), direction)),
            Err(e) => self.record("order_by", e),
        }
        self
    }

    /// Set LIMIT.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.state.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.state.offset = Some(n);
        self
    }

    /// Pagination helper: `page` is 1-based, both arguments clamped to >= 1.
    pub fn paginate(&mut self, page: i64, per_page: i64) -> &mut Self {
        let size = per_page.max(1);
        self.state.limit = Some(size);
        self.state.offset = Some((page.max(1) - 1) * size);
        self
    }

    /// Project `COUNT(*) OVER() AS total` alongside each row of the page, so
    /// one round trip yields the page and the unpaginated total.
    pub fn total(&mut self) -> &mut Self {
        self.state.with_total = true;
        self
    }

    // ==================== Terminals ====================

    /// Execute the SELECT and return all rows.
    pub async fn get(&mut self) -> Result<Vec<Row>> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let sql = build_select(&state, false)?;
        let args = condition_args(&mut state);
        self.database().query(sql, args, state.timeout).await
    }

    /// Execute the SELECT and decode every row into `T`.
    pub async fn get_as<T: FromRow>(&mut self) -> Result<Vec<T>> {
        let rows = self.get().await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the SELECT with LIMIT 1 and return the first row of the
    /// stated ordering, if any.
    pub async fn first(&mut self) -> Result<Option<Row>> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        state.limit = Some(1);
        let sql = build_select(&state, false)?;
        let args = condition_args(&mut state);
        let rows = self.database().query(sql, args, state.timeout).await?;
        Ok(rows.into_iter().next())
    }

    /// Execute the SELECT with LIMIT 1 and decode the first row into `T`.
    pub async fn first_as<T: FromRow>(&mut self) -> Result<Option<T>> {
        let row = self.first().await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Return the last row of the stated ordering: every collected ORDER BY
    /// direction is reversed (`ROWID DESC` when none was given) and LIMIT 1
    /// applied.
    pub async fn last(&mut self) -> Result<Option<Row>> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        if state.order_by.is_empty() {
            state.order_by.push(("ROWID".to_string(), Direction::Desc));
        } else {
            for (_, direction) in &mut state.order_by {
                *direction = direction.reversed();
            }
        }
        state.limit = Some(1);
        let sql = build_select(&state, false)?;
        let args = condition_args(&mut state);
        let rows = self.database().query(sql, args, state.timeout).await?;
        Ok(rows.into_iter().next())
    }

    /// Execute `SELECT COUNT(*)` with the accumulated filters; ORDER BY,
    /// LIMIT, and OFFSET are omitted from the emitted statement.
    pub async fn count(&mut self) -> Result<i64> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let sql = build_select(&state, true)?;
        let args = condition_args(&mut state);
        let rows = self.database().query(sql, args, state.timeout).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Other("COUNT(*) returned no rows".into()))?
            .get_idx(0)
    }
}

/// WHERE args followed by HAVING args, matching placeholder emission order.
pub(crate) fn condition_args(state: &mut State) -> Vec<rusqlite::types::Value> {
    let mut args = state.where_clause.take_args();
    args.extend(state.having_clause.take_args());
    args
}

pub(crate) fn build_join(state: &State) -> Result<String> {
    let mut sql = String::new();
    for join in &state.join_list {
        ident::validate(&join.table)
            .map_err(|e| Error::validation(format!("invalid join table: {e}")))?;
        if join.on.trim().is_empty() {
            return Err(Error::validation("join ON clause cannot be empty"));
        }
        sql.push(' ');
        sql.push_str(join.mode.as_sql());
        sql.push(' ');
        sql.push_str(&ident::quote(&join.table));
        sql.push_str(" ON ");
        sql.push_str(&join.on);
    }
    Ok(sql)
}

fn render_group_by(state: &State) -> String {
    if state.group_by.is_empty() {
        return String::new();
    }
    let cols: Vec<String> = state.group_by.iter().map(|c| ident::quote(c)).collect();
    format!(" GROUP BY {}", cols.join(", "))
}

fn render_order_by(state: &State) -> String {
    if state.order_by.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = state
        .order_by
        .iter()
        .map(|(col, dir)| format!("{} {}", ident::quote(col), dir.as_sql()))
        .collect();
    format!(" ORDER BY {}", parts.join(", "))
}

fn render_limit(state: &State) -> String {
    match state.limit {
        Some(n) => format!(" LIMIT {n}"),
        None => String::new(),
    }
}

fn render_offset(state: &State) -> String {
    match state.offset {
        Some(n) => format!(" OFFSET {n}"),
        None => String::new(),
    }
}

/// Assemble the SELECT statement described by `state`.
///
/// With `count` the projection is forced to `COUNT(*)` and ORDER BY / LIMIT /
/// OFFSET / with-total are left out. With the with-total flag the filtered
/// query is wrapped so each row of the page also carries the unpaginated
/// total.
pub(crate) fn build_select(state: &State, count: bool) -> Result<String> {
    let table = state
        .table
        .as_deref()
        .ok_or_else(|| Error::validation("table name is required"))?;
    ident::validate(table)?;

    let mut sql = String::from("SELECT ");

    if count {
        sql.push_str("COUNT(*)");
    } else if state.select_list.is_empty() {
        sql.push('*');
    } else {
        let mut cols = Vec::with_capacity(state.select_list.len());
        for col in &state.select_list {
            if col == "*" {
                cols.push("*".to_string());
            } else {
                ident::validate(col)?;
                cols.push(ident::quote(col));
            }
        }
        sql.push_str(&cols.join(", "));
    }

    sql.push_str(" FROM ");
    sql.push_str(&ident::quote(table));
    sql.push_str(&build_join(state)?);

    let where_sql = state.where_clause.render("WHERE");
    let group_by = render_group_by(state);
    let having = state.having_clause.render("HAVING");
    let order_by = render_order_by(state);
    let limit = render_limit(state);
    let offset = render_offset(state);

    if !count && state.with_total {
        let inner = format!("{sql}{where_sql}{group_by}{having}{order_by}");
        sql = format!("SELECT COUNT(*) OVER() AS total, data.* FROM ({inner}) AS data{limit}{offset}");
    } else {
        sql.push_str(&where_sql);
        sql.push_str(&group_by);
        sql.push_str(&having);
        if !count {
            sql.push_str(&order_by);
            sql.push_str(&limit);
            sql.push_str(&offset);
        }
    }

    Ok(sql)
}
