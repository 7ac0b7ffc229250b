//! WHERE and HAVING predicate accumulation.
//!
//! Typed helpers validate the column, convert the value to an owned bind
//! value, and append a parameterized fragment joined with AND (`or_*`
//! variants use OR). Raw fragments bypass validation and are embedded
//! verbatim.

use rusqlite::ToSql;
use rusqlite::types::Value;

use crate::builder::Builder;
use crate::error::{Error, Result};
use crate::ident;
use crate::value::to_value;

/// How a predicate joins to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combine {
    And,
    Or,
}

impl Combine {
    fn as_sql(self) -> &'static str {
        match self {
            Combine::And => "AND",
            Combine::Or => "OR",
        }
    }
}

/// One rendered condition plus its combinator.
#[derive(Debug)]
pub(crate) struct Predicate {
    condition: String,
    combine: Combine,
}

/// Ordered predicate list with positionally aligned arguments.
#[derive(Debug, Default)]
pub(crate) struct ConditionList {
    items: Vec<Predicate>,
    args: Vec<Value>,
}

impl ConditionList {
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    pub(crate) fn take_args(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.args)
    }

    pub(crate) fn push_raw(&mut self, combine: Combine, condition: &str, args: Vec<Value>) {
        self.items.push(Predicate {
            condition: condition.to_string(),
            combine,
        });
        self.args.extend(args);
    }

    pub(crate) fn push_cmp(
        &mut self,
        combine: Combine,
        column: &str,
        op: &str,
        value: Value,
    ) -> Result<()> {
        ident::validate(column)?;
        let condition = format!("{} {} ?", ident::quote(column), op);
        self.push_raw(combine, &condition, vec![value]);
        Ok(())
    }

    pub(crate) fn push_in(
        &mut self,
        combine: Combine,
        column: &str,
        negated: bool,
        values: Vec<Value>,
    ) -> Result<()> {
        ident::validate(column)?;
        if values.is_empty() {
            return Err(Error::validation("values is empty"));
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        let op = if negated { "NOT IN" } else { "IN" };
        let condition = format!("{} {op} ({placeholders})", ident::quote(column));
        self.push_raw(combine, &condition, values);
        Ok(())
    }

    pub(crate) fn push_null(&mut self, combine: Combine, column: &str, negated: bool) -> Result<()> {
        ident::validate(column)?;
        let op = if negated { "IS NOT NULL" } else { "IS NULL" };
        let condition = format!("{} {op}", ident::quote(column));
        self.push_raw(combine, &condition, Vec::new());
        Ok(())
    }

    pub(crate) fn push_between(
        &mut self,
        combine: Combine,
        column: &str,
        start: Value,
        end: Value,
    ) -> Result<()> {
        ident::validate(column)?;
        let condition = format!("{} BETWEEN ? AND ?", ident::quote(column));
        self.push_raw(combine, &condition, vec![start, end]);
        Ok(())
    }

    /// Render the clause, leading space included, or an empty string.
    ///
    /// A predicate's combinator is emitted only when another predicate
    /// precedes it.
    pub(crate) fn render(&self, keyword: &str) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let mut sql = format!(" {keyword} ");
        for (i, predicate) in self.items.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(predicate.combine.as_sql());
                sql.push(' ');
            }
            sql.push_str(&predicate.condition);
        }
        sql
    }
}

/// Which predicate list a chain call targets.
#[derive(Debug, Clone, Copy)]
enum Clause {
    Where,
    Having,
}

impl Builder {
    fn clause_mut(&mut self, clause: Clause) -> &mut ConditionList {
        match clause {
            Clause::Where => &mut self.state.where_clause,
            Clause::Having => &mut self.state.having_clause,
        }
    }

    fn raw(
        &mut self,
        clause: Clause,
        combine: Combine,
        op: &'static str,
        condition: &str,
        args: &[&dyn ToSql],
    ) -> &mut Self {
        match args.iter().map(|a| to_value(*a)).collect::<Result<Vec<_>>>() {
            Ok(values) => self.clause_mut(clause).push_raw(combine, condition, values),
            Err(e) => self.record(op, e),
        }
        self
    }

    fn cmp(
        &mut self,
        clause: Clause,
        combine: Combine,
        op: &'static str,
        column: &str,
        sql_op: &str,
        value: &dyn ToSql,
    ) -> &mut Self {
        let res = to_value(value)
            .and_then(|v| self.clause_mut(clause).push_cmp(combine, column, sql_op, v));
        if let Err(e) = res {
            self.record(op, e);
        }
        self
    }

    fn in_list(
        &mut self,
        clause: Clause,
        combine: Combine,
        op: &'static str,
        column: &str,
        negated: bool,
        values: Result<Vec<Value>>,
    ) -> &mut Self {
        let res = values.and_then(|v| self.clause_mut(clause).push_in(combine, column, negated, v));
        if let Err(e) = res {
            self.record(op, e);
        }
        self
    }

    fn null(
        &mut self,
        clause: Clause,
        combine: Combine,
        op: &'static str,
        column: &str,
        negated: bool,
    ) -> &mut Self {
        if let Err(e) = self.clause_mut(clause).push_null(combine, column, negated) {
            self.record(op, e);
        }
        self
    }

    fn between(
        &mut self,
        clause: Clause,
        combine: Combine,
        op: &'static str,
        column: &str,
        start: &dyn ToSql,
        end: &dyn ToSql,
    ) -> &mut Self {
        let res = to_value(start).and_then(|s| {
            to_value(end)
                .and_then(|e| self.clause_mut(clause).push_between(combine, column, s, e))
        });
        if let Err(e) = res {
            self.record(op, e);
        }
        self
    }

    // ==================== WHERE ====================

    /// Add a raw WHERE condition with `?` placeholders, joined with AND.
    ///
    /// The condition text is embedded verbatim; no identifier validation.
    pub fn where_raw(&mut self, condition: &str, args: &[&dyn ToSql]) -> &mut Self {
        self.raw(Clause::Where, Combine::And, "where_raw", condition, args)
    }

    /// Add WHERE: column = value
    pub fn where_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::And, "where_eq", column, "=", &value)
    }

    /// Add WHERE: column != value
    pub fn where_not_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::And, "where_not_eq", column, "!=", &value)
    }

    /// Add WHERE: column > value
    pub fn where_gt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::And, "where_gt", column, ">", &value)
    }

    /// Add WHERE: column < value
    pub fn where_lt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::And, "where_lt", column, "<", &value)
    }

    /// Add WHERE: column >= value
    pub fn where_ge(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::And, "where_ge", column, ">=", &value)
    }

    /// Add WHERE: column <= value
    pub fn where_le(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::And, "where_le", column, "<=", &value)
    }

    /// Add WHERE: column IN (values...). An empty value set is an error.
    pub fn where_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Where, Combine::And, "where_in", column, false, values)
    }

    /// Add WHERE: column NOT IN (values...). An empty value set is an error.
    pub fn where_not_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Where, Combine::And, "where_not_in", column, true, values)
    }

    /// Add WHERE: column IS NULL
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Where, Combine::And, "where_null", column, false)
    }

    /// Add WHERE: column IS NOT NULL
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Where, Combine::And, "where_not_null", column, true)
    }

    /// Add WHERE: column BETWEEN start AND end
    pub fn where_between(
        &mut self,
        column: &str,
        start: impl ToSql,
        end: impl ToSql,
    ) -> &mut Self {
        self.between(Clause::Where, Combine::And, "where_between", column, &start, &end)
    }

    // ==================== OR WHERE ====================

    /// Add a raw WHERE condition joined with OR.
    pub fn or_where_raw(&mut self, condition: &str, args: &[&dyn ToSql]) -> &mut Self {
        self.raw(Clause::Where, Combine::Or, "or_where_raw", condition, args)
    }

    /// Add OR WHERE: column = value
    pub fn or_where_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::Or, "or_where_eq", column, "=", &value)
    }

    /// Add OR WHERE: column != value
    pub fn or_where_not_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::Or, "or_where_not_eq", column, "!=", &value)
    }

    /// Add OR WHERE: column > value
    pub fn or_where_gt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::Or, "or_where_gt", column, ">", &value)
    }

    /// Add OR WHERE: column < value
    pub fn or_where_lt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::Or, "or_where_lt", column, "<", &value)
    }

    /// Add OR WHERE: column >= value
    pub fn or_where_ge(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::Or, "or_where_ge", column, ">=", &value)
    }

    /// Add OR WHERE: column <= value
    pub fn or_where_le(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Where, Combine::Or, "or_where_le", column, "<=", &value)
    }

    /// Add OR WHERE: column IN (values...)
    pub fn or_where_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Where, Combine::Or, "or_where_in", column, false, values)
    }

    /// Add OR WHERE: column NOT IN (values...)
    pub fn or_where_not_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Where, Combine::Or, "or_where_not_in", column, true, values)
    }

    /// Add OR WHERE: column IS NULL
    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Where, Combine::Or, "or_where_null", column, false)
    }

    /// Add OR WHERE: column IS NOT NULL
    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Where, Combine::Or, "or_where_not_null", column, true)
    }

    /// Add OR WHERE: column BETWEEN start AND end
    pub fn or_where_between(
        &mut self,
        column: &str,
        start: impl ToSql,
        end: impl ToSql,
    ) -> &mut Self {
        self.between(Clause::Where, Combine::Or, "or_where_between", column, &start, &end)
    }

    // ==================== HAVING ====================

    /// Add a raw HAVING condition with `?` placeholders, joined with AND.
    pub fn having_raw(&mut self, condition: &str, args: &[&dyn ToSql]) -> &mut Self {
        self.raw(Clause::Having, Combine::And, "having_raw", condition, args)
    }

    /// Add HAVING: column = value
    pub fn having_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::And, "having_eq", column, "=", &value)
    }

    /// Add HAVING: column != value
    pub fn having_not_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::And, "having_not_eq", column, "!=", &value)
    }

    /// Add HAVING: column > value
    pub fn having_gt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::And, "having_gt", column, ">", &value)
    }

    /// Add HAVING: column < value
    pub fn having_lt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::And, "having_lt", column, "<", &value)
    }

    /// Add HAVING: column >= value
    pub fn having_ge(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::And, "having_ge", column, ">=", &value)
    }

    /// Add HAVING: column <= value
    pub fn having_le(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::And, "having_le", column, "<=", &value)
    }

    /// Add HAVING: column IN (values...)
    pub fn having_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Having, Combine::And, "having_in", column, false, values)
    }

    /// Add HAVING: column NOT IN (values...)
    pub fn having_not_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Having, Combine::And, "having_not_in", column, true, values)
    }

    /// Add HAVING: column IS NULL
    pub fn having_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Having, Combine::And, "having_null", column, false)
    }

    /// Add HAVING: column IS NOT NULL
    pub fn having_not_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Having, Combine::And, "having_not_null", column, true)
    }

    /// Add HAVING: column BETWEEN start AND end
    pub fn having_between(
        &mut self,
        column: &str,
        start: impl ToSql,
        end: impl ToSql,
    ) -> &mut Self {
        self.between(Clause::Having, Combine::And, "having_between", column, &start, &end)
    }

    // ==================== OR HAVING ====================

    /// Add a raw HAVING condition joined with OR.
    pub fn or_having_raw(&mut self, condition: &str, args: &[&dyn ToSql]) -> &mut Self {
        self.raw(Clause::Having, Combine::Or, "or_having_raw", condition, args)
    }

    /// Add OR HAVING: column = value
    pub fn or_having_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::Or, "or_having_eq", column, "=", &value)
    }

    /// Add OR HAVING: column != value
    pub fn or_having_not_eq(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::Or, "or_having_not_eq", column, "!=", &value)
    }

    /// Add OR HAVING: column > value
    pub fn or_having_gt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::Or, "or_having_gt", column, ">", &value)
    }

    /// Add OR HAVING: column < value
    pub fn or_having_lt(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::Or, "or_having_lt", column, "<", &value)
    }

    /// Add OR HAVING: column >= value
    pub fn or_having_ge(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::Or, "or_having_ge", column, ">=", &value)
    }

    /// Add OR HAVING: column <= value
    pub fn or_having_le(&mut self, column: &str, value: impl ToSql) -> &mut Self {
        self.cmp(Clause::Having, Combine::Or, "or_having_le", column, "<=", &value)
    }

    /// Add OR HAVING: column IN (values...)
    pub fn or_having_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Having, Combine::Or, "or_having_in", column, false, values)
    }

    /// Add OR HAVING: column NOT IN (values...)
    pub fn or_having_not_in<T: ToSql>(&mut self, column: &str, values: &[T]) -> &mut Self {
        let values = convert_all(values);
        self.in_list(Clause::Having, Combine::Or, "or_having_not_in", column, true, values)
    }

    /// Add OR HAVING: column IS NULL
    pub fn or_having_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Having, Combine::Or, "or_having_null", column, false)
    }

    /// Add OR HAVING: column IS NOT NULL
    pub fn or_having_not_null(&mut self, column: &str) -> &mut Self {
        self.null(Clause::Having, Combine::Or, "or_having_not_null", column, true)
    }

    /// Add OR HAVING: column BETWEEN start AND end
    pub fn or_having_between(
        &mut self,
        column: &str,
        start: impl ToSql,
        end: impl ToSql,
    ) -> &mut Self {
        self.between(Clause::Having, Combine::Or, "or_having_between", column, &start, &end)
    }
}

fn convert_all<T: ToSql>(values: &[T]) -> Result<Vec<Value>> {
    values.iter().map(|v| to_value(v)).collect()
}
