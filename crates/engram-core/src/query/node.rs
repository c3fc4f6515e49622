//! Node query builder (`QB`), §4.3.

use super::ast::{render_bitemporal, CompareOp, Order, Predicate};
use super::param::{ParamStore, Value};
use crate::bitemporal::{current_tt, current_vt, live_at, valid_over};

/// Which half(s) of the bitemporal predicate `asOf` should add. Mirrors
/// `{validTime?, transactionTime?}` from §4.3; defaults to both, matching
/// `liveAt(T)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsOfScope {
    pub valid_time: bool,
    pub transaction_time: bool,
}

impl Default for AsOfScope {
    fn default() -> Self {
        Self {
            valid_time: true,
            transaction_time: true,
        }
    }
}

impl AsOfScope {
    pub fn valid_only() -> Self {
        Self {
            valid_time: true,
            transaction_time: false,
        }
    }

    pub fn transaction_only() -> Self {
        Self {
            valid_time: false,
            transaction_time: true,
        }
    }
}

/// What a terminal call intends to do with the matched rows. `engram-core`
/// never executes anything itself — `engram-server`'s `GraphBackend`
/// dispatches on this to decide what to return to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecKind {
    /// `execute()` — all matches.
    All,
    /// `first()` — one or none (rendered with `LIMIT 1`).
    First,
    /// `count()`.
    Count,
    /// `exists()`.
    Exists,
}

/// A fully-built, renderable node query. Produced by [`QB`]'s terminal
/// methods; immutable and deterministic given the same construction
/// sequence (§8.2 property 5).
#[derive(Debug, Clone)]
pub struct NodeQuery {
    pub label: String,
    pub alias: String,
    pub predicates: Vec<Predicate>,
    pub bitemporal_clauses: Vec<String>,
    pub order_by: Option<(String, Order)>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub exec_kind: ExecKind,
    pub params: ParamStore,
}

impl NodeQuery {
    /// Renders the ASCII-arrow path expression. Parameter numbering is
    /// stable for a given call sequence, so two builder chains issued the
    /// same way render byte-identically.
    pub fn render(&self) -> String {
        let mut clauses: Vec<String> = self
            .predicates
            .iter()
            .map(|p| format!("{}.{p}", self.alias))
            .collect();
        clauses.extend(self.bitemporal_clauses.iter().cloned());

        let mut out = format!("MATCH ({}:{})", self.alias, self.label);
        if !clauses.is_empty() {
            out.push_str(" WHERE ");
            out.push_str(&clauses.join(" AND "));
        }
        match self.exec_kind {
            ExecKind::All | ExecKind::First => out.push_str(&format!(" RETURN {}", self.alias)),
            ExecKind::Count => out.push_str(&format!(" RETURN count({}) AS count", self.alias)),
            ExecKind::Exists => {
                out.push_str(&format!(" RETURN count({}) > 0 AS exists", self.alias))
            }
        }
        if let Some((field, order)) = &self.order_by {
            out.push_str(&format!(" ORDER BY {}.{field} {order}", self.alias));
        }
        let effective_limit = match self.exec_kind {
            ExecKind::First => Some(1),
            _ => self.limit,
        };
        if let Some(limit) = effective_limit {
            out.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            out.push_str(&format!(" SKIP {offset}"));
        }
        out
    }
}

/// Fluent node query builder. `QB(label)` is shorthand for [`QB::new`].
#[derive(Debug, Clone)]
pub struct QB {
    label: String,
    alias: String,
    predicates: Vec<Predicate>,
    bitemporal_clauses: Vec<String>,
    order_by: Option<(String, Order)>,
    limit: Option<u32>,
    offset: Option<u32>,
    params: ParamStore,
}

impl QB {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            alias: "n".to_string(),
            predicates: Vec::new(),
            bitemporal_clauses: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
            params: ParamStore::new(),
        }
    }

    /// Overrides the default `n` row alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// AND-joins equality predicates, in the order given.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let param = self.params.bind(value.into());
        self.predicates.push(Predicate {
            field: field.into(),
            op: CompareOp::Eq,
            param,
        });
        self
    }

    /// Adds a non-equality comparison predicate.
    pub fn where_cmp(
        mut self,
        field: impl Into<String>,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> Self {
        let param = self.params.bind(value.into());
        self.predicates.push(Predicate {
            field: field.into(),
            op,
            param,
        });
        self
    }

    /// Case-insensitive substring match on `field`, used by the lexical
    /// recall fallback (§4.6.2 step 3).
    pub fn where_contains(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_cmp(field, CompareOp::Contains, value)
    }

    /// `asOf(T, scope)` — adds the valid-time and/or transaction-time
    /// half(s) of `liveAt(T)` depending on `scope`.
    pub fn as_of(mut self, t: i64, scope: AsOfScope) -> Self {
        let (valid, txn) = live_at(t);
        if scope.valid_time {
            self.bitemporal_clauses
                .push(render_bitemporal(&self.alias, valid, &mut self.params));
        }
        if scope.transaction_time {
            self.bitemporal_clauses
                .push(render_bitemporal(&self.alias, txn, &mut self.params));
        }
        self
    }

    /// `validOver([a, b])`.
    pub fn where_valid_over(mut self, window: [i64; 2]) -> Self {
        let pred = valid_over(window);
        self.bitemporal_clauses
            .push(render_bitemporal(&self.alias, pred, &mut self.params));
        self
    }

    /// `whereCurrent()` — `tt_end = MAX_DATE`.
    pub fn where_current(mut self) -> Self {
        self.bitemporal_clauses
            .push(render_bitemporal(&self.alias, current_tt(), &mut self.params));
        self
    }

    /// `whereValid()` — `vt_end = MAX_DATE`.
    pub fn where_valid(mut self) -> Self {
        self.bitemporal_clauses
            .push(render_bitemporal(&self.alias, current_vt(), &mut self.params));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    fn finish(self, exec_kind: ExecKind) -> NodeQuery {
        NodeQuery {
            label: self.label,
            alias: self.alias,
            predicates: self.predicates,
            bitemporal_clauses: self.bitemporal_clauses,
            order_by: self.order_by,
            limit: self.limit,
            offset: self.offset,
            exec_kind,
            params: self.params,
        }
    }

    /// Terminal: all matches.
    pub fn execute(self) -> NodeQuery {
        self.finish(ExecKind::All)
    }

    /// Terminal: one or none.
    pub fn first(self) -> NodeQuery {
        self.finish(ExecKind::First)
    }

    /// Terminal: row count.
    pub fn count(self) -> NodeQuery {
        self.finish(ExecKind::Count)
    }

    /// Terminal: whether any row matches.
    pub fn exists(self) -> NodeQuery {
        self.finish(ExecKind::Exists)
    }
}

/// `QB(label)` — spec-notation constructor alias for [`QB::new`].
#[allow(non_snake_case)]
pub fn QB(label: impl Into<String>) -> QB {
    QB::new(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_chains_render_byte_identically() {
        let a = QB::new("Memory").where_eq("project", "acme").limit(5).execute();
        let b = QB::new("Memory").where_eq("project", "acme").limit(5).execute();
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn literals_never_appear_inline() {
        let q = QB::new("Memory")
            .where_eq("content_hash", "deadbeef")
            .execute();
        let rendered = q.render();
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("$p0"));
    }

    #[test]
    fn where_current_adds_tt_end_short_circuit() {
        let q = QB::new("Memory").where_current().execute();
        assert!(q.render().contains("tt_end = MAX_DATE"));
    }

    #[test]
    fn first_forces_limit_one() {
        let q = QB::new("Memory").first();
        assert!(q.render().ends_with("LIMIT 1"));
    }

    #[test]
    fn count_returns_count_alias() {
        let q = QB::new("Memory").count();
        assert!(q.render().contains("count(n) AS count"));
    }

    #[test]
    fn order_by_vt_start_desc_is_newest_first() {
        let q = QB::new("Memory").order_by("vt_start", Order::Desc).execute();
        assert!(q.render().contains("ORDER BY n.vt_start DESC"));
    }
}
