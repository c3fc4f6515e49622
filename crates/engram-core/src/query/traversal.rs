//! Traversal builder (`TB`), §4.3.

use super::ast::{render_bitemporal, CompareOp, Direction, HopRange, Predicate};
use super::node::AsOfScope;
use super::param::{ParamStore, Value};
use crate::bitemporal::{current_tt, current_vt, live_at};

/// A fully-built, renderable traversal. Produced by [`TB`]'s terminal
/// [`TB::returning`] call.
#[derive(Debug, Clone)]
pub struct TraversalQuery {
    pub from_label: String,
    pub from_alias: String,
    pub from_predicates: Vec<Predicate>,
    pub edge_types: Vec<String>,
    pub edge_alias: String,
    pub direction: Direction,
    pub hops: HopRange,
    pub edge_predicates: Vec<Predicate>,
    pub to_label: Option<String>,
    pub to_alias: String,
    pub to_predicates: Vec<Predicate>,
    pub bitemporal_clauses: Vec<String>,
    pub returning: Vec<String>,
    pub distinct: bool,
    pub params: ParamStore,
}

impl TraversalQuery {
    pub fn render(&self) -> String {
        let arrow = match self.direction {
            Direction::Outgoing => (">", ""),
            Direction::Incoming => ("", "<"),
            Direction::Any => ("", ""),
        };
        let edge_list = self.edge_types.join("|");
        let hop_suffix = self.hops.render();
        let to_part = match &self.to_label {
            Some(label) => format!("{}:{label}", self.to_alias),
            None => self.to_alias.clone(),
        };

        let mut out = format!(
            "MATCH ({}:{}){}-[{}:{edge_list}{hop_suffix}]-{}({to_part})",
            self.from_alias, self.from_label, arrow.1, self.edge_alias, arrow.0
        );

        let mut clauses: Vec<String> = self
            .from_predicates
            .iter()
            .map(|p| format!("{}.{p}", self.from_alias))
            .collect();
        clauses.extend(
            self.edge_predicates
                .iter()
                .map(|p| format!("{}.{p}", self.edge_alias)),
        );
        clauses.extend(
            self.to_predicates
                .iter()
                .map(|p| format!("{}.{p}", self.to_alias)),
        );
        clauses.extend(self.bitemporal_clauses.iter().cloned());

        if !clauses.is_empty() {
            out.push_str(" WHERE ");
            out.push_str(&clauses.join(" AND "));
        }

        out.push_str(" RETURN ");
        if self.distinct {
            out.push_str("DISTINCT ");
        }
        if self.returning.is_empty() {
            out.push_str(&format!("{}, {}", self.from_alias, self.to_alias));
        } else {
            out.push_str(&self.returning.join(", "));
        }
        out
    }
}

/// Fluent traversal builder: `TB.from(label, cond?)…via(…)…to(label?, cond?)`.
#[derive(Debug, Clone)]
pub struct TB {
    from_label: String,
    from_alias: String,
    from_predicates: Vec<Predicate>,
    edge_types: Vec<String>,
    edge_alias: String,
    direction: Direction,
    hops: HopRange,
    edge_predicates: Vec<Predicate>,
    to_label: Option<String>,
    to_alias: String,
    to_predicates: Vec<Predicate>,
    bitemporal_clauses: Vec<String>,
    distinct: bool,
    params: ParamStore,
}

impl TB {
    /// `TB.from(label)` — begins a traversal at nodes of `label`.
    pub fn from(label: impl Into<String>) -> Self {
        Self {
            from_label: label.into(),
            from_alias: "a".to_string(),
            from_predicates: Vec::new(),
            edge_types: Vec::new(),
            edge_alias: "r".to_string(),
            direction: Direction::default(),
            hops: HopRange::default(),
            edge_predicates: Vec::new(),
            to_label: None,
            to_alias: "b".to_string(),
            to_predicates: Vec::new(),
            bitemporal_clauses: Vec::new(),
            distinct: false,
            params: ParamStore::new(),
        }
    }

    /// Constrains the `from` node with an equality predicate.
    pub fn where_from(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let param = self.params.bind(value.into());
        self.from_predicates.push(Predicate {
            field: field.into(),
            op: CompareOp::Eq,
            param,
        });
        self
    }

    /// `via(edgeTypes, {direction, pathLength})`.
    pub fn via(mut self, edge_types: Vec<String>, direction: Direction, hops: HopRange) -> Self {
        self.edge_types = edge_types;
        self.direction = direction;
        self.hops = hops;
        self
    }

    /// Attaches a predicate to the last (only) edge step.
    pub fn where_edge(mut self, field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        let param = self.params.bind(value.into());
        self.edge_predicates.push(Predicate {
            field: field.into(),
            op,
            param,
        });
        self
    }

    /// `to(label?, cond?)`.
    pub fn to(mut self, label: Option<String>) -> Self {
        self.to_label = label;
        self
    }

    /// Constrains the `to` node with an equality predicate.
    pub fn where_to(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let param = self.params.bind(value.into());
        self.to_predicates.push(Predicate {
            field: field.into(),
            op: CompareOp::Eq,
            param,
        });
        self
    }

    /// Bitemporal modifiers propagate to every node and edge in the path.
    pub fn as_of(mut self, t: i64, scope: AsOfScope) -> Self {
        let (valid, txn) = live_at(t);
        for alias in [
            self.from_alias.clone(),
            self.edge_alias.clone(),
            self.to_alias.clone(),
        ] {
            if scope.valid_time {
                self.bitemporal_clauses
                    .push(render_bitemporal(&alias, valid, &mut self.params));
            }
            if scope.transaction_time {
                self.bitemporal_clauses
                    .push(render_bitemporal(&alias, txn, &mut self.params));
            }
        }
        self
    }

    /// `whereCurrent()` propagated to every node and edge in the path.
    pub fn where_current(mut self) -> Self {
        for alias in [
            self.from_alias.clone(),
            self.edge_alias.clone(),
            self.to_alias.clone(),
        ] {
            self.bitemporal_clauses
                .push(render_bitemporal(&alias, current_tt(), &mut self.params));
        }
        self
    }

    /// `whereValid()` propagated to every node and edge in the path.
    pub fn where_valid(mut self) -> Self {
        for alias in [
            self.from_alias.clone(),
            self.edge_alias.clone(),
            self.to_alias.clone(),
        ] {
            self.bitemporal_clauses
                .push(render_bitemporal(&alias, current_vt(), &mut self.params));
        }
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Terminal: `returning(alias…)` — finishes the builder.
    pub fn returning(self, aliases: Vec<String>) -> TraversalQuery {
        TraversalQuery {
            from_label: self.from_label,
            from_alias: self.from_alias,
            from_predicates: self.from_predicates,
            edge_types: self.edge_types,
            edge_alias: self.edge_alias,
            direction: self.direction,
            hops: self.hops,
            edge_predicates: self.edge_predicates,
            to_label: self.to_label,
            to_alias: self.to_alias,
            to_predicates: self.to_predicates,
            bitemporal_clauses: self.bitemporal_clauses,
            returning: aliases,
            distinct: self.distinct,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_direction_defaults_to_outgoing() {
        let q = TB::from("Session")
            .via(vec!["HAS_TURN".into()], Direction::default(), HopRange::default())
            .to(Some("Turn".into()))
            .returning(vec![]);
        assert_eq!(q.direction, Direction::Outgoing);
        assert!(q.render().contains("-[r:HAS_TURN]->"));
    }

    #[test]
    fn exact_hops_collapse() {
        let q = TB::from("Memory")
            .via(vec!["RELATED_TO".into()], Direction::Any, HopRange::exact(2))
            .to(Some("Memory".into()))
            .returning(vec![]);
        assert!(q.render().contains("*2"));
    }

    #[test]
    fn variable_hops_emit_star_range() {
        let q = TB::from("Memory")
            .via(vec!["RELATED_TO".into()], Direction::Any, HopRange::range(1, 3))
            .to(Some("Memory".into()))
            .returning(vec![]);
        assert!(q.render().contains("*1..3"));
    }

    #[test]
    fn where_current_propagates_to_all_three_aliases() {
        let q = TB::from("Memory")
            .via(vec!["REPLACES".into()], Direction::Outgoing, HopRange::default())
            .to(Some("Memory".into()))
            .where_current()
            .returning(vec![]);
        let rendered = q.render();
        assert!(rendered.contains("a.tt_end = MAX_DATE"));
        assert!(rendered.contains("r.tt_end = MAX_DATE"));
        assert!(rendered.contains("b.tt_end = MAX_DATE"));
    }

    #[test]
    fn equal_chains_are_deterministic() {
        let build = || {
            TB::from("Session")
                .where_from("org_id", "acme")
                .via(vec!["HAS_TURN".into()], Direction::Outgoing, HopRange::default())
                .to(Some("Turn".into()))
                .returning(vec!["b".into()])
        };
        assert_eq!(build().render(), build().render());
    }
}
