//! Shared AST pieces used by both the node query builder and the traversal
//! builder: sort order, traversal direction, hop ranges, and the rendered
//! form of a bitemporal predicate.

use crate::bitemporal::BitemporalPredicate;
use std::fmt;

/// Sort direction for `orderBy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Asc => write!(f, "ASC"),
            Order::Desc => write!(f, "DESC"),
        }
    }
}

/// Traversal direction relative to the `from` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
    Any,
}

/// A variable-length hop bound. `min == max` collapses to an exact-length
/// pattern (§4.3 tie-break).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopRange {
    pub min: u32,
    pub max: u32,
}

impl HopRange {
    pub fn exact(n: u32) -> Self {
        Self { min: n, max: n }
    }

    pub fn range(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Renders the `*min..max` (or `*n`) pattern suffix, with no leading
    /// `*` when the range is the trivial single hop `1..1`.
    pub fn render(&self) -> String {
        if self.min == 1 && self.max == 1 {
            String::new()
        } else if self.min == self.max {
            format!("*{}", self.min)
        } else {
            format!("*{}..{}", self.min, self.max)
        }
    }
}

impl Default for HopRange {
    fn default() -> Self {
        Self::exact(1)
    }
}

/// A single equality or comparison predicate, already bound to a parameter
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub op: CompareOp,
    pub param: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Case-insensitive substring match, used by the lexical recall
    /// fallback (§4.6.2 step 3).
    Contains,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Contains => "CONTAINS",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.param)
    }
}

/// Renders a bitemporal predicate against a given row alias, binding its
/// literal(s) into `params` as it goes.
pub fn render_bitemporal(
    alias: &str,
    pred: BitemporalPredicate,
    params: &mut super::param::ParamStore,
) -> String {
    use super::param::Value;
    match pred {
        BitemporalPredicate::AsOfValid(t) => {
            let p = params.bind(Value::Timestamp(t));
            format!("{alias}.vt_start <= {p} AND {alias}.vt_end > {p}")
        }
        BitemporalPredicate::AsOfTransaction(t) => {
            let p = params.bind(Value::Timestamp(t));
            format!("{alias}.tt_start <= {p} AND {alias}.tt_end > {p}")
        }
        BitemporalPredicate::CurrentValid => format!("{alias}.vt_end = MAX_DATE"),
        BitemporalPredicate::CurrentTransaction => format!("{alias}.tt_end = MAX_DATE"),
        BitemporalPredicate::ValidOver { a, b } => {
            let pa = params.bind(Value::Timestamp(a));
            let pb = params.bind(Value::Timestamp(b));
            format!("{alias}.vt_start <= {pa} AND {alias}.vt_end > {pb}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_hop_has_no_range_suffix() {
        assert_eq!(HopRange::exact(1).render(), "");
        assert_eq!(HopRange::exact(3).render(), "*3");
    }

    #[test]
    fn min_max_hop_range_renders_star_range() {
        assert_eq!(HopRange::range(1, 3).render(), "*1..3");
    }

    #[test]
    fn min_equals_max_collapses_to_exact() {
        assert_eq!(HopRange::range(2, 2).render(), "*2");
    }

    #[test]
    fn direction_defaults_to_outgoing() {
        assert_eq!(Direction::default(), Direction::Outgoing);
    }
}
