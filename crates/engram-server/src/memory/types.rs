//! Domain types for the memory service (C6). These are plain values with no
//! HTTP- or wire-facing concerns — the `http` module owns JSON shape and
//! naming; this module owns the §4.6 semantics.

/// `remember(input, ctx)` input, §4.6.1.
#[derive(Debug, Clone)]
pub struct RememberInput {
    pub content: String,
    pub memory_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub project: Option<String>,
}

/// `remember(input, ctx)` output, §4.6.1 step 5 / S1-S2.
#[derive(Debug, Clone, PartialEq)]
pub struct RememberOutcome {
    pub id: String,
    pub stored: bool,
    pub duplicate: bool,
}

/// `recall` filters, §4.6.2. `after`/`before` are already resolved to epoch
/// milliseconds by the HTTP layer — this module never parses ISO strings.
#[derive(Debug, Clone, Default)]
pub struct RecallFilters {
    pub memory_type: Option<String>,
    pub project: Option<String>,
    pub after: Option<i64>,
    pub before: Option<i64>,
    pub vt_end_after: Option<i64>,
}

/// `recall` rerank options, §4.6.2.
#[derive(Debug, Clone, Copy)]
pub struct RerankOptions {
    pub rerank: bool,
    pub tier: crate::collaborators::RerankTier,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            rerank: true,
            tier: crate::collaborators::RerankTier::Fast,
        }
    }
}

/// Bundled `recall` call parameters.
#[derive(Debug, Clone)]
pub struct RecallParams {
    pub query: String,
    pub limit: u32,
    pub filters: RecallFilters,
    pub rerank: RerankOptions,
}

/// One ranked memory returned from `recall`, §4.6.2 / §6.2 response shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryItem {
    pub id: String,
    pub content: String,
    pub memory_type: String,
    pub tags: Vec<String>,
    pub score: f64,
    pub decay_score: f64,
    pub weighted_score: f64,
    pub created_at: String,
    pub invalidated: bool,
    pub invalidated_at: Option<i64>,
    pub replaced_by: Option<String>,
}

/// `getContext` depth tiers, §4.6.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDepth {
    Shallow,
    Medium,
    Deep,
}

impl ContextDepth {
    pub fn as_u32(self) -> u32 {
        match self {
            ContextDepth::Shallow => 3,
            ContextDepth::Medium => 5,
            ContextDepth::Deep => 10,
        }
    }
}

impl Default for ContextDepth {
    fn default() -> Self {
        ContextDepth::Medium
    }
}

/// One materialized context entry, §4.6.4.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextItem {
    pub item_type: String,
    pub content: String,
    pub relevance: f64,
    pub source: &'static str,
}
