//! # Pattern Matcher
//!
//! Generic engine that runs [`PatternTemplate`]s against a [`RelationGraph`].
//!
//! ```text
//! nodes (sorted by label)
//!   → every arity-subset, lexicographic
//!   → requirement check via has_aspect
//!   → mixed-origin filter
//!   → PatternMatch (sorted labels)
//! ```
//!
//! Composite templates reuse their base template's matches and extend each
//! one by a single node, so a Kite can never disagree with its Grand Trine.
//! The origin filter runs before a match is memoized: a composite only ever
//! extends base matches that were themselves reported, and is filtered again
//! once extended.
//!
//! Cost is `C(n, arity)` requirement checks per template. Inputs are small
//! (a few dozen points); bounding them is the caller's job.

pub mod combinations;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{PatternCatalog, PatternTemplate, Requirement, RoleEdge, CountRule};
use crate::graph::{NodeIdx, RelationGraph};
use crate::model::{AspectKind, Origin};
use crate::report::{PatternReport, PatternResult};
use crate::{Error, Result};

use combinations::{Combinations, Members, binomial, permutations};

// ============================================================================
// Mixed-origin policy
// ============================================================================

/// Which origin mixes a match must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MixedOrigin {
    /// No filter (single-chart analysis).
    #[default]
    Off,
    /// At least one point from each of A and B (synastry).
    EveryOrigin,
    /// At least one point of the given origin.
    Contains(Origin),
}

impl MixedOrigin {
    pub fn admits(self, origins: impl IntoIterator<Item = Origin>) -> bool {
        match self {
            MixedOrigin::Off => true,
            MixedOrigin::EveryOrigin => {
                let (mut a, mut b) = (false, false);
                for o in origins {
                    a |= o == Origin::A;
                    b |= o == Origin::B;
                }
                a && b
            }
            MixedOrigin::Contains(wanted) => origins.into_iter().any(|o| o == wanted),
        }
    }
}

// ============================================================================
// PatternMatch
// ============================================================================

/// Labels satisfying one template, sorted, no duplicates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternMatch(pub Vec<String>);

impl PatternMatch {
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PatternMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

impl<S: AsRef<str>> PartialEq<[S]> for PatternMatch {
    fn eq(&self, other: &[S]) -> bool {
        self.0.len() == other.len() && self.0.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

// ============================================================================
// PatternMatcher
// ============================================================================

pub struct PatternMatcher<'g> {
    graph: &'g RelationGraph,
    policy: MixedOrigin,
    /// Graph nodes sorted by label; members are ranks into this.
    nodes: Vec<NodeIdx>,
}

/// Policy-admitted matches per template name, computed once per run.
type Memo = HashMap<String, Vec<Members>>;

impl<'g> PatternMatcher<'g> {
    pub fn new(graph: &'g RelationGraph, policy: MixedOrigin) -> Self {
        Self { graph, policy, nodes: graph.node_indices() }
    }

    pub fn policy(&self) -> MixedOrigin {
        self.policy
    }

    /// Run every template in `catalog`. Major patterns come first, then
    /// Minor, each in catalog order.
    pub fn match_catalog(&self, catalog: &PatternCatalog) -> PatternReport {
        let mut memo = Memo::new();
        let mut results: Vec<PatternResult> = catalog
            .iter()
            .map(|template| {
                let matches = self.filtered(template, catalog, &mut memo);
                debug!(
                    pattern = %template.name,
                    subsets = binomial(self.nodes.len(), template.arity),
                    matches = matches.len(),
                    "matched template",
                );
                PatternResult {
                    name: template.name.clone(),
                    category: template.category,
                    keyword: template.keyword.clone(),
                    matches,
                }
            })
            .collect();
        // stable: keeps catalog order within a category
        results.sort_by_key(|r| r.category);

        let report = PatternReport::new(results);
        info!(
            nodes = self.nodes.len(),
            templates = catalog.len(),
            found = report.total_matches(),
            "pattern search complete",
        );
        report
    }

    /// Run one named template from `catalog`.
    pub fn match_named(&self, catalog: &PatternCatalog, name: &str) -> Result<Vec<PatternMatch>> {
        let template = catalog
            .get(name)
            .ok_or_else(|| Error::UnknownPattern(name.to_string()))?;
        self.match_template(template, catalog)
    }

    /// Run one template. `catalog` supplies bases for composite templates.
    ///
    /// The template is validated against `catalog` first, so one built by
    /// hand gets the same checks as one added with `PatternCatalog::push`.
    pub fn match_template(&self, template: &PatternTemplate, catalog: &PatternCatalog) -> Result<Vec<PatternMatch>> {
        template.check_against(catalog)?;
        Ok(self.filtered(template, catalog, &mut Memo::new()))
    }

    fn filtered(&self, template: &PatternTemplate, catalog: &PatternCatalog, memo: &mut Memo) -> Vec<PatternMatch> {
        self.admitted(template, catalog, memo)
            .iter()
            .map(|m| self.to_match(m))
            .collect()
    }

    fn admits(&self, members: &Members) -> bool {
        self.policy
            .admits(members.iter().map(|&r| self.graph.origin_idx(self.nodes[r])))
    }

    /// Matches of `template` that pass the origin policy, memoized by name.
    fn admitted(&self, template: &PatternTemplate, catalog: &PatternCatalog, memo: &mut Memo) -> Vec<Members> {
        if let Some(done) = memo.get(&template.name) {
            return done.clone();
        }

        let mut found: Vec<Members> = match &template.requirement {
            Requirement::Roles(edges) => {
                let perms = permutations(template.arity);
                Combinations::new(self.nodes.len(), template.arity)
                    .filter(|m| self.roles_hold(m, edges, &perms))
                    .collect()
            }
            Requirement::Counts(rules) => Combinations::new(self.nodes.len(), template.arity)
                .filter(|m| self.counts_hold(m, rules))
                .collect(),
            Requirement::Extends { base, link } => match catalog.get(base) {
                Some(base_tpl) => {
                    let base_matches = self.admitted(base_tpl, catalog, memo);
                    self.extend(&base_matches, link)
                }
                None => {
                    debug!(pattern = %template.name, base = %base, "base template missing from catalog");
                    Vec::new()
                }
            },
        };
        found.retain(|m| self.admits(m));

        memo.insert(template.name.clone(), found.clone());
        found
    }

    fn has(&self, x: usize, y: usize, accepted: &[AspectKind]) -> bool {
        self.graph.has_aspect_idx(self.nodes[x], self.nodes[y], accepted)
    }

    /// Some assignment of members to roles satisfies every edge.
    fn roles_hold(&self, members: &Members, edges: &[RoleEdge], perms: &[Members]) -> bool {
        perms.iter().any(|perm| {
            edges.iter().all(|e| {
                let x = members[perm[e.a - 1]];
                let y = members[perm[e.b - 1]];
                self.has(x, y, &e.accepted)
            })
        })
    }

    fn counts_hold(&self, members: &Members, rules: &[CountRule]) -> bool {
        rules.iter().all(|rule| {
            let mut n = 0;
            for (i, &x) in members.iter().enumerate() {
                for &y in &members[i + 1..] {
                    if self.has(x, y, &rule.accepted) {
                        n += 1;
                    }
                }
            }
            rule.bound.admits(n)
        })
    }

    /// Each base match plus one outside node linked to any base member.
    fn extend(&self, base_matches: &[Members], link: &[AspectKind]) -> Vec<Members> {
        let mut out = BTreeSet::new();
        for base in base_matches {
            for extra in 0..self.nodes.len() {
                if base.contains(&extra) {
                    continue;
                }
                if base.iter().any(|&m| self.has(extra, m, link)) {
                    let mut combined = base.clone();
                    combined.push(extra);
                    combined.sort_unstable();
                    out.insert(combined);
                }
            }
        }
        out.into_iter().collect()
    }

    fn to_match(&self, members: &Members) -> PatternMatch {
        PatternMatch(
            members
                .iter()
                .map(|&r| self.graph.label(self.nodes[r]).to_string())
                .collect(),
        )
    }
}
