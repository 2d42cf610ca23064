//! # Pattern Catalog
//!
//! Declarative pattern templates. A template says how many points it spans
//! and which relations must hold among them; the matcher does the rest.
//! Adding a pattern is adding a row to [`PatternCatalog::standard`] (or to a
//! JSON catalog), never writing a new detector.
//!
//! Roles are numbered `1..=arity`, as in the usual textbook tables:
//!
//! | Pattern | Arity | Requirement |
//! |---------|-------|-------------|
//! | T-Square | 3 | Opposition(1,2), Square(1,3), Square(2,3) |
//! | Grand Cross | 4 | >= 2 Opposition and >= 4 Square over the 6 pairs |
//! | Kite | 4 | Grand Trine + one point opposing any member |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::AspectKind;
use crate::{Error, Result};

use AspectKind::*;

// ============================================================================
// Template types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Major,
    Minor,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Major => f.write_str("Major"),
            Category::Minor => f.write_str("Minor"),
        }
    }
}

/// Roles `a` and `b` (1-based) must carry one of `accepted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEdge {
    pub a: usize,
    pub b: usize,
    pub accepted: Vec<AspectKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    AtLeast(usize),
    Exactly(usize),
}

impl Bound {
    pub fn admits(self, count: usize) -> bool {
        match self {
            Bound::AtLeast(n) => count >= n,
            Bound::Exactly(n) => count == n,
        }
    }

    fn value(self) -> usize {
        match self {
            Bound::AtLeast(n) | Bound::Exactly(n) => n,
        }
    }
}

/// Number of subset pairs carrying one of `accepted` must satisfy `bound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRule {
    pub accepted: Vec<AspectKind>,
    pub bound: Bound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    /// Every listed role pair must hold under some assignment of the
    /// subset's members to roles.
    Roles(Vec<RoleEdge>),
    /// Every rule must hold, counting over all pairs of the subset.
    Counts(Vec<CountRule>),
    /// A match of `base` plus one further point carrying one of `link`
    /// to any member of that match.
    Extends { base: String, link: Vec<AspectKind> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTemplate {
    pub name: String,
    pub arity: usize,
    pub requirement: Requirement,
    pub category: Category,
    pub keyword: String,
}

fn edge(a: usize, b: usize, accepted: &[AspectKind]) -> RoleEdge {
    RoleEdge { a, b, accepted: accepted.to_vec() }
}

fn count(accepted: &[AspectKind], bound: Bound) -> CountRule {
    CountRule { accepted: accepted.to_vec(), bound }
}

impl PatternTemplate {
    pub fn roles(
        name: &str,
        arity: usize,
        category: Category,
        keyword: &str,
        edges: Vec<RoleEdge>,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            requirement: Requirement::Roles(edges),
            category,
            keyword: keyword.into(),
        }
    }

    pub fn counts(
        name: &str,
        arity: usize,
        category: Category,
        keyword: &str,
        rules: Vec<CountRule>,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            requirement: Requirement::Counts(rules),
            category,
            keyword: keyword.into(),
        }
    }

    pub fn extends(
        name: &str,
        base: &PatternTemplate,
        link: &[AspectKind],
        category: Category,
        keyword: &str,
    ) -> Self {
        Self {
            name: name.into(),
            arity: base.arity + 1,
            requirement: Requirement::Extends { base: base.name.clone(), link: link.to_vec() },
            category,
            keyword: keyword.into(),
        }
    }

    /// Pairs in a subset of this arity.
    pub fn pair_count(&self) -> usize {
        self.arity * (self.arity - 1) / 2
    }

    /// Run the checks `PatternCatalog::push` applies, without adding the
    /// template. Extension bases are looked up in `catalog`.
    pub fn check_against(&self, catalog: &PatternCatalog) -> Result<()> {
        self.validate(&catalog.templates)
    }

    fn validate(&self, known: &[PatternTemplate]) -> Result<()> {
        let invalid = |why: String| Error::InvalidTemplate { name: self.name.clone(), reason: why };

        if self.name.trim().is_empty() {
            return Err(invalid("empty name".into()));
        }
        if !matches!(self.arity, 3 | 4 | 6) {
            return Err(invalid(format!("arity {} is not one of 3, 4, 6", self.arity)));
        }

        match &self.requirement {
            Requirement::Roles(edges) => {
                if edges.is_empty() {
                    return Err(invalid("no role edges".into()));
                }
                for e in edges {
                    if e.a == e.b || !(1..=self.arity).contains(&e.a) || !(1..=self.arity).contains(&e.b) {
                        return Err(invalid(format!("role pair ({}, {}) is invalid", e.a, e.b)));
                    }
                    if e.accepted.is_empty() {
                        return Err(invalid(format!("role pair ({}, {}) accepts nothing", e.a, e.b)));
                    }
                }
            }
            Requirement::Counts(rules) => {
                if rules.is_empty() {
                    return Err(invalid("no count rules".into()));
                }
                for r in rules {
                    if r.accepted.is_empty() {
                        return Err(invalid("count rule accepts nothing".into()));
                    }
                    if r.bound.value() > self.pair_count() {
                        return Err(invalid(format!(
                            "bound {} exceeds the {} pairs of arity {}",
                            r.bound.value(),
                            self.pair_count(),
                            self.arity,
                        )));
                    }
                }
            }
            Requirement::Extends { base, link } => {
                let Some(base_tpl) = known.iter().find(|t| &t.name == base) else {
                    return Err(invalid(format!("base pattern '{base}' must be defined first")));
                };
                if base_tpl.arity + 1 != self.arity {
                    return Err(invalid(format!(
                        "extension of arity-{} '{base}' must have arity {}",
                        base_tpl.arity,
                        base_tpl.arity + 1,
                    )));
                }
                if link.is_empty() {
                    return Err(invalid("extension link accepts nothing".into()));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// PatternCatalog
// ============================================================================

/// Ordered, validated set of templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCatalog {
    templates: Vec<PatternTemplate>,
}

impl PatternCatalog {
    pub fn empty() -> Self {
        Self { templates: Vec::new() }
    }

    /// Validate and collect templates in order.
    pub fn from_templates(templates: impl IntoIterator<Item = PatternTemplate>) -> Result<Self> {
        let mut catalog = Self::empty();
        for t in templates {
            catalog.push(t)?;
        }
        Ok(catalog)
    }

    /// Load a JSON array of templates.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let templates: Vec<PatternTemplate> = serde_json::from_str(json)?;
        Self::from_templates(templates)
    }

    pub fn push(&mut self, template: PatternTemplate) -> Result<()> {
        if self.get(&template.name).is_some() {
            return Err(Error::InvalidTemplate {
                name: template.name,
                reason: "duplicate name".into(),
            });
        }
        template.validate(&self.templates)?;
        self.templates.push(template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PatternTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The fourteen classical configurations.
    pub fn standard() -> Self {
        use Category::{Major, Minor};

        let grand_trine = PatternTemplate::roles(
            "Grand Trine", 3, Major,
            "Completed circuit: talent flows naturally.",
            vec![edge(1, 2, &[Trine]), edge(1, 3, &[Trine]), edge(2, 3, &[Trine])],
        );
        let yod = PatternTemplate::roles(
            "Yod", 3, Major,
            "Finger of destiny: the focus of adjustment and fate.",
            vec![edge(1, 2, &[Quincunx]), edge(1, 3, &[Quincunx]), edge(2, 3, &[Sextile])],
        );
        let kite = PatternTemplate::extends(
            "Kite", &grand_trine, &[Opposition], Major,
            "Structure of grace: gift and challenge intersect.",
        );
        let boomerang = PatternTemplate::extends(
            "Boomerang", &yod, &[Opposition], Minor,
            "Feedback loop: energy that comes back around.",
        );

        let templates = vec![
            grand_trine,
            PatternTemplate::roles(
                "T-Square", 3, Major,
                "Birth under tension: lack gives direction.",
                vec![edge(1, 2, &[Opposition]), edge(1, 3, &[Square]), edge(2, 3, &[Square])],
            ),
            yod,
            PatternTemplate::roles(
                "Thor's Hammer", 3, Major,
                "Instrument of rupture: thunder that forces change.",
                vec![edge(1, 2, &[Square]), edge(1, 3, &[Sesquiquadrate]), edge(2, 3, &[Sesquiquadrate])],
            ),
            PatternTemplate::counts(
                "Grand Cross", 4, Major,
                "Balance of extremes: four axes bound into one.",
                vec![count(&[Opposition], Bound::AtLeast(2)), count(&[Square], Bound::AtLeast(4))],
            ),
            PatternTemplate::counts(
                "Mystic Rectangle", 4, Major,
                "Paradox within order: harmonious tension.",
                vec![
                    count(&[Opposition], Bound::AtLeast(2)),
                    count(&[Trine], Bound::AtLeast(2)),
                    count(&[Sextile], Bound::AtLeast(2)),
                ],
            ),
            kite,
            PatternTemplate::roles(
                "Golden Yod", 3, Minor,
                "Secret of proportion: a triangle of creative harmony.",
                vec![edge(1, 2, &[Quintile, BiQuintile]), edge(1, 3, &[Quincunx]), edge(2, 3, &[Quincunx])],
            ),
            boomerang,
            PatternTemplate::counts(
                "Cradle", 4, Minor,
                "Curve of the cradle: stability under protection.",
                vec![
                    count(&[Trine], Bound::Exactly(1)),
                    count(&[Sextile], Bound::Exactly(2)),
                    count(&[Opposition], Bound::Exactly(1)),
                ],
            ),
            PatternTemplate::counts(
                "Grand Sextile", 6, Minor,
                "Complete harmony: the hexagonal crystal of awareness.",
                vec![count(&[Sextile, Trine], Bound::AtLeast(12))],
            ),
            PatternTemplate::roles(
                "Minor Grand Trine", 3, Minor,
                "Quiet talent: the current runs gently on.",
                vec![edge(1, 2, &[Trine]), edge(1, 3, &[Sextile]), edge(2, 3, &[Sextile])],
            ),
            PatternTemplate::roles(
                "Wedge", 3, Minor,
                "Piercing arrow: a passage through opposition.",
                vec![edge(1, 2, &[Opposition]), edge(1, 3, &[Sextile]), edge(2, 3, &[Sextile])],
            ),
            PatternTemplate::roles(
                "Finger of Fate", 3, Minor,
                "Focused purpose: a single line of direction.",
                vec![edge(1, 2, &[SemiSextile]), edge(1, 3, &[SemiSextile]), edge(2, 3, &[Quincunx])],
            ),
        ];

        Self { templates }
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'a> IntoIterator for &'a PatternCatalog {
    type Item = &'a PatternTemplate;
    type IntoIter = std::slice::Iter<'a, PatternTemplate>;

    fn into_iter(self) -> Self::IntoIter {
        self.templates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let standard = PatternCatalog::standard();
        assert_eq!(standard.len(), 14);
        // rebuilding through validation must accept every row
        let rebuilt = PatternCatalog::from_templates(standard.iter().cloned()).unwrap();
        assert_eq!(rebuilt, standard);
    }

    #[test]
    fn test_categories() {
        let c = PatternCatalog::standard();
        assert_eq!(c.get("Kite").unwrap().category, Category::Major);
        assert_eq!(c.get("Boomerang").unwrap().category, Category::Minor);
        assert_eq!(c.get("Grand Sextile").unwrap().arity, 6);
        assert_eq!(c.iter().filter(|t| t.category == Category::Major).count(), 7);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut c = PatternCatalog::standard();
        let dup = c.get("Yod").unwrap().clone();
        assert!(matches!(c.push(dup), Err(Error::InvalidTemplate { .. })));
    }

    #[test]
    fn test_bad_templates_rejected() {
        let mut c = PatternCatalog::empty();
        let bad_arity = PatternTemplate::roles("Pentagram", 5, Category::Minor, "", vec![edge(1, 2, &[Quintile])]);
        assert!(c.push(bad_arity).is_err());

        let bad_role = PatternTemplate::roles("Broken", 3, Category::Minor, "", vec![edge(1, 4, &[Trine])]);
        assert!(c.push(bad_role).is_err());

        let too_many = PatternTemplate::counts("Greedy", 3, Category::Minor, "", vec![count(&[Trine], Bound::AtLeast(4))]);
        assert!(c.push(too_many).is_err());

        let orphan = PatternTemplate {
            name: "Orphan".into(),
            arity: 4,
            requirement: Requirement::Extends { base: "Missing".into(), link: vec![Opposition] },
            category: Category::Minor,
            keyword: String::new(),
        };
        assert!(c.push(orphan).is_err());
        assert!(c.is_empty());
    }

    #[test]
    fn test_json_catalog() {
        let json = r#"[
            {"name": "Stellium Trine", "arity": 3, "category": "Minor", "keyword": "k",
             "requirement": {"Counts": [{"accepted": ["Trine"], "bound": {"AtLeast": 2}}]}}
        ]"#;
        let c = PatternCatalog::from_json_str(json).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("Stellium Trine").unwrap().pair_count(), 3);
    }

    #[test]
    fn test_bound_admits() {
        assert!(Bound::AtLeast(2).admits(3));
        assert!(!Bound::Exactly(2).admits(3));
        assert!(Bound::Exactly(1).admits(1));
    }
}
