//! Label classification.
//!
//! Maps an issue's raw label set to a single high-level [`Category`] via an
//! ordered, data-driven rule table, and extracts `area/` namespace labels.

use issuepulse_core::Category;

/// One classification rule: if any label contains any needle
/// (case-insensitive), the issue belongs to `category`.
struct CategoryRule {
    category: Category,
    needles: &'static [&'static str],
}

/// Ordered rule table; the first matching rule wins.
///
/// Priority: Bug > Dependency > Infra > Feature > Docs. Dependency must
/// precede Infra because labels like `dependencies` contain the Infra
/// needle `ci` as a substring.
const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Bug,
        needles: &[
            "kind/bug",
            "bug",
            "crash",
            "regression",
            "panic",
            "traceback",
            "segfault",
            "needs-reproduction",
        ],
    },
    CategoryRule {
        category: Category::Dependency,
        needles: &["dependenc", "deps", "dependabot", "bump"],
    },
    CategoryRule {
        category: Category::Infra,
        needles: &[
            "ci",
            "cd",
            "workflow",
            "pipeline",
            "build",
            "release",
            "refactor",
            "tooling",
            "test",
            "area/cli",
            "area/core",
            "area/config",
            "area/installer",
            "area/solver",
        ],
    },
    CategoryRule {
        category: Category::Feature,
        needles: &[
            "kind/feature",
            "kind/enhancement",
            "feature",
            "enhancement",
            "improvement",
        ],
    },
    CategoryRule {
        category: Category::Docs,
        needles: &[
            "doc",
            "readme",
            "guide",
            "tutorial",
            "howto",
            "how-to",
            "faq",
            "kind/question",
        ],
    },
];

/// Classify a label set into exactly one category.
///
/// Total and deterministic: every input maps to a category, defaulting to
/// [`Category::Other`] when no rule matches (including the empty set).
/// Matching is case-insensitive substring containment.
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::classify::classify;
/// use issuepulse_core::Category;
///
/// assert_eq!(classify(&["kind/bug".into()]), Category::Bug);
/// assert_eq!(classify(&["Enhancement".into()]), Category::Feature);
/// assert_eq!(classify(&[]), Category::Other);
/// ```
pub fn classify(labels: &[String]) -> Category {
    let lowered: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    for rule in RULES {
        if lowered
            .iter()
            .any(|label| rule.needles.iter().any(|needle| label.contains(needle)))
        {
            return rule.category;
        }
    }
    Category::Other
}

/// Extract the labels in the `area/` namespace.
///
/// Prefix match is case-insensitive; first-seen order is preserved and
/// duplicates (case-insensitively) are removed.
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::classify::area_labels;
///
/// let labels = vec![
///     "area/cli".to_string(),
///     "kind/bug".to_string(),
///     "Area/CLI".to_string(),
///     "area/docs".to_string(),
/// ];
/// assert_eq!(area_labels(&labels), vec!["area/cli", "area/docs"]);
/// ```
pub fn area_labels(labels: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for label in labels {
        let lowered = label.to_lowercase();
        if lowered.starts_with("area/") && !seen.contains(&lowered) {
            seen.push(lowered);
            out.push(label.clone());
        }
    }
    out
}
