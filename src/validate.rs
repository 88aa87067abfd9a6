//! Opt-in checks of model output against the formats the prompts ask for.
//!
//! The pipeline itself never inspects what the model returns: a summary
//! without an objective line, an analysis without a complexity score, or
//! two variants instead of three all flow through unchanged. This module
//! reads the finished artifacts and reports what it found. It never fails;
//! anything unexpected becomes a warning string.

use crate::output::WorkflowOutput;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Number of variants the generation prompt asks for.
pub const EXPECTED_VARIANTS: usize = 3;

/// Sections the structuring prompt asks for, in order.
pub const RULES_SECTIONS: [&str; 3] = [
    "## Mécaniques principales",
    "## Règles spéciales",
    "## Exemple de tour de jeu",
];

/// What was found in a run's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Title from `# Règles extraites : <title>`.
    pub game_title: Option<String>,
    /// Whether an `**Objectif**` line is present.
    pub has_objective: bool,
    /// Rules sections that were not found.
    pub missing_sections: Vec<String>,
    /// Comma-separated mechanics from the analysis.
    pub mechanics: Vec<String>,
    /// `N` from `**Complexité** : N/5`.
    pub complexity: Option<u8>,
    /// Number of `### Variante` headings.
    pub variant_count: usize,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#\s+Règles extraites\s*:\s*(.+?)\s*$").unwrap());

static RE_OBJECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\*\*Objectif\*\*\s*:").unwrap());

static RE_MECHANICS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\*\*Mécaniques\*\*\s*:\s*(.+?)\s*$").unwrap());

static RE_COMPLEXITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Complexité\*\*\s*:\s*(\d+)\s*/\s*5").unwrap());

static RE_VARIANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^###\s+Variante\b").unwrap());

/// Inspect every artifact of `output`.
pub fn validate_output(output: &WorkflowOutput) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_rules(&output.structured_rules, &mut report);
    check_analysis(&output.analysis, &mut report);
    check_variants(&output.variants, &mut report);
    report
}

fn check_rules(rules: &str, report: &mut ValidationReport) {
    report.game_title = RE_TITLE.captures(rules).map(|c| c[1].to_string());
    if report.game_title.is_none() {
        report
            .warnings
            .push("rules summary has no '# Règles extraites : <title>' heading".into());
    }

    report.has_objective = RE_OBJECTIVE.is_match(rules);
    if !report.has_objective {
        report
            .warnings
            .push("rules summary has no '**Objectif**' line".into());
    }

    for section in RULES_SECTIONS {
        if !rules.lines().any(|l| l.trim_end() == section) {
            report.missing_sections.push(section.to_string());
            report
                .warnings
                .push(format!("rules summary is missing '{section}'"));
        }
    }
}

fn check_analysis(analysis: &str, report: &mut ValidationReport) {
    report.mechanics = parse_mechanics(analysis);
    if report.mechanics.is_empty() {
        report
            .warnings
            .push("analysis lists no '**Mécaniques**'".into());
    }

    report.complexity = parse_complexity(analysis);
    match report.complexity {
        None => report
            .warnings
            .push("analysis has no '**Complexité** : N/5' score".into()),
        Some(n) if !(1..=5).contains(&n) => report
            .warnings
            .push(format!("complexity {n}/5 is outside 1..=5")),
        Some(_) => {}
    }
}

fn check_variants(variants: &str, report: &mut ValidationReport) {
    report.variant_count = count_variants(variants);
    if report.variant_count != EXPECTED_VARIANTS {
        report.warnings.push(format!(
            "expected {EXPECTED_VARIANTS} variants, found {}",
            report.variant_count
        ));
    }
}

/// Mechanics from `**Mécaniques** : a, b, c`.
pub fn parse_mechanics(analysis: &str) -> Vec<String> {
    RE_MECHANICS
        .captures(analysis)
        .map(|c| {
            c[1].split(',')
                .map(|m| m.trim().trim_end_matches('.').to_string())
                .filter(|m| !m.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// `N` from `**Complexité** : N/5`. Values that do not fit a `u8` count as
/// absent.
pub fn parse_complexity(analysis: &str) -> Option<u8> {
    RE_COMPLEXITY
        .captures(analysis)
        .and_then(|c| c[1].parse().ok())
}

/// Number of `### Variante …` headings.
pub fn count_variants(variants: &str) -> usize {
    RE_VARIANT.find_iter(variants).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = "# Règles extraites : Catan\n\
**Objectif** : Atteindre 10 points de victoire.\n\n\
## Mécaniques principales\n- Commerce\n\n\
## Règles spéciales\n- Voleur\n\n\
## Exemple de tour de jeu\nLancer les dés.";

    const ANALYSIS: &str = "### Analyse des mécaniques\n\
- **Mécaniques** : commerce, placement de tuiles, gestion de ressources.\n\
- **Complexité** : 3/5 (1=simple, 5=expert)\n\
- **Points forts** :\n  - Interaction";

    const VARIANTS: &str = "### Variante 1 : Marché noir\n**Description** : …\n\n\
### Variante 2 : Îles\n**Description** : …\n\n\
### Variante 3 : Solo\n**Description** : …";

    fn output(rules: &str, analysis: &str, variants: &str) -> WorkflowOutput {
        WorkflowOutput {
            raw_text: "texte".into(),
            structured_rules: rules.into(),
            analysis: analysis.into(),
            variants: variants.into(),
            document: String::new(),
        }
    }

    #[test]
    fn well_formed_output_is_clean() {
        let report = validate_output(&output(RULES, ANALYSIS, VARIANTS));
        assert!(report.is_clean(), "warnings: {:?}", report.warnings);
        assert_eq!(report.game_title.as_deref(), Some("Catan"));
        assert!(report.has_objective);
        assert_eq!(
            report.mechanics,
            vec!["commerce", "placement de tuiles", "gestion de ressources"]
        );
        assert_eq!(report.complexity, Some(3));
        assert_eq!(report.variant_count, 3);
    }

    #[test]
    fn two_variants_is_a_warning_not_an_error() {
        let two = "### Variante 1 : A\n\n### Variante 2 : B";
        let report = validate_output(&output(RULES, ANALYSIS, two));
        assert_eq!(report.variant_count, 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("found 2"));
    }

    #[test]
    fn out_of_range_complexity_is_reported() {
        assert_eq!(parse_complexity("**Complexité** : 7/5"), Some(7));
        let report = validate_output(&output(
            RULES,
            "**Mécaniques** : dés\n**Complexité** : 7/5",
            VARIANTS,
        ));
        assert!(report.warnings.iter().any(|w| w.contains("outside")));
    }

    #[test]
    fn missing_everything_collects_warnings() {
        let report = validate_output(&output("du texte libre", "rien", "rien"));
        assert!(report.game_title.is_none());
        assert!(!report.has_objective);
        assert_eq!(report.missing_sections.len(), RULES_SECTIONS.len());
        assert!(report.mechanics.is_empty());
        assert!(report.complexity.is_none());
        assert_eq!(report.variant_count, 0);
        // title, objective, 3 sections, mechanics, complexity, variants
        assert_eq!(report.warnings.len(), 8);
    }

    #[test]
    fn variant_headings_must_start_a_line() {
        assert_eq!(count_variants("voir ### Variante 1 plus haut"), 0);
        assert_eq!(count_variants("### variante 1 : minuscule"), 1);
    }
}
