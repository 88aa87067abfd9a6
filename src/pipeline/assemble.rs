//! Document assembly.

/// Separator placed between the three sections.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Header placed before the variants block.
pub const VARIANTS_HEADER: &str = "## Variantes créatives";

/// Concatenate rules, analysis and variants into the final document.
///
/// `rules ⧺ sep ⧺ analysis ⧺ sep ⧺ header ⧺ "\n\n" ⧺ variants ⧺ "\n"`.
/// Pure and deterministic; inputs are not trimmed or inspected.
pub fn assemble_document(rules: &str, analysis: &str, variants: &str) -> String {
    let mut doc = String::with_capacity(
        rules.len() + analysis.len() + variants.len() + 2 * SECTION_SEPARATOR.len() + 32,
    );
    doc.push_str(rules);
    doc.push_str(SECTION_SEPARATOR);
    doc.push_str(analysis);
    doc.push_str(SECTION_SEPARATOR);
    doc.push_str(VARIANTS_HEADER);
    doc.push_str("\n\n");
    doc.push_str(variants);
    doc.push('\n');
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_literal_layout() {
        let doc = assemble_document("R", "A", "V");
        assert_eq!(doc, "R\n\n---\n\nA\n\n---\n\n## Variantes créatives\n\nV\n");
    }

    #[test]
    fn arbitrary_inputs_follow_the_formula() {
        let cases = [
            (
                "# Règles extraites : Go",
                "### Analyse",
                "### Variante 1 : Blitz",
            ),
            ("a\n\nb", "  spaced  ", "---"),
            ("ünïcödé", "🎲", "x"),
        ];
        for (r, a, v) in cases {
            let expected = format!("{r}\n\n---\n\n{a}\n\n---\n\n## Variantes créatives\n\n{v}\n");
            assert_eq!(assemble_document(r, a, v), expected);
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(
            assemble_document("r", "a", "v"),
            assemble_document("r", "a", "v")
        );
    }
}
