//! Prompt templates for the three LLM stages.
//!
//! All prompt text lives here so a wording change touches exactly one file
//! and unit tests can inspect the templates without a model. The templates
//! are in French because the generated document is: the assembler adds a
//! literal `## Variantes créatives` header and the model is asked to answer
//! in the same language as the skeleton it is given.
//!
//! Each template has exactly one placeholder. The `*_prompt` functions fill
//! it verbatim; no escaping is applied to the inserted text.

/// Placeholder in [`STRUCTURE_TEMPLATE`].
pub const RULES_PLACEHOLDER: &str = "{regles}";

/// Placeholder in [`ANALYSIS_TEMPLATE`].
pub const STRUCTURED_RULES_PLACEHOLDER: &str = "{regles_structured}";

/// Placeholder in [`VARIANTS_TEMPLATE`].
pub const ANALYSIS_PLACEHOLDER: &str = "{analyse}";

/// Raw PDF text → structured Markdown rules.
pub const STRUCTURE_TEMPLATE: &str = r#"
Tu es un expert en jeux de société. À partir du texte brut suivant extrait d'un PDF de règles,
produis un résumé structuré en Markdown **uniquement** (pas d'introduction, pas de commentaire).

Format attendu :
# Règles extraites : <Titre du jeu>
**Objectif** : <Une phrase résumant le but du jeu>

## Mécaniques principales
- <mécanique 1>
- <mécanique 2>
...

## Règles spéciales
- <règle spéciale 1 si applicable>
...

## Exemple de tour de jeu
<Description d'un tour type si mentionné dans le texte>

Texte brut des règles :
{regles}
"#;

/// Structured rules → mechanics analysis.
pub const ANALYSIS_TEMPLATE: &str = r#"
À partir des règles structurées ci-dessous, produis une analyse en Markdown **uniquement**.

Format attendu :
### Analyse des mécaniques
- **Mécaniques** : <liste séparée par des virgules>
- **Complexité** : <chiffre entre 1 et 5>/5 (1=simple, 5=expert)
- **Points forts** : <liste à puces>
- **Points à améliorer** : <liste à puces>

Règles structurées :
{regles_structured}
"#;

/// Mechanics analysis → three creative variants.
pub const VARIANTS_TEMPLATE: &str = r#"
Tu es un game designer créatif. À partir de l'analyse des mécaniques ci-dessous,
génère exactement 3 variantes créatives en Markdown **uniquement** (pas d'introduction).

Contraintes pour chaque variante :
- Conserver l'esprit du jeu original.
- Ajouter de la rejouabilité OU simplifier l'expérience.
- Être testable sans matériel supplémentaire si possible.

Format attendu pour chaque variante :
### Variante N : <Titre court>
**Description** : <2-3 phrases décrivant la variante>
**Impact** : <Effet sur la durée, la tension ou la complexité>
**Règles modifiées** :
- Ancienne règle : <texte original>
- **Nouvelle règle** : <**texte modifié en gras**>

Analyse des mécaniques :
{analyse}
"#;

/// Fill the structuring template with the raw rules text.
pub fn structure_prompt(raw_text: &str) -> String {
    STRUCTURE_TEMPLATE.replace(RULES_PLACEHOLDER, raw_text)
}

/// Fill the analysis template with the structured rules.
pub fn analysis_prompt(structured_rules: &str) -> String {
    ANALYSIS_TEMPLATE.replace(STRUCTURED_RULES_PLACEHOLDER, structured_rules)
}

/// Fill the variants template with the mechanics analysis.
pub fn variants_prompt(analysis: &str) -> String {
    VARIANTS_TEMPLATE.replace(ANALYSIS_PLACEHOLDER, analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_template_has_exactly_one_placeholder() {
        assert_eq!(STRUCTURE_TEMPLATE.matches(RULES_PLACEHOLDER).count(), 1);
        assert_eq!(
            ANALYSIS_TEMPLATE.matches(STRUCTURED_RULES_PLACEHOLDER).count(),
            1
        );
        assert_eq!(VARIANTS_TEMPLATE.matches(ANALYSIS_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn structure_prompt_inserts_text_verbatim() {
        let p = structure_prompt("Objectif : {collecter} 10 points");
        assert!(p.contains("Objectif : {collecter} 10 points"));
        assert!(!p.contains(RULES_PLACEHOLDER));
        assert!(p.contains("# Règles extraites"));
    }

    #[test]
    fn analysis_prompt_asks_for_rating_out_of_five() {
        let p = analysis_prompt("# Règles extraites : Test");
        assert!(p.contains("/5"));
        assert!(p.ends_with("# Règles extraites : Test\n"));
    }

    #[test]
    fn variants_prompt_requires_three_variants() {
        let p = variants_prompt("### Analyse des mécaniques");
        assert!(p.contains("exactement 3 variantes"));
        assert!(p.contains("### Variante N"));
        assert!(!p.contains(ANALYSIS_PLACEHOLDER));
    }
}
