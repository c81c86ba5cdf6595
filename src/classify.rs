//! Keyword-based classification of bank statement descriptions
//!
//! Classification is informative labeling only: a classified entry is
//! presumed to be a bank fee/tax/interest item with no book-side counterpart
//! and is disqualified from automatic matching, but categories never
//! influence the matching arithmetic itself.

use serde::{Deserialize, Serialize};

/// One category with its trigger keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    /// Matched case-insensitively as substrings of the description
    pub keywords: Vec<String>,
}

/// Ordered classification rules; first matching category wins
///
/// The order is caller-defined and stable, so the same description and the
/// same rules always produce the same category. Rule changes take effect on
/// the next classification call only; already-classified entries keep their
/// category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
}

impl CategoryRules {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// No rules; every description stays unclassified
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stock rule set for common bank expense descriptions
    ///
    /// Keyword spellings target Spanish-language bank statements, the
    /// documents this engine was built against.
    pub fn bank_expense_defaults() -> Self {
        let rule = |category: &str, keywords: &[&str]| CategoryRule {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        Self::new(vec![
            rule("Maintenance", &["MANT", "CUENTA", "PAQUETE", "COMISION SERV"]),
            rule(
                "Taxes",
                &[
                    "IMPUESTO",
                    "LEY 25413",
                    "PERCEPCION",
                    "RETENCION",
                    "SELLOS",
                    "TASAS",
                    "SIRCREB",
                ],
            ),
            rule("VAT", &["IVA VENTAS", "IVA DEBITO", "IVA 21", "IVA 10.5"]),
            rule(
                "Bank commissions",
                &["COMISION", "CARGO", "GASTO EMISION", "MOVIMIENTO"],
            ),
            rule("Interest", &["INTERES", "INT. PAGO", "FINANCIACION"]),
        ])
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Classify a description; `None` means unclassified
    pub fn classify(&self, description: &str) -> Option<&str> {
        let upper = description.to_uppercase();
        self.rules
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|keyword| upper.contains(&keyword.to_uppercase()))
            })
            .map(|rule| rule.category.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CategoryRules {
        CategoryRules::new(vec![
            CategoryRule {
                category: "Taxes".to_string(),
                keywords: vec!["IMPUESTO".to_string(), "RETENCION".to_string()],
            },
            CategoryRule {
                category: "Bank commissions".to_string(),
                keywords: vec!["COMISION".to_string()],
            },
        ])
    }

    #[test]
    fn matches_case_insensitive_substring() {
        assert_eq!(
            rules().classify("impuesto ley 25413 debito"),
            Some("Taxes")
        );
        assert_eq!(rules().classify("Comision transferencia"), Some("Bank commissions"));
    }

    #[test]
    fn unmatched_description_is_unclassified() {
        assert_eq!(rules().classify("Customer deposit 1234"), None);
    }

    #[test]
    fn first_matching_category_wins() {
        // Matches both rule sets; the earlier rule takes it.
        assert_eq!(
            rules().classify("RETENCION POR COMISION"),
            Some("Taxes")
        );
    }

    #[test]
    fn classification_is_stable() {
        let r = rules();
        let first = r.classify("COMISION MANTENIMIENTO");
        for _ in 0..10 {
            assert_eq!(r.classify("COMISION MANTENIMIENTO"), first);
        }
    }

    #[test]
    fn default_rule_set_covers_known_bank_expenses() {
        let defaults = CategoryRules::bank_expense_defaults();
        assert_eq!(defaults.classify("IMPUESTO LEY 25413"), Some("Taxes"));
        assert_eq!(defaults.classify("INT. PAGO FINANCIACION"), Some("Interest"));
        assert_eq!(defaults.classify("Transferencia recibida"), None);
    }
}
