// src/domain/text.rs

use deunicode::deunicode;

/// Folds diacritics to ASCII and lower-cases, so "Citroën" matches "citroen".
pub fn normalize(s: &str) -> String {
    deunicode(s).to_lowercase()
}
