// src/common/text.rs

/// Normaliza texto livre para comparação: minúsculas, sem acentos e com
/// espaços internos colapsados. "  São   Paulo " -> "sao paulo".
pub fn fold_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for ch in word.chars().flat_map(char::to_lowercase) {
            out.push(strip_accent(ch));
        }
    }
    out
}

fn strip_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Remove espaços e descarta strings vazias.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_text_removes_accents_and_case() {
        assert_eq!(fold_text("  São   Paulo "), "sao paulo");
        assert_eq!(fold_text("GOIÂNIA"), "goiania");
        assert_eq!(fold_text("Florianópolis"), "florianopolis");
        assert_eq!(fold_text(""), "");
    }

    #[test]
    fn clean_optional_drops_blank_values() {
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" RJ ".into())), Some("RJ".to_string()));
        assert_eq!(clean_optional(None), None);
    }
}
