use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Canonical form of a posting description: tags removed, whitespace runs
/// collapsed to one space, lowercased, trimmed. Idempotent.
pub fn normalize(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    let collapsed = WHITESPACE_RE.replace_all(&without_tags, " ");
    collapsed.to_lowercase().trim().to_string()
}

/// A missing description stays missing; the caller drops the document.
pub fn normalize_opt(raw: Option<&str>) -> Option<String> {
    raw.map(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_tags_and_whitespace() {
        assert_eq!(
            normalize("  <p>Senior <b>Python</b>\n\tDeveloper</p>  "),
            "senior python developer"
        );
    }

    #[test]
    fn test_tags_become_separators() {
        assert_eq!(normalize("SQL<br/>Excel"), "sql excel");
    }

    #[test]
    fn test_unclosed_angle_bracket_is_kept() {
        assert_eq!(normalize("a < b and c"), "a < b and c");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "<div>Power   BI</div>",
            "a<<b>c>d",
            "x <y",
            "Docker\u{00A0}&\u{2003}Kubernetes",
            "ÜBER <i>Scikit-Learn</i>\r\n",
        ];
        for raw in samples {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_missing_description_stays_missing() {
        assert_eq!(normalize_opt(None), None);
        assert_eq!(normalize_opt(Some(" AWS ")), Some("aws".to_string()));
    }
}
