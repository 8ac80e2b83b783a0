//! Built-in authoring typo table
//!
//! Patterns are matched per line of the structure fragment. Descriptions name
//! the intended construct so a rejection reads as a fix hint.

use super::rules::LintRule;

pub fn get_default_rules() -> Vec<LintRule> {
    vec![
        // ========================================================================
        // Attribute names
        // ========================================================================
        LintRule::new(
            "attr-class-clas",
            r"(?i)\bclas\s*=",
            "class attribute typo (`clas=`)",
        ),
        LintRule::new(
            "attr-class-transposed",
            r"(?i)\b(?:calss|clss|classs|lcass)\s*=",
            "class attribute typo",
        ),
        LintRule::new(
            "attr-style-typo",
            r"(?i)\b(?:sytle|stlye|styel|stye)\s*=",
            "style attribute typo",
        ),
        LintRule::new(
            "attr-href-typo",
            r"(?i)\b(?:herf|hrf|hreff)\s*=",
            "href attribute typo",
        ),
        LintRule::new(
            "attr-src-typo",
            r"(?i)\s(?:scr|srcc)\s*=",
            "src attribute typo",
        ),
        LintRule::new("attr-id-typo", r"(?i)\sidd\s*=", "id attribute typo"),
        LintRule::new(
            "attr-type-typo",
            r"(?i)\b(?:tpye|tyep)\s*=",
            "type attribute typo",
        ),
        LintRule::new(
            "attr-onclick-typo",
            r"(?i)\b(?:onlick|onclik|onclcik|onckick)\s*=",
            "onclick handler attribute typo",
        ),
        // ========================================================================
        // Element names
        // ========================================================================
        LintRule::new(
            "tag-script-typo",
            r"(?i)<\s*/?\s*(?:scirpt|sript|scipt|scritp)\b",
            "script element typo",
        ),
        LintRule::new(
            "tag-div-typo",
            r"(?i)<\s*/?\s*(?:dvi|idv)\b",
            "div element typo",
        ),
        LintRule::new(
            "tag-button-typo",
            r"(?i)<\s*/?\s*(?:buton|butotn|buttom|botton)\b",
            "button element typo",
        ),
        LintRule::new(
            "tag-input-typo",
            r"(?i)<\s*(?:inupt|imput|inptu)\b",
            "input element typo",
        ),
        // ========================================================================
        // Attribute syntax
        // ========================================================================
        LintRule::new(
            "attr-doubled-quote",
            r#"=\s*""[^\s>/]"#,
            "doubled quote opening an attribute value",
        ),
        LintRule::new(
            "attr-missing-equals",
            r#"<[^>]*\s(?:class|id|style)\s+""#,
            "missing `=` after attribute name",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_rules_compile_with_unique_ids() {
        let rules = get_default_rules();
        let mut ids = HashSet::new();
        for rule in &rules {
            assert!(rule.compile().is_ok(), "rule {} failed to compile", rule.id);
            assert!(ids.insert(rule.id.clone()), "duplicate id {}", rule.id);
        }
    }

    #[test]
    fn test_correct_markup_matches_nothing() {
        let markup = r#"<div class="card" id="q1" style="color:red"><a href="/x">x</a><img src="a.png"><button type="button" onclick="go()">Go</button><input class=""></div><script src="x.js"></script>"#;
        for rule in get_default_rules() {
            let re = rule.compile().unwrap();
            assert!(!re.is_match(markup), "rule {} matched valid markup", rule.id);
        }
    }
}
