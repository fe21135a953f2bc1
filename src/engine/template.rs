//! Replacement templates.
//!
//! A template is free text with `$N` tokens referring to regex capture groups
//! (`$1` is the first group). Tokens are greedy on digits, so `$12` refers to
//! group 12. A token that cannot be resolved (`$0`, an index past the last
//! group, or a `$` with no digits after it) is copied to the output verbatim
//! instead of failing.

/// Render `template` against `captures`, where `captures[0]` is the whole
/// match and is never substituted.
pub(crate) fn substitute(template: &str, captures: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let token = &after[..digits];

        // Overflowing indices fail to parse and fall through to the literal arm.
        match token.parse::<usize>() {
            Ok(idx) if idx > 0 && idx < captures.len() => out.push_str(captures[idx]),
            _ => {
                out.push('$');
                out.push_str(token);
            }
        }
        rest = &after[digits..];
    }

    out.push_str(rest);
    out
}

/// Derive one record field.
///
/// A configured template wins; otherwise capture group `fallback` is used when
/// the regex has that many groups. The value is trimmed and an empty result is
/// reported as unset.
pub(crate) fn derive_field(template: Option<&str>, captures: &[&str], fallback: Option<usize>) -> Option<String> {
    let value = match template {
        Some(template) => substitute(template, captures),
        None => captures.get(fallback?)?.to_string(),
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CAPS: [&str; 3] = ["full", "Chrome", "99"];

    #[test]
    fn substitutes_each_token() {
        assert_eq!(substitute("$1 $2", &CAPS), "Chrome 99");
        assert_eq!(substitute("$2-$1-$2", &CAPS), "99-Chrome-99");
        assert_eq!(substitute("Mobile $1", &CAPS), "Mobile Chrome");
    }

    #[test]
    fn unresolvable_tokens_stay_literal() {
        assert_eq!(substitute("$9", &CAPS), "$9");
        assert_eq!(substitute("$0", &CAPS), "$0");
        assert_eq!(substitute("$3", &CAPS), "$3");
        assert_eq!(substitute("cost: $", &CAPS), "cost: $");
        assert_eq!(substitute("$x$1", &CAPS), "$xChrome");
        assert_eq!(substitute("$99999999999999999999999", &CAPS), "$99999999999999999999999");
    }

    #[test]
    fn dollar_is_not_an_escape() {
        assert_eq!(substitute("$$1", &CAPS), "$Chrome");
        assert_eq!(substitute("$$", &CAPS), "$$");
    }

    #[test]
    fn tokens_are_greedy_on_digits() {
        let caps: Vec<String> = (0..13).map(|i| format!("g{i}")).collect();
        let caps: Vec<&str> = caps.iter().map(String::as_str).collect();
        assert_eq!(substitute("$12", &caps), "g12");
        assert_eq!(substitute("$1.$2", &caps), "g1.g2");

        // Against three groups `$12` is out of range as a whole, not `$1` + "2".
        assert_eq!(substitute("$12", &CAPS), "$12");
    }

    #[test]
    fn non_ascii_text_passes_through() {
        assert_eq!(substitute("Яндекс $1 ✓", &CAPS), "Яндекс Chrome ✓");
    }

    #[test]
    fn derive_field_prefers_template_then_group() {
        assert_eq!(derive_field(Some("$1 Mobile"), &CAPS, Some(2)).as_deref(), Some("Chrome Mobile"));
        assert_eq!(derive_field(None, &CAPS, Some(2)).as_deref(), Some("99"));
        assert_eq!(derive_field(None, &CAPS, Some(3)), None);
        assert_eq!(derive_field(None, &CAPS, None), None);
    }

    #[test]
    fn derive_field_trims_and_drops_empty() {
        let caps = ["x", "  Edge ", "", "   "];
        assert_eq!(derive_field(None, &caps, Some(1)).as_deref(), Some("Edge"));
        assert_eq!(derive_field(None, &caps, Some(2)), None);
        assert_eq!(derive_field(Some("$3"), &caps, None), None);
        assert_eq!(derive_field(Some(" $1 $2"), &caps, None).as_deref(), Some("Edge"));
    }

    proptest! {
        #[test]
        fn text_without_dollar_is_unchanged(template in "[^$]*", caps in prop::collection::vec(".*", 0..4)) {
            let caps: Vec<&str> = caps.iter().map(String::as_str).collect();
            prop_assert_eq!(substitute(&template, &caps), template);
        }

        #[test]
        fn arbitrary_templates_render(template in ".*", caps in prop::collection::vec("[a-z]*", 0..4)) {
            let caps: Vec<&str> = caps.iter().map(String::as_str).collect();
            let rendered = substitute(&template, &caps);
            prop_assert!(rendered.matches('$').count() <= template.matches('$').count());
        }
    }
}
