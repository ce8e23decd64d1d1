//! Tolerant HTML helpers for the menu page.
//!
//! Only what the menu page needs: select `div` elements by class (optionally
//! nested inside a container class), strip tags, decode the common entities and
//! collapse whitespace. Attribute order, quoting style and tag case do not matter.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

fn div_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<(/?)div\b([^>]*)>").expect("valid div regex"))
}

fn class_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
            .expect("valid class regex")
    })
}

/// Regions whose content is not markup: comments, script and style bodies.
/// An unterminated region runs to the end of the document.
fn opaque_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<!--.*?(?:-->|\z)|<script\b[^>]*>.*?(?:</script\s*>|\z)|<style\b[^>]*>.*?(?:</style\s*>|\z)",
        )
        .expect("valid opaque region regex")
    })
}

fn any_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex"))
}

struct Frame {
    content_start: usize,
    is_block: bool,
    inside_container: bool,
}

/// Blanks out opaque regions with spaces of the same byte length, so offsets
/// into the result are valid offsets into `html`.
fn mask_opaque_regions(html: &str) -> Cow<'_, str> {
    if !opaque_re().is_match(html) {
        return Cow::Borrowed(html);
    }

    let mut masked = String::with_capacity(html.len());
    let mut last = 0;
    for m in opaque_re().find_iter(html) {
        masked.push_str(&html[last..m.start()]);
        masked.extend(std::iter::repeat(' ').take(m.len()));
        last = m.end();
    }
    masked.push_str(&html[last..]);
    Cow::Owned(masked)
}

fn has_class(attrs: &str, class: &str) -> bool {
    class_attr_re().captures(attrs).is_some_and(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .is_some_and(|m| m.as_str().split_whitespace().any(|c| c == class))
    })
}

/// Returns the inner HTML of every `div.<block_class>` that is a descendant of a
/// `div.<container_class>`, in document order. An empty `container_class`
/// selects blocks anywhere in the document. Div tags inside comments, scripts
/// and styles are ignored.
pub fn select_div_blocks<'a>(html: &'a str, container_class: &str, block_class: &str) -> Vec<&'a str> {
    let masked = mask_opaque_regions(html);
    let mut stack: Vec<Frame> = Vec::new();
    let mut found: Vec<(usize, &'a str)> = Vec::new();

    for caps in div_tag_re().captures_iter(&masked) {
        let (Some(whole), Some(slash), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        if slash.as_str().is_empty() {
            let attrs = attrs.as_str();
            // <div ... /> 沒有內容
            if attrs.trim_end().ends_with('/') {
                continue;
            }
            let parent_inside = stack.last().is_some_and(|f| f.inside_container);
            let is_container = !container_class.is_empty() && has_class(attrs, container_class);
            stack.push(Frame {
                content_start: whole.end(),
                // 區塊本身必須位於容器之內
                is_block: has_class(attrs, block_class) && (container_class.is_empty() || parent_inside),
                inside_container: parent_inside || is_container,
            });
        } else if let Some(frame) = stack.pop() {
            if frame.is_block {
                found.push((frame.content_start, &html[frame.content_start..whole.start()]));
            }
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, inner)| inner).collect()
}

pub fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(name)
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "auml" => 'ä',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "Auml" => 'Ä',
        "Ouml" => 'Ö',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        "eacute" => 'é',
        "egrave" => 'è',
        "ograve" => 'ò',
        "euro" => '€',
        _ => return None,
    };
    Some(c)
}

/// Tags, comments and script/style bodies become spaces so adjacent cells do
/// not glue together; runs of whitespace collapse to one space.
pub fn to_text(fragment: &str) -> String {
    let without_opaque = opaque_re().replace_all(fragment, " ");
    let stripped = any_tag_re().replace_all(&without_opaque, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_nested_blocks() {
        let html = r#"
            <div class="divider">outside</div>
            <div class="content block">
                <div class='divider wide'>first</div>
                <div><div CLASS="divider">second</div></div>
            </div>
        "#;

        let blocks = select_div_blocks(html, "block", "divider");
        assert_eq!(blocks, vec!["first", "second"]);
    }

    #[test]
    fn test_select_without_container() {
        let html = r#"<div class="divider">a</div><section><div class="divider">b</div></section>"#;
        assert_eq!(select_div_blocks(html, "", "divider"), vec!["a", "b"]);
    }

    #[test]
    fn test_nested_inner_divs_stay_in_block() {
        let html = r#"<div class="block"><div class="divider"><div>Mittag</div><div>Suppe</div></div></div>"#;
        let blocks = select_div_blocks(html, "block", "divider");
        assert_eq!(blocks.len(), 1);
        assert_eq!(to_text(blocks[0]), "Mittag Suppe");
    }

    #[test]
    fn test_class_must_match_whole_word() {
        let html = r#"<div class="block"><div class="dividers">x</div></div>"#;
        assert!(select_div_blocks(html, "block", "divider").is_empty());
    }

    #[test]
    fn test_closing_div_in_comment_is_ignored() {
        let html = r#"<div class="block"><!-- old layout </div> --><div class="divider">Donnerstag, 20. Juli – Mittag: Bò Kho Dessert: Obst</div></div>"#;
        let blocks = select_div_blocks(html, "block", "divider");

        assert_eq!(blocks, vec!["Donnerstag, 20. Juli – Mittag: Bò Kho Dessert: Obst"]);
    }

    #[test]
    fn test_closing_div_in_script_is_ignored() {
        let html = r#"<div class="block"><script>var t = "</div>";</script><style>.x:after { content: "</div>"; }</style><div class="divider">Donnerstag, 20. Juli – Mittag: Bò Kho Dessert: Obst</div></div>"#;
        let blocks = select_div_blocks(html, "block", "divider");

        assert_eq!(blocks.len(), 1);
        assert_eq!(to_text(blocks[0]), "Donnerstag, 20. Juli – Mittag: Bò Kho Dessert: Obst");
    }

    #[test]
    fn test_commented_out_block_is_not_selected() {
        let html = r#"<div class="block"><!-- <div class="divider">alt</div> --><div class="divider">neu</div></div>"#;
        assert_eq!(select_div_blocks(html, "block", "divider"), vec!["neu"]);
    }

    #[test]
    fn test_to_text_drops_script_and_comments() {
        let fragment = r#"Mittag:<script>if (a < b) { x = "<b>"; }</script> Suppe <!-- alt: Eintopf --> Dessert"#;
        assert_eq!(to_text(fragment), "Mittag: Suppe Dessert");
    }

    #[test]
    fn test_to_text_decodes_entities() {
        let fragment = "<p>Montag, 17. Juli &ndash; <b>Mittag:</b>&nbsp;K&auml;sesp&#228;tzle</p>";
        assert_eq!(to_text(fragment), "Montag, 17. Juli – Mittag: Käsespätzle");
    }

    #[test]
    fn test_unknown_entity_is_kept() {
        assert_eq!(decode_entities("a &bogus; b &#x2013; c"), "a &bogus; b – c");
    }
}
