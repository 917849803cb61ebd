//! Just enough markup scanning to pull stat-block paragraphs out of a page.
//! Not a general HTML parser: elements are found by class token and closed by
//! counting nested tags of the same name.

use std::sync::LazyLock;

use regex::Regex;

use crate::fragment::{ActionGlyph, Fragment};

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<([a-zA-Z][a-zA-Z0-9-]*)((?:\s[^>]*)?)>").unwrap());
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());
static STRONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<strong\b[^>]*>(.*?)</strong\s*>").unwrap());
static ARIA_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*\baria-label\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#\d+|[a-zA-Z]+);").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// An element located in a page: its tag name, raw attribute text and inner markup.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    pub tag: &'a str,
    pub attrs: &'a str,
    pub inner: &'a str,
}

impl<'a> Element<'a> {
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        attr(self.attrs, name)
    }

    pub fn text(&self) -> String {
        text_content(self.inner)
    }
}

/// Every element whose `class` attribute contains `class` as a whole token.
pub fn find_by_class<'a>(html: &'a str, class: &str) -> Vec<Element<'a>> {
    OPEN_TAG_RE
        .captures_iter(html)
        .filter(|caps| {
            attr(caps.get(2).map_or("", |m| m.as_str()), "class")
                .is_some_and(|c| c.split_whitespace().any(|t| t == class))
        })
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tag = caps.get(1)?.as_str();
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            let inner = if is_void(tag) || attrs.trim_end().ends_with('/') {
                ""
            } else {
                inner_until_close(html, tag, whole.end())
            };
            Some(Element { tag, attrs, inner })
        })
        .collect()
}

pub fn find_first_by_class<'a>(html: &'a str, class: &str) -> Option<Element<'a>> {
    find_by_class(html, class).into_iter().next()
}

/// Inner markup of every `<tag>` in `html`, in document order.
pub fn children_by_tag<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    OPEN_TAG_RE
        .captures_iter(html)
        .filter(|caps| caps[1].eq_ignore_ascii_case(tag))
        .filter_map(|caps| caps.get(0))
        .map(|m| inner_until_close(html, tag, m.end()))
        .collect()
}

fn is_void(tag: &str) -> bool {
    VOID_TAGS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Markup between an opening tag ending at `from` and its matching close tag.
/// An unclosed element runs to the end of the document.
fn inner_until_close<'a>(html: &'a str, tag: &str, from: usize) -> &'a str {
    let pattern = format!(r"(?is)<(/?){}\b[^>]*>", regex::escape(tag));
    let Ok(re) = Regex::new(&pattern) else {
        return &html[from..];
    };

    let mut depth = 1usize;
    for caps in re.captures_iter(&html[from..]) {
        let Some(m) = caps.get(0) else { continue };
        if caps[1].is_empty() {
            if !m.as_str().ends_with("/>") {
                depth += 1;
            }
        } else {
            depth -= 1;
            if depth == 0 {
                return &html[from..from + m.start()];
            }
        }
    }
    &html[from..]
}

pub fn attr<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
    })
}

/// Text of a markup fragment: tags removed, entities decoded, non-breaking
/// spaces and en/em dashes normalized, whitespace collapsed.
pub fn text_content(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, "");
    let decoded = decode_entities(&without_tags);
    let normalized = decoded
        .replace('\u{a0}', " ")
        .replace(['\u{2013}', '\u{2014}'], "-");
    WS_RE.replace_all(normalized.trim(), " ").to_string()
}

pub fn decode_entities(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .to_string()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        "times" => '\u{d7}',
        _ => return None,
    };
    Some(c)
}

/// Action cost of a paragraph: first `aria-label` on a span, then icon classes.
pub fn action_glyph(html: &str) -> ActionGlyph {
    let aria = ARIA_SPAN_RE
        .captures(html)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .and_then(|m| ActionGlyph::from_aria_label(m.as_str()));
    if let Some(glyph) = aria {
        return glyph;
    }

    let classes = class_tokens(html);
    ["one-action-icon", "two-action-icon", "three-action-icon", "reaction-icon", "free-action-icon"]
        .iter()
        .find(|icon| classes.iter().any(|c| c.as_str() == **icon))
        .and_then(|icon| ActionGlyph::from_icon_class(icon))
        .unwrap_or_default()
}

/// Any element whose class mentions `-action-icon`.
pub fn has_action_icon(html: &str) -> bool {
    class_tokens(html).iter().any(|c| c.contains("-action-icon"))
}

fn class_tokens(html: &str) -> Vec<String> {
    OPEN_TAG_RE
        .captures_iter(html)
        .filter_map(|caps| attr(caps.get(2).map_or("", |m| m.as_str()), "class").map(str::to_string))
        .flat_map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Stat-block fragments: every `<p>` carrying a `<strong>` label, in document order.
pub fn fragments_from_html(html: &str) -> Vec<Fragment> {
    PARAGRAPH_RE
        .captures_iter(html)
        .filter_map(|caps| paragraph_fragment(&caps[1]))
        .collect()
}

fn paragraph_fragment(inner: &str) -> Option<Fragment> {
    let strong = STRONG_RE.captures(inner)?;
    let label = text_content(&strong[1]);
    if label.is_empty() {
        return None;
    }
    Some(Fragment {
        label,
        raw_text: text_content(inner),
        has_action_glyph: has_action_icon(inner),
        glyph: action_glyph(inner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_element_by_class() {
        let html = r#"<div class="outer page-inner-holder"><div><p>a</p></div><p>b</p></div><p>c</p>"#;
        let el = find_first_by_class(html, "page-inner-holder").unwrap();
        assert_eq!(el.tag, "div");
        assert_eq!(el.inner, "<div><p>a</p></div><p>b</p>");
        assert!(find_first_by_class(html, "page-inner").is_none());
    }

    #[test]
    fn void_elements_have_attrs_only() {
        let html = r#"<img class="elem-disp-header-thumb-img-page" src='/img/dragon.png'>"#;
        let el = find_first_by_class(html, "elem-disp-header-thumb-img-page").unwrap();
        assert_eq!(el.attr("src"), Some("/img/dragon.png"));
        assert_eq!(el.inner, "");
    }

    #[test]
    fn text_is_normalized() {
        let t = text_content("<b>Fort</b>&nbsp;+9,\n  Ref &#8211;2 &amp; Will&mdash;1 &bogus;");
        assert_eq!(t, "Fort +9, Ref -2 & Will-1 &bogus;");
    }

    #[test]
    fn paragraphs_without_label_are_skipped() {
        let html = "<p>flavor text</p><p><strong>AC</strong> 19; Fort +9</p><p><strong> </strong>x</p>";
        let frags = fragments_from_html(html);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].label, "AC");
        assert_eq!(frags[0].raw_text, "AC 19; Fort +9");
    }

    #[test]
    fn glyph_from_aria_label_then_class() {
        let p = r#"<strong>Jaws</strong> <span aria-label="Two Actions" class="action"></span> jaws +23"#;
        assert_eq!(action_glyph(p), ActionGlyph::Two);
        assert!(!has_action_icon(p));

        let p = r#"<strong>Tail</strong> <span class="icon one-action-icon"></span> tail +20"#;
        assert_eq!(action_glyph(p), ActionGlyph::One);
        assert!(has_action_icon(p));

        let p = r#"<strong>Wing Deflection</strong> <i class="reaction-icon"></i>"#;
        assert_eq!(action_glyph(p), ActionGlyph::Reaction);
        assert!(!has_action_icon(p));

        assert_eq!(action_glyph("<strong>AC</strong> 19"), ActionGlyph::None);
    }

    #[test]
    fn buttons_inside_trait_tags() {
        let html = r#"<span class="trait-tag"><button>Huge</button></span><span class="trait-tag"><button> Dragon </button></span>"#;
        let traits: Vec<String> = find_by_class(html, "trait-tag")
            .iter()
            .flat_map(|el| children_by_tag(el.inner, "button"))
            .map(text_content)
            .collect();
        assert_eq!(traits, vec!["Huge".to_string(), "Dragon".to_string()]);
    }
}
