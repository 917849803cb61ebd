use std::sync::LazyLock;

use regex::Regex;

use crate::record::{AbilityKey, Skill};

static SIGNED_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[+-]\d+").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Ability modifier → score: `10 + 2 × modifier`. Unparseable or overflowing input is 0.
pub fn modifier_to_score(token: &str) -> i64 {
    parse_int(token)
        .and_then(|m| m.checked_mul(2))
        .and_then(|m| m.checked_add(10))
        .unwrap_or(0)
}

/// Parse a signed integer token such as `+5`, `-2` or `12`.
pub fn parse_int(token: &str) -> Option<i64> {
    token.trim().parse::<i64>().ok()
}

/// First `[+-]\d+` token in the text, or 0.
pub fn first_signed_int(text: &str) -> i64 {
    SIGNED_INT_RE
        .find(text)
        .and_then(|m| parse_int(m.as_str()))
        .unwrap_or(0)
}

/// Render a modifier with an explicit sign: `+9`, `-1`, `+0`.
pub fn format_modifier(m: i64) -> String {
    if m >= 0 {
        format!("+{}", m)
    } else {
        m.to_string()
    }
}

pub fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(s.trim(), " ").to_string()
}

/// Split a "Athletics +31 (notes)" style token into name, modifier and notes.
///
/// The modifier is the last signed integer not glued to a following letter
/// (`+2d6` is a dice expression, not a modifier).
/// Trailing text opening a bracket it never closes stays with the name, as does
/// the tail of a parenthetical that the modifier split in two. Anything else
/// after the modifier becomes notes.
pub fn parse_name_modifier(text: &str) -> Skill {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Skill::default();
    }

    let last = SIGNED_INT_RE
        .find_iter(trimmed)
        .filter(|m| !trimmed[m.end()..].starts_with(char::is_alphabetic))
        .last();
    let Some(m) = last else {
        return Skill {
            name: collapse_ws(trimmed),
            modifier: 0,
            notes: None,
        };
    };

    let modifier = parse_int(m.as_str()).unwrap_or(0);
    let mut name = trimmed[..m.start()].trim().to_string();
    let mut trailing = trimmed[m.end()..].trim().to_string();

    if !trailing.is_empty() {
        if opens_unclosed(&trailing) {
            name = if name.is_empty() {
                trailing
            } else {
                format!("{} {}", name, trailing)
            };
            trailing = String::new();
        } else if name.ends_with('(') && trailing.ends_with(')') {
            name = format!("{}{}", name, trailing);
            trailing = String::new();
        }
    }

    Skill {
        name: collapse_ws(&name),
        modifier,
        notes: if trailing.is_empty() {
            None
        } else {
            Some(collapse_ws(&trailing))
        },
    }
}

fn opens_unclosed(s: &str) -> bool {
    let close = match s.chars().next() {
        Some('(') => ')',
        Some('[') => ']',
        _ => return false,
    };
    !s.contains(close)
}

/// Case-insensitive full-name/abbreviation lookup for the six ability keys.
pub fn ability_key(token: &str) -> Option<AbilityKey> {
    let key = match token.to_lowercase().as_str() {
        "str" | "strength" => AbilityKey::Str,
        "dex" | "dexterity" => AbilityKey::Dex,
        "con" | "constitution" => AbilityKey::Con,
        "int" | "intelligence" => AbilityKey::Int,
        "wis" | "wisdom" => AbilityKey::Wis,
        "cha" | "charisma" => AbilityKey::Cha,
        _ => return None,
    };
    Some(key)
}

/// Uppercase the first character, leave the rest alone.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Comma-separated list, trimmed, empties dropped.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
