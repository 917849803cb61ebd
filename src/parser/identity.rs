use std::sync::LazyLock;

use regex::Regex;

use super::tokens::capitalize_first;

static ALIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{1,2}$").unwrap());
static LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Creature\s+(-?\d+)").unwrap());

const SIZES: &[&str] = &["Tiny", "Small", "Medium", "Large", "Huge", "Gargantuan"];
const CREATURE_TYPES: &[&str] = &[
    "Aberration", "Animal", "Astral", "Beast", "Celestial", "Construct", "Dragon", "Elemental",
    "Fey", "Fiend", "Fungus", "Giant", "Humanoid", "Monitor", "Ooze", "Plant", "Spirit", "Undead",
];

/// Build the "Large dragon (fire, uncommon)" type line from the header trait tags.
///
/// Size keeps its capital, the creature type and subtypes are lowercased, and
/// one- or two-letter uppercase alignment codes are dropped.
pub fn type_line(traits: &[String]) -> String {
    let traits: Vec<&str> = traits.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();

    let size = traits
        .iter()
        .copied()
        .find(|t| canonical(SIZES, t).is_some());
    let kind = traits
        .iter()
        .copied()
        .find(|t| canonical(CREATURE_TYPES, t).is_some());

    let subtypes: Vec<String> = traits
        .iter()
        .copied()
        .filter(|t| Some(*t) != size && Some(*t) != kind && !ALIGNMENT_RE.is_match(t))
        .map(str::to_lowercase)
        .collect();

    let mut line = String::new();
    if let Some(size) = size.and_then(|s| canonical(SIZES, s)) {
        line.push_str(size);
        line.push(' ');
    }
    line.push_str(&kind.map(str::to_lowercase).unwrap_or_else(|| "creature".to_string()));
    if !subtypes.is_empty() {
        line.push_str(&format!(" ({})", subtypes.join(", ")));
    }
    line.trim().to_string()
}

fn canonical(table: &[&'static str], t: &str) -> Option<&'static str> {
    let cap = capitalize_first(&t.to_lowercase());
    table.iter().copied().find(|entry| *entry == cap)
}

/// "Creature 12" → "12". Negative levels are kept.
pub fn level_from_tag(tag: &str) -> Option<String> {
    LEVEL_RE.captures(tag).map(|c| c[1].to_string())
}
