use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::fragment::{ActionGlyph, Fragment};

static ABILITY_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(str|dex|con|int|wis|cha|strength|dexterity|constitution|intelligence|wisdom|charisma)\b").unwrap()
});
static REACTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)reaction").unwrap());
static SPELL_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(arcane|divine|occult|primal).*spells|focus spells|rituals|cantrips").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Abilities,
    Ac,
    Hp,
    Skills,
    Perception,
    Speed,
    Attack,
    Action,
    Reaction,
    Languages,
    Immunities,
    Weaknesses,
    Resistances,
    SpellBlock,
    GenericTrait,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

type Predicate = fn(&Fragment) -> bool;

/// Ordered classification rules. First match wins; no match is a generic trait.
pub const RULES: &[(Predicate, SectionKind)] = &[
    (is_ability_line, SectionKind::Abilities),
    (has_reaction_indicator, SectionKind::Reaction),
    (is_glyph_strike, SectionKind::Attack),
    (has_action_glyph, SectionKind::Action),
    (is_strike_label, SectionKind::Attack),
    (is_perception, SectionKind::Perception),
    (is_languages, SectionKind::Languages),
    (is_skills, SectionKind::Skills),
    (is_ac, SectionKind::Ac),
    (is_hp, SectionKind::Hp),
    (is_immunities, SectionKind::Immunities),
    (is_weaknesses, SectionKind::Weaknesses),
    (is_resistances, SectionKind::Resistances),
    (is_speed, SectionKind::Speed),
    (is_spell_block, SectionKind::SpellBlock),
];

pub fn classify(fragment: &Fragment) -> SectionKind {
    RULES
        .iter()
        .find(|(matches, _)| matches(fragment))
        .map(|(_, kind)| *kind)
        .unwrap_or(SectionKind::GenericTrait)
}

fn label_is(f: &Fragment, key: &str) -> bool {
    f.label.trim().eq_ignore_ascii_case(key)
}

fn is_perception(f: &Fragment) -> bool {
    label_is(f, "Perception")
}

fn is_languages(f: &Fragment) -> bool {
    label_is(f, "Languages")
}

fn is_skills(f: &Fragment) -> bool {
    label_is(f, "Skills")
}

fn is_ac(f: &Fragment) -> bool {
    label_is(f, "AC")
}

fn is_hp(f: &Fragment) -> bool {
    label_is(f, "HP")
}

fn is_immunities(f: &Fragment) -> bool {
    label_is(f, "Immunities")
}

fn is_weaknesses(f: &Fragment) -> bool {
    label_is(f, "Weaknesses")
}

fn is_resistances(f: &Fragment) -> bool {
    label_is(f, "Resistances")
}

fn is_speed(f: &Fragment) -> bool {
    label_is(f, "Speed")
}

fn has_action_glyph(f: &Fragment) -> bool {
    f.has_action_glyph
}

fn is_glyph_strike(f: &Fragment) -> bool {
    f.has_action_glyph && is_strike_label(f)
}

fn is_ability_line(f: &Fragment) -> bool {
    ABILITY_LABEL_RE.is_match(f.label.trim())
}

fn has_reaction_indicator(f: &Fragment) -> bool {
    f.glyph == ActionGlyph::Reaction || REACTION_RE.is_match(&f.raw_text)
}

fn is_strike_label(f: &Fragment) -> bool {
    let label = f.label.trim();
    label.eq_ignore_ascii_case("Melee") || label.eq_ignore_ascii_case("Ranged")
}

fn is_spell_block(f: &Fragment) -> bool {
    SPELL_LABEL_RE.is_match(&f.label)
}
