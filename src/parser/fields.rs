use std::sync::LazyLock;

use regex::Regex;

use super::classify::SectionKind;
use super::tokens::{
    ability_key, capitalize_first, first_signed_int, modifier_to_score, parse_int,
    parse_name_modifier, split_list,
};
use crate::fragment::Fragment;
use crate::record::{AbilityKey, Entry, Save, SaveName, Skill};

static ABILITY_CHUNK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)\s*([+-]?\d+)").unwrap());
static AC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"AC\s+(\d+)").unwrap());
static SAVES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Fort\s*([+-]\d+)[,;]?\s*Ref\s*([+-]\d+)[,;]?\s*Will\s*([+-]\d+)").unwrap()
});
static AFTER_SEMI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*(.*)$").unwrap());
static HP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"HP\s+(\d+)").unwrap());
static HARDNESS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Hardness\s+(\d+)").unwrap());
static REGEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Regeneration\s+([^;]+)").unwrap());
static FAST_HEALING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Fast Healing\s+([^;]+)").unwrap());
static HP_IMMUNITIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Immunities\s+([^;]+)").unwrap());
static HP_WEAKNESSES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Weaknesses\s+([^;]+)").unwrap());
static HP_RESISTANCES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Resistances\s+([^;]+)").unwrap());
static FEET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfeet\b").unwrap());
static STRIKE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(Melee|Ranged)\s*").unwrap());
static WEAPON_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^(+;]+?)(?:\s*[+;(]|$)").unwrap());
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// One change to the record, produced by a field parser and applied by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Added to senses unless a Perception entry already exists.
    PerceptionSense(String),
    Initiative(i64),
    Languages(Vec<String>),
    Skills(Vec<Skill>),
    Ability(AbilityKey, i64),
    AcValue(i64),
    AcNotes(String),
    Saves(Vec<Save>),
    HpValue(i64),
    HpNotes(String),
    Immunities(Vec<String>),
    Weaknesses(Vec<String>),
    Resistances(Vec<String>),
    Speed(Vec<String>),
    Action(Entry),
    Reaction(Entry),
    Description(String),
    Trait(Entry),
}

/// Run the parser for `kind` over one fragment.
pub fn parse(kind: SectionKind, fragment: &Fragment) -> Vec<FieldUpdate> {
    let value = fragment.value_text();
    match kind {
        SectionKind::Perception => perception(fragment, &value),
        SectionKind::Languages => vec![FieldUpdate::Languages(split_list(&value))],
        SectionKind::Skills => skills(&value),
        SectionKind::Abilities => abilities(&fragment.raw_text),
        SectionKind::Ac => armor_class(&fragment.raw_text),
        SectionKind::Hp => hit_points(&fragment.raw_text),
        SectionKind::Immunities => vec![FieldUpdate::Immunities(split_list(&value))],
        SectionKind::Weaknesses => vec![FieldUpdate::Weaknesses(split_list(&value))],
        SectionKind::Resistances => vec![FieldUpdate::Resistances(split_list(&value))],
        SectionKind::Speed => speed(&value),
        SectionKind::Attack => attack(fragment, &value),
        SectionKind::Reaction => vec![FieldUpdate::Reaction(Entry {
            name: fragment.label.clone(),
            content: value,
            usage: Some(String::new()),
        })],
        SectionKind::Action => action(fragment, value),
        SectionKind::SpellBlock => spell_block(fragment, &value),
        SectionKind::GenericTrait => vec![FieldUpdate::Trait(Entry::new(
            fragment.label.clone(),
            value,
        ))],
    }
}

fn perception(fragment: &Fragment, value: &str) -> Vec<FieldUpdate> {
    vec![
        FieldUpdate::PerceptionSense(fragment.raw_text.trim().to_string()),
        FieldUpdate::Initiative(first_signed_int(value)),
    ]
}

fn skills(value: &str) -> Vec<FieldUpdate> {
    let skills = value
        .split(',')
        .map(parse_name_modifier)
        .filter(|s| !s.name.is_empty())
        .collect();
    vec![FieldUpdate::Skills(skills)]
}

fn abilities(text: &str) -> Vec<FieldUpdate> {
    text.replace(';', ",")
        .split(',')
        .map(str::trim)
        .filter_map(|chunk| {
            let caps = ABILITY_CHUNK_RE.captures(chunk)?;
            let key = ability_key(&caps[1])?;
            Some(FieldUpdate::Ability(key, modifier_to_score(&caps[2])))
        })
        .collect()
}

fn armor_class(text: &str) -> Vec<FieldUpdate> {
    let mut updates = vec![FieldUpdate::AcValue(capture_int(&AC_RE, text))];

    if let Some(caps) = SAVES_RE.captures(text) {
        let saves = SaveName::ALL
            .iter()
            .zip(1usize..=3)
            .map(|(name, i)| Save {
                name: *name,
                modifier: parse_int(&caps[i]).unwrap_or(0),
            })
            .collect();
        updates.push(FieldUpdate::Saves(saves));
    }

    if let Some(caps) = AFTER_SEMI_RE.captures(text) {
        updates.push(FieldUpdate::AcNotes(caps[1].trim().to_string()));
    }
    updates
}

fn hit_points(text: &str) -> Vec<FieldUpdate> {
    let mut updates = vec![FieldUpdate::HpValue(capture_int(&HP_RE, text))];

    let mut notes = Vec::new();
    if let Some(caps) = HARDNESS_RE.captures(text) {
        notes.push(format!("Hardness {}", &caps[1]));
    }
    if let Some(caps) = REGEN_RE.captures(text) {
        notes.push(format!("Regeneration {}", caps[1].trim()));
    }
    if let Some(caps) = FAST_HEALING_RE.captures(text) {
        notes.push(format!("Fast Healing {}", caps[1].trim()));
    }
    if !notes.is_empty() {
        updates.push(FieldUpdate::HpNotes(notes.join("; ")));
    }

    if let Some(caps) = HP_IMMUNITIES_RE.captures(text) {
        updates.push(FieldUpdate::Immunities(split_list(&caps[1])));
    }
    if let Some(caps) = HP_WEAKNESSES_RE.captures(text) {
        updates.push(FieldUpdate::Weaknesses(split_list(&caps[1])));
    }
    if let Some(caps) = HP_RESISTANCES_RE.captures(text) {
        updates.push(FieldUpdate::Resistances(split_list(&caps[1])));
    }
    updates
}

fn speed(value: &str) -> Vec<FieldUpdate> {
    let speeds = split_list(value)
        .into_iter()
        .map(|s| FEET_RE.replace_all(&s, "ft.").to_string())
        .collect();
    vec![FieldUpdate::Speed(speeds)]
}

fn attack(fragment: &Fragment, value: &str) -> Vec<FieldUpdate> {
    let after_key = STRIKE_PREFIX_RE.replace(fragment.raw_text.trim(), "");
    let short = WEAPON_NAME_RE
        .captures(after_key.trim())
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| "Attack".to_string());
    let name = format!("{} {}", capitalize_first(&short), fragment.glyph.cost_label());

    vec![FieldUpdate::Action(Entry::new(
        name.trim(),
        format!("{} Strike {}", fragment.label.trim(), value),
    ))]
}

fn action(fragment: &Fragment, value: String) -> Vec<FieldUpdate> {
    let name = format!("{} {}", fragment.label.trim(), fragment.glyph.cost_label());
    vec![FieldUpdate::Action(Entry::new(name.trim(), value))]
}

fn spell_block(fragment: &Fragment, value: &str) -> Vec<FieldUpdate> {
    let stripped = MARKUP_RE.replace_all(value, " ");
    vec![FieldUpdate::Description(format!(
        "{}: {}\n\n",
        fragment.label.trim(),
        stripped
    ))]
}

fn capture_int(re: &Regex, text: &str) -> i64 {
    re.captures(text)
        .and_then(|c| parse_int(&c[1]))
        .unwrap_or(0)
}
