use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::fields::FieldUpdate;
use super::tokens::{format_modifier, parse_int};
use crate::fragment::Fragment;
use crate::record::{Save, SaveName, StatRecord};

static FORT_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Fort\b").unwrap());
static REF_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Ref\b").unwrap());
static WILL_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Will\b").unwrap());
static FORT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Fort\s*([+-]\d+)").unwrap());
static REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Ref\s*([+-]\d+)").unwrap());
static WILL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Will\s*([+-]\d+)").unwrap());

/// Owns the record while fragments are folded into it.
pub struct Assembler {
    record: StatRecord,
}

impl Assembler {
    pub fn new(record: StatRecord) -> Self {
        Assembler { record }
    }

    pub fn record(&self) -> &StatRecord {
        &self.record
    }

    pub fn apply(&mut self, update: FieldUpdate) {
        let r = &mut self.record;
        match update {
            FieldUpdate::PerceptionSense(text) => {
                if !r.senses.iter().any(|s| s.starts_with("Perception")) {
                    r.senses.push(text);
                }
            }
            FieldUpdate::Initiative(m) => r.initiative_modifier = m,
            FieldUpdate::Languages(list) => r.languages = list,
            FieldUpdate::Skills(list) => r.skills = list,
            FieldUpdate::Ability(key, score) => r.abilities.set(key, score),
            FieldUpdate::AcValue(v) => r.ac.value = v,
            FieldUpdate::AcNotes(notes) => r.ac.notes = notes,
            FieldUpdate::Saves(saves) => {
                for save in saves {
                    self.upsert_save(save);
                }
            }
            FieldUpdate::HpValue(v) => r.hp.value = v,
            FieldUpdate::HpNotes(notes) => r.hp.notes = notes,
            FieldUpdate::Immunities(list) => r.damage_immunities = list,
            FieldUpdate::Weaknesses(list) => r.damage_vulnerabilities = list,
            FieldUpdate::Resistances(list) => r.damage_resistances = list,
            FieldUpdate::Speed(list) => r.speed = list,
            FieldUpdate::Action(entry) => r.actions.push(entry),
            FieldUpdate::Reaction(entry) => r.reactions.push(entry),
            FieldUpdate::Description(text) => r.description.push_str(&text),
            FieldUpdate::Trait(entry) => r.traits.push(entry),
        }
    }

    /// Saves stay unique by name; a later value replaces the earlier one in place.
    fn upsert_save(&mut self, save: Save) {
        match self.record.saves.iter_mut().find(|s| s.name == save.name) {
            Some(existing) => existing.modifier = save.modifier,
            None => self.record.saves.push(save),
        }
    }

    /// Cross-field corrections, run once after every fragment has been applied.
    pub fn finish(mut self, fragments: &[Fragment]) -> StatRecord {
        if self.record.saves.is_empty() {
            self.recover_saves(fragments);
        }
        if self.record.ac.notes.is_empty() && self.record.saves.len() >= 2 {
            self.record.ac.notes = saves_note(&self.record.saves);
            debug!(notes = %self.record.ac.notes, "synthesized AC notes from saves");
        }
        self.record
    }

    fn recover_saves(&mut self, fragments: &[Fragment]) {
        let Some(text) = fragments
            .iter()
            .map(|f| f.raw_text.as_str())
            .find(|t| FORT_WORD_RE.is_match(t) && REF_WORD_RE.is_match(t) && WILL_WORD_RE.is_match(t))
        else {
            return;
        };

        for (name, re) in [
            (SaveName::Fort, &*FORT_RE),
            (SaveName::Ref, &*REF_RE),
            (SaveName::Will, &*WILL_RE),
        ] {
            if let Some(modifier) = re.captures(text).and_then(|c| parse_int(&c[1])) {
                self.upsert_save(Save { name, modifier });
            }
        }
        debug!(found = self.record.saves.len(), "recovered saves from fallback scan");
    }
}

/// "Fort +9, Ref +5, Will +0"; missing saves read as +0.
pub fn saves_note(saves: &[Save]) -> String {
    let get = |name: SaveName| {
        saves
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.modifier)
            .unwrap_or(0)
    };
    SaveName::ALL
        .iter()
        .map(|name| format!("{} {}", name.as_str(), format_modifier(get(*name))))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Extend<FieldUpdate> for Assembler {
    fn extend<I: IntoIterator<Item = FieldUpdate>>(&mut self, iter: I) {
        for update in iter {
            self.apply(update);
        }
    }
}
