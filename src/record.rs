//! Output schema. Field names and nesting follow the importer format exactly,
//! so every struct here renames its fields explicitly where PascalCase would
//! get them wrong (`HP`, `AC`, `ImageURL`).

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKey {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Abilities {
    pub str: i64,
    pub dex: i64,
    pub con: i64,
    pub int: i64,
    pub wis: i64,
    pub cha: i64,
}

impl Abilities {
    pub fn set(&mut self, key: AbilityKey, score: i64) {
        let slot = match key {
            AbilityKey::Str => &mut self.str,
            AbilityKey::Dex => &mut self.dex,
            AbilityKey::Con => &mut self.con,
            AbilityKey::Int => &mut self.int,
            AbilityKey::Wis => &mut self.wis,
            AbilityKey::Cha => &mut self.cha,
        };
        *slot = score;
    }

    pub fn get(&self, key: AbilityKey) -> i64 {
        match key {
            AbilityKey::Str => self.str,
            AbilityKey::Dex => self.dex,
            AbilityKey::Con => self.con,
            AbilityKey::Int => self.int,
            AbilityKey::Wis => self.wis,
            AbilityKey::Cha => self.cha,
        }
    }
}

/// `{Value, Notes}` pair used by both HP and AC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValueNotes {
    pub value: i64,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveName {
    Fort,
    Ref,
    Will,
}

impl SaveName {
    pub const ALL: [SaveName; 3] = [SaveName::Fort, SaveName::Ref, SaveName::Will];

    pub fn as_str(self) -> &'static str {
        match self {
            SaveName::Fort => "Fort",
            SaveName::Ref => "Ref",
            SaveName::Will => "Will",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Save {
    pub name: SaveName,
    pub modifier: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Skill {
    pub name: String,
    pub modifier: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Named block of text: traits, actions, reactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Entry {
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl Entry {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Entry {
            name: name.into(),
            content: content.into(),
            usage: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatRecord {
    pub source: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "HP")]
    pub hp: ValueNotes,
    #[serde(rename = "AC")]
    pub ac: ValueNotes,
    pub initiative_modifier: i64,
    pub initiative_advantage: bool,
    pub speed: Vec<String>,
    pub abilities: Abilities,
    pub damage_vulnerabilities: Vec<String>,
    pub damage_resistances: Vec<String>,
    pub damage_immunities: Vec<String>,
    pub condition_immunities: Vec<String>,
    pub saves: Vec<Save>,
    pub skills: Vec<Skill>,
    pub senses: Vec<String>,
    pub languages: Vec<String>,
    pub challenge: String,
    pub traits: Vec<Entry>,
    pub actions: Vec<Entry>,
    pub bonus_actions: Vec<Entry>,
    pub reactions: Vec<Entry>,
    pub legendary_actions: Vec<Entry>,
    pub mythic_actions: Vec<Entry>,
    pub description: String,
    pub player: String,
    pub version: String,
    #[serde(rename = "ImageURL")]
    pub image_url: String,
    pub last_update_ms: i64,
}

impl StatRecord {
    /// Empty record with the full default shape.
    pub fn new(source: &str, version: &str, last_update_ms: i64) -> Self {
        StatRecord {
            source: source.to_string(),
            name: "Unknown".to_string(),
            kind: String::new(),
            hp: ValueNotes::default(),
            ac: ValueNotes::default(),
            initiative_modifier: 0,
            initiative_advantage: false,
            speed: Vec::new(),
            abilities: Abilities::default(),
            damage_vulnerabilities: Vec::new(),
            damage_resistances: Vec::new(),
            damage_immunities: Vec::new(),
            condition_immunities: Vec::new(),
            saves: Vec::new(),
            skills: Vec::new(),
            senses: Vec::new(),
            languages: Vec::new(),
            challenge: "0".to_string(),
            traits: Vec::new(),
            actions: Vec::new(),
            bonus_actions: Vec::new(),
            reactions: Vec::new(),
            legendary_actions: Vec::new(),
            mythic_actions: Vec::new(),
            description: String::new(),
            player: String::new(),
            version: version.to_string(),
            image_url: String::new(),
            last_update_ms,
        }
    }

    pub fn save(&self, name: SaveName) -> Option<i64> {
        self.saves.iter().find(|s| s.name == name).map(|s| s.modifier)
    }
}

/// Structured failure returned in place of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&ExtractError> for ErrorRecord {
    fn from(err: &ExtractError) -> Self {
        ErrorRecord {
            error: "Failed to parse creature data".to_string(),
            message: Some(err.to_string()),
            details: err.hint().map(str::to_string),
        }
    }
}

/// Either a complete record or the error object, never a mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extraction {
    Record(Box<StatRecord>),
    Error(ErrorRecord),
}

impl Extraction {
    pub fn is_error(&self) -> bool {
        matches!(self, Extraction::Error(_))
    }

    pub fn record(&self) -> Option<&StatRecord> {
        match self {
            Extraction::Record(r) => Some(r),
            Extraction::Error(_) => None,
        }
    }
}

impl From<Result<StatRecord, ExtractError>> for Extraction {
    fn from(result: Result<StatRecord, ExtractError>) -> Self {
        match result {
            Ok(record) => Extraction::Record(Box::new(record)),
            Err(e) => Extraction::Error(ErrorRecord::from(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatRecord {
        let mut r = StatRecord::new("Pathfinder 2e", "3.13.2", 1_700_000_000_123);
        r.name = "Ancient Red Dragon".into();
        r.kind = "Huge dragon (fire)".into();
        r.hp = ValueNotes { value: 425, notes: "Hardness 5".into() };
        r.ac.value = 45;
        r.abilities.set(AbilityKey::Str, 24);
        r.saves.push(Save { name: SaveName::Fort, modifier: 38 });
        r.skills.push(Skill {
            name: "Acrobatics".into(),
            modifier: 25,
            notes: Some("(x)".into()),
        });
        r.reactions.push(Entry {
            name: "Attack of Opportunity".into(),
            content: "Trigger ...".into(),
            usage: Some(String::new()),
        });
        r.actions.push(Entry::new("Jaws (2)", "Melee Strike jaws +23"));
        r
    }

    #[test]
    fn default_shape_has_every_field() {
        let r = StatRecord::new("Pathfinder 2e", "3.13.2", 0);
        let v = serde_json::to_value(&r).unwrap();
        let obj = v.as_object().unwrap();
        for key in [
            "Source", "Name", "Type", "HP", "AC", "InitiativeModifier",
            "InitiativeAdvantage", "Speed", "Abilities", "DamageVulnerabilities",
            "DamageResistances", "DamageImmunities", "ConditionImmunities", "Saves",
            "Skills", "Senses", "Languages", "Challenge", "Traits", "Actions",
            "BonusActions", "Reactions", "LegendaryActions", "MythicActions",
            "Description", "Player", "Version", "ImageURL", "LastUpdateMs",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj.len(), 29);
        assert_eq!(v["Abilities"].as_object().unwrap().len(), 6);
        assert_eq!(v["HP"]["Value"], 0);
        assert_eq!(v["Challenge"], "0");
        assert_eq!(v["Name"], "Unknown");
    }

    #[test]
    fn optional_fields_serialize_as_expected() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["Skills"][0]["Notes"], "(x)");
        assert_eq!(v["Reactions"][0]["Usage"], "");
        assert!(v["Actions"][0].get("Usage").is_none());
        assert_eq!(v["Saves"][0]["Name"], "Fort");
        assert_eq!(v["Saves"][0]["Modifier"], 38);
    }

    #[test]
    fn record_roundtrips() {
        let r = sample();
        let json = serde_json::to_string(&r).unwrap();
        let back: StatRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }

    #[test]
    fn extraction_error_shape() {
        let e = Extraction::from(Err::<StatRecord, _>(ExtractError::ReadinessTimeout {
            attempts: 40,
        }));
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["error"], "Failed to parse creature data");
        assert!(v["message"].as_str().unwrap().contains("40"));
        assert!(v.get("Name").is_none());
    }
}
