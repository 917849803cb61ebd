pub mod assemble;
pub mod classify;
pub mod fields;
pub mod identity;
pub mod tokens;

use tracing::debug;

use crate::adapter::SourcePage;
use crate::config::Settings;
use crate::record::StatRecord;
use assemble::Assembler;

/// Fold one page into a record: header identity first, then every fragment
/// through classify and its field parser, then the cross-field corrections.
pub fn build_record(page: &SourcePage, settings: &Settings, last_update_ms: i64) -> StatRecord {
    let mut record = StatRecord::new(&settings.source_tag, &settings.schema_version, last_update_ms);

    let header = &page.header;
    if let Some(name) = header.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        record.name = name.to_string();
    }
    if let Some(level) = &header.level {
        record.challenge = level.clone();
    }
    record.kind = identity::type_line(&header.traits);
    if let Some(url) = &header.image_url {
        record.image_url = url.clone();
    }

    let mut assembler = Assembler::new(record);
    for fragment in &page.fragments {
        let kind = classify::classify(fragment);
        debug!(label = %fragment.label, %kind, "classified fragment");
        assembler.extend(fields::parse(kind, fragment));
    }
    assembler.finish(&page.fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PageHeader;
    use crate::fragment::{ActionGlyph, Fragment};
    use crate::record::{AbilityKey, SaveName};

    fn page(fragments: Vec<Fragment>) -> SourcePage {
        SourcePage {
            header: PageHeader {
                name: Some("Goblin Warrior".into()),
                level: Some("-1".into()),
                traits: vec!["CE".into(), "Small".into(), "Goblin".into(), "Humanoid".into()],
                image_url: None,
            },
            fragments,
        }
    }

    #[test]
    fn empty_page_keeps_default_shape() {
        let r = build_record(&SourcePage::default(), &Settings::default(), 5);
        assert_eq!(r.name, "Unknown");
        assert_eq!(r.challenge, "0");
        assert_eq!(r.kind, "creature");
        assert_eq!(r.source, "Pathfinder 2e");
        assert_eq!(r.version, "3.13.2");
        assert_eq!(r.last_update_ms, 5);
        assert!(r.actions.is_empty());
    }

    #[test]
    fn goblin_warrior() {
        let fragments = vec![
            Fragment::new("Perception", "Perception +2; darkvision"),
            Fragment::new("Languages", "Languages Common, Goblin"),
            Fragment::new("Skills", "Skills Acrobatics +5, Athletics +2, Nature +1, Stealth +5"),
            Fragment::new("Str", "Str +0, Dex +3, Con +1, Int +0, Wis -1, Cha +1"),
            Fragment::new("AC", "AC 16; Fort +5, Ref +7, Will +3"),
            Fragment::new("HP", "HP 6"),
            Fragment::new("Speed", "Speed 25 feet"),
            Fragment::new("Melee", "Melee dogslicer +7 (agile, backstabber, finesse), Damage 1d6 slashing")
                .with_glyph(ActionGlyph::One),
            Fragment::new("Goblin Scuttle", "Goblin Scuttle Trigger An ally ends a move action adjacent to you.")
                .with_glyph(ActionGlyph::Reaction),
        ];
        let r = build_record(&page(fragments), &Settings::default(), 0);

        assert_eq!(r.name, "Goblin Warrior");
        assert_eq!(r.challenge, "-1");
        assert_eq!(r.kind, "Small humanoid (goblin)");
        assert_eq!(r.senses, vec!["Perception +2; darkvision".to_string()]);
        assert_eq!(r.initiative_modifier, 2);
        assert_eq!(r.languages, vec!["Common".to_string(), "Goblin".to_string()]);
        assert_eq!(r.skills.len(), 4);
        assert_eq!(r.abilities.get(AbilityKey::Dex), 16);
        assert_eq!(r.abilities.get(AbilityKey::Wis), 8);
        assert_eq!(r.ac.value, 16);
        assert_eq!(r.save(SaveName::Ref), Some(7));
        assert_eq!(r.ac.notes, "Fort +5, Ref +7, Will +3");
        assert_eq!(r.hp.value, 6);
        assert_eq!(r.speed, vec!["25 ft.".to_string()]);
        assert_eq!(r.actions.len(), 1);
        assert_eq!(r.actions[0].name, "Dogslicer (1)");
        assert_eq!(r.reactions.len(), 1);
        assert_eq!(r.reactions[0].usage.as_deref(), Some(""));
    }

    #[test]
    fn later_immunities_line_wins() {
        let hp = Fragment::new("HP", "HP 425; Immunities fire, sleep");
        let dedicated = Fragment::new("Immunities", "Immunities cold");

        let r = build_record(&page(vec![hp.clone(), dedicated.clone()]), &Settings::default(), 0);
        assert_eq!(r.hp.value, 425);
        assert_eq!(r.damage_immunities, vec!["cold".to_string()]);

        let r = build_record(&page(vec![dedicated, hp]), &Settings::default(), 0);
        assert_eq!(r.hp.value, 425);
        assert_eq!(r.damage_immunities, vec!["fire".to_string(), "sleep".to_string()]);
    }
}
