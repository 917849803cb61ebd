use serde::Serialize;

/// Action-cost marker attached to a stat-block line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ActionGlyph {
    #[default]
    None,
    One,
    Two,
    Three,
    Reaction,
    Free,
}

impl ActionGlyph {
    /// Suffix appended to action names: "(1)", "(2)", "(3)", "(R)", "(Free)" or "".
    pub fn cost_label(self) -> &'static str {
        match self {
            ActionGlyph::None => "",
            ActionGlyph::One => "(1)",
            ActionGlyph::Two => "(2)",
            ActionGlyph::Three => "(3)",
            ActionGlyph::Reaction => "(R)",
            ActionGlyph::Free => "(Free)",
        }
    }

    /// Map an `aria-label` such as "Two Actions" to a glyph.
    pub fn from_aria_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        if lower.contains("single") {
            Some(ActionGlyph::One)
        } else if lower.contains("two") {
            Some(ActionGlyph::Two)
        } else if lower.contains("three") {
            Some(ActionGlyph::Three)
        } else if lower.contains("reaction") {
            Some(ActionGlyph::Reaction)
        } else if lower.contains("free") {
            Some(ActionGlyph::Free)
        } else {
            None
        }
    }

    /// Map an icon class name (`two-action-icon`, `reaction-icon`, ...) to a glyph.
    pub fn from_icon_class(class: &str) -> Option<Self> {
        match class {
            "one-action-icon" => Some(ActionGlyph::One),
            "two-action-icon" => Some(ActionGlyph::Two),
            "three-action-icon" => Some(ActionGlyph::Three),
            "reaction-icon" => Some(ActionGlyph::Reaction),
            "free-action-icon" => Some(ActionGlyph::Free),
            _ => None,
        }
    }
}

/// One labeled stat-block line, as handed to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub label: String,
    pub raw_text: String,
    pub has_action_glyph: bool,
    pub glyph: ActionGlyph,
}

impl Fragment {
    pub fn new(label: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Fragment {
            label: label.into(),
            raw_text: raw_text.into(),
            ..Default::default()
        }
    }

    pub fn with_glyph(mut self, glyph: ActionGlyph) -> Self {
        self.glyph = glyph;
        self.has_action_glyph = !matches!(glyph, ActionGlyph::None | ActionGlyph::Reaction);
        self
    }

    /// Raw text with the label removed and leading `;`, `:` or `,` dropped.
    pub fn value_text(&self) -> String {
        let raw = self.raw_text.trim();
        let label = self.label.trim();
        let rest = if label.is_empty() {
            raw.to_string()
        } else if let Some(stripped) = raw.strip_prefix(label) {
            stripped.to_string()
        } else {
            raw.replacen(label, "", 1)
        };
        rest.trim()
            .trim_start_matches([';', ':', ','])
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_text_strips_label_and_separator() {
        let f = Fragment::new("AC", "AC 45; Fort +38, Ref +35, Will +33");
        assert_eq!(f.value_text(), "45; Fort +38, Ref +35, Will +33");

        let f = Fragment::new("Skills", "Skills; Athletics +31");
        assert_eq!(f.value_text(), "Athletics +31");
    }

    #[test]
    fn value_text_label_not_at_start() {
        let f = Fragment::new("Saving Throws", "  (Fort) Saving Throws");
        assert_eq!(f.value_text(), "(Fort)");
    }

    #[test]
    fn cost_labels() {
        assert_eq!(ActionGlyph::Two.cost_label(), "(2)");
        assert_eq!(ActionGlyph::Free.cost_label(), "(Free)");
        assert_eq!(ActionGlyph::None.cost_label(), "");
    }

    #[test]
    fn aria_labels() {
        assert_eq!(ActionGlyph::from_aria_label("Single Action"), Some(ActionGlyph::One));
        assert_eq!(ActionGlyph::from_aria_label("Two Actions"), Some(ActionGlyph::Two));
        assert_eq!(ActionGlyph::from_aria_label("Reaction"), Some(ActionGlyph::Reaction));
        assert_eq!(ActionGlyph::from_aria_label("icon"), None);
    }

    #[test]
    fn reaction_glyph_is_not_an_action_glyph() {
        let f = Fragment::new("Attack of Opportunity", "").with_glyph(ActionGlyph::Reaction);
        assert!(!f.has_action_glyph);
        let f = Fragment::new("Breath Weapon", "").with_glyph(ActionGlyph::Two);
        assert!(f.has_action_glyph);
    }
}
