use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::html::{attr, fragments_from_html};
use super::{PageHeader, SourceAdapter, SourcePage};
use crate::config::Settings;
use crate::error::ExtractError;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").unwrap());

/// Stat block as shipped in a page's JSON data blob. Only `name` and `html`
/// are required; the header fields are read one by one and a field of the
/// wrong shape is dropped on its own.
#[derive(Debug)]
struct EmbeddedStatBlock {
    name: String,
    level: Option<String>,
    traits: Vec<String>,
    thumbnail: Option<String>,
    html: String,
}

impl EmbeddedStatBlock {
    fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let html = value.get("html")?.as_str()?.to_string();
        Some(EmbeddedStatBlock {
            level: level_field(value.get("level")),
            traits: traits_field(value.get("traits")),
            thumbnail: thumbnail_field(value.get("thumbnail")),
            name,
            html,
        })
    }
}

/// A whole number, or a string holding one.
fn level_field(value: Option<&Value>) -> Option<String> {
    let raw = value?;
    let level = match raw {
        Value::Null => return None,
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if level.is_none() {
        warn!(value = %raw, "ignoring unreadable level in data blob");
    }
    level.map(|l| l.to_string())
}

/// "Rare|12, Huge|4, Dragon|9", or an array of such entries.
fn traits_field(value: Option<&Value>) -> Vec<String> {
    let entries: Vec<&str> = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::String(s)) => s.split(',').collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(other) => {
            warn!(value = %other, "ignoring unreadable traits in data blob");
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .filter_map(|t| t.split('|').next())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn thumbnail_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|t| !t.is_empty()),
        other => {
            warn!(value = %other, "ignoring unreadable thumbnail in data blob");
            None
        }
    }
}

/// Reads the JSON data blob some pages embed instead of rendered markup.
#[derive(Debug, Clone)]
pub struct EmbeddedDataAdapter {
    image_base_url: String,
}

impl EmbeddedDataAdapter {
    pub fn new(settings: &Settings) -> Self {
        EmbeddedDataAdapter {
            image_base_url: settings.image_base_url.clone(),
        }
    }

    fn blobs(page: &str) -> impl Iterator<Item = &str> {
        SCRIPT_RE
            .captures_iter(page)
            .filter(|caps| {
                attr(caps.get(1).map_or("", |m| m.as_str()), "type")
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/json"))
            })
            .filter_map(|caps| caps.get(2))
            .map(|m| m.as_str().trim())
            .filter(|body| !body.is_empty())
    }

    /// Whether some data blob on the page actually carries a stat block.
    /// Unparseable blobs count as not carrying one.
    pub fn has_stat_block(page: &str) -> bool {
        Self::blobs(page).any(|blob| {
            serde_json::from_str::<Value>(blob)
                .ok()
                .is_some_and(|value| find_stat_block(&value).is_some())
        })
    }

    fn image_url(&self, thumbnail: &str) -> String {
        if thumbnail.starts_with("http://") || thumbnail.starts_with("https://") {
            return thumbnail.to_string();
        }
        format!(
            "{}/{}",
            self.image_base_url.trim_end_matches('/'),
            thumbnail.trim_start_matches('/')
        )
    }

    fn page_from(&self, block: EmbeddedStatBlock) -> SourcePage {
        let fragments = fragments_from_html(&block.html);
        debug!(count = fragments.len(), name = %block.name, "read stat-block paragraphs from data blob");

        SourcePage {
            header: PageHeader {
                name: Some(block.name.trim().to_string()).filter(|n| !n.is_empty()),
                level: block.level,
                traits: block.traits,
                image_url: block.thumbnail.as_deref().map(|t| self.image_url(t)),
            },
            fragments,
        }
    }
}

/// Depth-first search for the first object carrying string `name` and `html` keys.
fn find_stat_block(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            let looks_right = map.get("name").is_some_and(Value::is_string)
                && map.get("html").is_some_and(Value::is_string);
            if looks_right {
                return Some(value);
            }
            map.values().find_map(find_stat_block)
        }
        Value::Array(items) => items.iter().find_map(find_stat_block),
        _ => None,
    }
}

impl SourceAdapter for EmbeddedDataAdapter {
    fn kind(&self) -> &'static str {
        "embedded"
    }

    fn is_ready(&self, page: &str) -> bool {
        Self::blobs(page).next().is_some()
    }

    fn read(&self, page: &str) -> Result<SourcePage, ExtractError> {
        let mut seen = 0usize;
        for blob in Self::blobs(page) {
            seen += 1;
            let value: Value = serde_json::from_str(blob)?;
            if let Some(block) = find_stat_block(&value).and_then(EmbeddedStatBlock::from_value) {
                return Ok(self.page_from(block));
            }
        }

        if seen == 0 {
            return Err(ExtractError::MissingSourceData(
                "no application/json data blob on page".to_string(),
            ));
        }
        warn!(blobs = seen, "no data blob carried a stat block");
        Err(ExtractError::UnrecognizedSchema(format!(
            "none of {} data blob(s) contained a stat block with name and html",
            seen
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> EmbeddedDataAdapter {
        EmbeddedDataAdapter::new(&Settings::default())
    }

    #[test]
    fn reads_fixture() {
        let page = std::fs::read_to_string("tests/fixtures/goblin_warrior_embedded.html").unwrap();
        let adapter = adapter();
        assert!(adapter.is_ready(&page));
        let source = adapter.read(&page).unwrap();
        assert_eq!(source.header.name.as_deref(), Some("Goblin Warrior"));
        assert_eq!(source.header.level.as_deref(), Some("-1"));
        assert_eq!(source.header.traits, vec!["CE", "Small", "Goblin", "Humanoid"]);
        assert_eq!(
            source.header.image_url.as_deref(),
            Some("https://2e.aonprd.com/Images/Monsters/Goblin_Warrior.png")
        );
        assert!(source.fragments.iter().any(|f| f.label == "AC"));
    }

    #[test]
    fn absolute_thumbnail_kept() {
        let a = adapter();
        assert_eq!(a.image_url("https://cdn.example.com/x.png"), "https://cdn.example.com/x.png");
        let a = EmbeddedDataAdapter {
            image_base_url: "https://img.example.com/".into(),
        };
        assert_eq!(a.image_url("/Monsters/x.png"), "https://img.example.com/Monsters/x.png");
    }

    #[test]
    fn nested_payload_is_found() {
        let page = r#"<script type="application/json">{"props":{"pageProps":[{"id":1},{"name":"Rat","html":"<p><strong>AC</strong> 12</p>"}]}}</script>"#;
        let source = adapter().read(page).unwrap();
        assert_eq!(source.header.name.as_deref(), Some("Rat"));
        assert!(source.header.traits.is_empty());
        assert_eq!(source.header.level, None);
        assert_eq!(source.fragments.len(), 1);
    }

    fn blob(payload: &str) -> String {
        format!(r#"<script type="application/json">{{"creature":{}}}</script>"#, payload)
    }

    #[test]
    fn level_as_string_or_whole_float() {
        let page = blob(r#"{"name":"Rat","level":"1","html":""}"#);
        assert_eq!(adapter().read(&page).unwrap().header.level.as_deref(), Some("1"));

        let page = blob(r#"{"name":"Rat","level":1.0,"html":""}"#);
        assert_eq!(adapter().read(&page).unwrap().header.level.as_deref(), Some("1"));
    }

    #[test]
    fn bad_header_fields_degrade_individually() {
        let page = blob(
            r#"{"name":"Rat","level":"one","traits":null,"thumbnail":7,"html":"<p><strong>AC</strong> 12</p>"}"#,
        );
        let source = adapter().read(&page).unwrap();
        assert_eq!(source.header.name.as_deref(), Some("Rat"));
        assert_eq!(source.header.level, None);
        assert!(source.header.traits.is_empty());
        assert_eq!(source.header.image_url, None);
        assert_eq!(source.fragments.len(), 1);

        let page = blob(r#"{"name":"Rat","level":2.5,"traits":{"a":1},"html":""}"#);
        let source = adapter().read(&page).unwrap();
        assert_eq!(source.header.level, None);
        assert!(source.header.traits.is_empty());
    }

    #[test]
    fn traits_as_array() {
        let page = blob(r#"{"name":"Rat","traits":["Small|9","Animal|2",3],"html":""}"#);
        assert_eq!(adapter().read(&page).unwrap().header.traits, vec!["Small", "Animal"]);
    }

    #[test]
    fn stat_block_detection() {
        let page = std::fs::read_to_string("tests/fixtures/goblin_warrior_embedded.html").unwrap();
        assert!(EmbeddedDataAdapter::has_stat_block(&page));
        let page = std::fs::read_to_string("tests/fixtures/unknown_schema.html").unwrap();
        assert!(!EmbeddedDataAdapter::has_stat_block(&page));
        let page = std::fs::read_to_string("tests/fixtures/invalid_json.html").unwrap();
        assert!(!EmbeddedDataAdapter::has_stat_block(&page));
    }

    #[test]
    fn unknown_schema() {
        let page = std::fs::read_to_string("tests/fixtures/unknown_schema.html").unwrap();
        let err = adapter().read(&page).unwrap_err();
        assert!(matches!(err, ExtractError::UnrecognizedSchema(_)));
    }

    #[test]
    fn invalid_json_is_parse_failure() {
        let page = std::fs::read_to_string("tests/fixtures/invalid_json.html").unwrap();
        let err = adapter().read(&page).unwrap_err();
        assert!(matches!(err, ExtractError::ParseFailure(_)));
    }

    #[test]
    fn other_scripts_ignored() {
        let page = r#"<script>var x = 1;</script><script type="text/javascript">{}</script>"#;
        assert!(!adapter().is_ready(page));
        let err = adapter().read(page).unwrap_err();
        assert!(matches!(err, ExtractError::MissingSourceData(_)));
    }
}
