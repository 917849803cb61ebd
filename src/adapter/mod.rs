pub mod embedded;
pub mod html;
pub mod markup;

use clap::ValueEnum;
use serde::Serialize;

use crate::config::Settings;
use crate::error::ExtractError;
use crate::fragment::Fragment;
pub use embedded::EmbeddedDataAdapter;
pub use markup::LiveMarkupAdapter;

/// Page-level facts that sit outside the stat-block lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageHeader {
    pub name: Option<String>,
    pub level: Option<String>,
    pub traits: Vec<String>,
    pub image_url: Option<String>,
}

/// Everything the parser needs from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePage {
    pub header: PageHeader,
    pub fragments: Vec<Fragment>,
}

/// Turns one kind of page into the shared fragment shape.
pub trait SourceAdapter {
    fn kind(&self) -> &'static str;

    /// Whether the page has finished rendering far enough to be read.
    fn is_ready(&self, page: &str) -> bool;

    fn read(&self, page: &str) -> Result<SourcePage, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AdapterKind {
    /// Embedded data blob when one carries a stat block, rendered markup otherwise
    #[default]
    Auto,
    /// Rendered stat-block markup
    Markup,
    /// Embedded JSON data blob
    Embedded,
}

impl AdapterKind {
    pub fn is_ready(self, page: &str, settings: &Settings) -> bool {
        match self {
            AdapterKind::Auto => {
                EmbeddedDataAdapter::has_stat_block(page) || LiveMarkupAdapter.is_ready(page)
            }
            AdapterKind::Markup => LiveMarkupAdapter.is_ready(page),
            AdapterKind::Embedded => EmbeddedDataAdapter::new(settings).is_ready(page),
        }
    }

    /// Pick the concrete adapter for a page. Auto only goes to the embedded
    /// adapter when a data blob really carries a stat block; unrelated JSON
    /// blobs on a rendered page leave it on markup.
    pub fn select(self, page: &str, settings: &Settings) -> Box<dyn SourceAdapter> {
        match self {
            AdapterKind::Markup => Box::new(LiveMarkupAdapter),
            AdapterKind::Embedded => Box::new(EmbeddedDataAdapter::new(settings)),
            AdapterKind::Auto if EmbeddedDataAdapter::has_stat_block(page) => {
                Box::new(EmbeddedDataAdapter::new(settings))
            }
            AdapterKind::Auto => Box::new(LiveMarkupAdapter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_prefers_embedded_blob() {
        let settings = Settings::default();
        let page = r#"<script type="application/json">{"a":{"name":"Rat","html":""}}</script><div class="page-inner-holder"></div>"#;
        assert_eq!(AdapterKind::Auto.select(page, &settings).kind(), "embedded");
        assert_eq!(AdapterKind::Markup.select(page, &settings).kind(), "markup");
        let page = r#"<script type="application/json">{"buildId":"abc","props":{}}</script><div class="page-inner-holder"></div>"#;
        assert_eq!(AdapterKind::Auto.select(page, &settings).kind(), "markup");
        assert_eq!(AdapterKind::Embedded.select(page, &settings).kind(), "embedded");
        let page = r#"<div class="page-inner-holder"></div>"#;
        assert_eq!(AdapterKind::Auto.select(page, &settings).kind(), "markup");
    }

    #[test]
    fn readiness_by_kind() {
        let settings = Settings::default();
        let markup = r#"<div class="elem-disp-header-name-page"><h1>Goblin</h1></div><div class="page-inner-holder"></div>"#;
        assert!(AdapterKind::Markup.is_ready(markup, &settings));
        assert!(AdapterKind::Auto.is_ready(markup, &settings));
        assert!(!AdapterKind::Embedded.is_ready(markup, &settings));
        assert!(!AdapterKind::Auto.is_ready("<html><body>Loading…</body></html>", &settings));
        let unrelated = r#"<script type="application/json">{"buildId":"abc"}</script><body>Loading…</body>"#;
        assert!(!AdapterKind::Auto.is_ready(unrelated, &settings));
        assert!(AdapterKind::Embedded.is_ready(unrelated, &settings));
    }
}
