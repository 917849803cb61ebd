use tracing::debug;

use super::html::{children_by_tag, find_by_class, find_first_by_class, fragments_from_html, text_content};
use super::{PageHeader, SourceAdapter, SourcePage};
use crate::error::ExtractError;
use crate::parser::identity::level_from_tag;

const CONTAINER_CLASS: &str = "page-inner-holder";
const NAME_CLASS: &str = "elem-disp-header-name-page";
const LEVEL_CLASS: &str = "element-display-header-tag-creature";
const TRAIT_CLASS: &str = "trait-tag";
const THUMB_CLASS: &str = "elem-disp-header-thumb-img-page";

/// Reads a rendered creature page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveMarkupAdapter;

impl LiveMarkupAdapter {
    fn name(page: &str) -> Option<String> {
        let header = find_first_by_class(page, NAME_CLASS)?;
        children_by_tag(header.inner, "h1")
            .first()
            .map(|h1| text_content(h1))
            .filter(|n| !n.is_empty())
    }

    fn header(page: &str) -> PageHeader {
        let traits = find_by_class(page, TRAIT_CLASS)
            .iter()
            .flat_map(|el| children_by_tag(el.inner, "button"))
            .map(text_content)
            .filter(|t| !t.is_empty())
            .collect();

        PageHeader {
            name: Self::name(page),
            level: find_first_by_class(page, LEVEL_CLASS).and_then(|el| level_from_tag(&el.text())),
            traits,
            image_url: find_first_by_class(page, THUMB_CLASS)
                .and_then(|el| el.attr("src"))
                .map(str::to_string),
        }
    }
}

impl SourceAdapter for LiveMarkupAdapter {
    fn kind(&self) -> &'static str {
        "markup"
    }

    fn is_ready(&self, page: &str) -> bool {
        find_first_by_class(page, CONTAINER_CLASS).is_some() && Self::name(page).is_some()
    }

    fn read(&self, page: &str) -> Result<SourcePage, ExtractError> {
        let container = find_first_by_class(page, CONTAINER_CLASS).ok_or_else(|| {
            ExtractError::MissingSourceData(format!("no .{} stat block container", CONTAINER_CLASS))
        })?;

        let fragments = fragments_from_html(container.inner);
        debug!(count = fragments.len(), "read stat-block paragraphs from markup");

        Ok(SourcePage {
            header: Self::header(page),
            fragments,
        })
    }
}
