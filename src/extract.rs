use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapter::AdapterKind;
use crate::config::Settings;
use crate::error::ExtractError;
use crate::fragment::Fragment;
use crate::parser::{build_record, classify::classify, classify::SectionKind};
use crate::readiness::{wait_until_ready, Clock, Probe};
use crate::record::{Extraction, StatRecord};

/// Extract a record from an already-loaded page.
///
/// Never panics and never returns a half-built record: any failure, including
/// a panic inside a parser, comes back as the error object.
pub fn extract_page(page: &str, kind: AdapterKind, settings: &Settings) -> Extraction {
    let result = panic::catch_unwind(AssertUnwindSafe(|| try_extract(page, kind, settings)))
        .unwrap_or_else(|payload| Err(ExtractError::ParseFailure(panic_message(payload.as_ref()))));

    if let Err(e) = &result {
        warn!("Extraction failed: {}", e);
    }
    Extraction::from(result)
}

fn try_extract(page: &str, kind: AdapterKind, settings: &Settings) -> Result<StatRecord, ExtractError> {
    let adapter = kind.select(page, settings);
    let source = adapter.read(page)?;
    info!(
        adapter = adapter.kind(),
        fragments = source.fragments.len(),
        "extracting stat block"
    );
    Ok(build_record(&source, settings, Utc::now().timestamp_millis()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("parser panicked: {}", detail)
}

/// Poll `probe` until the page is ready for `kind`, then extract it.
pub async fn extract_when_ready<P, C>(
    probe: &mut P,
    kind: AdapterKind,
    settings: &Settings,
    clock: &C,
    cancel: &CancellationToken,
) -> Extraction
where
    P: Probe,
    C: Clock,
{
    let ready = |page: &str| kind.is_ready(page, settings);
    match wait_until_ready(probe, ready, clock, settings.poll_policy(), cancel).await {
        Ok(page) => extract_page(&page, kind, settings),
        Err(e) => {
            warn!("Extraction failed: {}", e);
            Extraction::from(Err(e))
        }
    }
}

/// Every fragment of a page with the section it classifies as.
pub fn classify_page(
    page: &str,
    kind: AdapterKind,
    settings: &Settings,
) -> Result<Vec<(Fragment, SectionKind)>, ExtractError> {
    let source = kind.select(page, settings).read(page)?;
    Ok(source
        .fragments
        .into_iter()
        .map(|f| {
            let kind = classify(&f);
            (f, kind)
        })
        .collect())
}
