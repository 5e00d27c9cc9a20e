// src/share.rs
use std::fmt::Write as _;

use log::warn;

use crate::controller::Outcome;
use crate::errors::QuanBuyError;
use crate::render::{SortKey, StoreFilter, arrange};

pub const SHARE_TITLE: &str = "My quanBuy finds";

/// Somewhere results can be sent: a native share sheet or a clipboard.
pub trait ShareTarget {
    fn name(&self) -> &str;
    fn share(&self, title: &str, text: &str) -> Result<(), QuanBuyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// Fell back to the clipboard; `notice` should be shown to the user.
    Copied { notice: String },
}

/// Prefers the native target and falls back to the clipboard when it is missing or fails.
pub fn share_results(
    text: &str,
    native: Option<&dyn ShareTarget>,
    clipboard: &dyn ShareTarget,
) -> Result<ShareOutcome, QuanBuyError> {
    if let Some(target) = native {
        match target.share(SHARE_TITLE, text) {
            Ok(()) => return Ok(ShareOutcome::Shared),
            Err(e) => warn!("{} share failed, using {}: {}", target.name(), clipboard.name(), e),
        }
    }
    clipboard.share(SHARE_TITLE, text)?;
    Ok(ShareOutcome::Copied {
        notice: "Results copied to clipboard!".to_string(),
    })
}

/// Short plain-text summary of the top results.
pub fn summary(outcome: &Outcome) -> String {
    let mut out = String::new();
    match outcome {
        Outcome::Search(result) => {
            let query = result.search_query.as_deref().unwrap_or("my search");
            let _ = writeln!(
                out,
                "Found {} products for \"{}\" on quanBuy:",
                result.total_found, query
            );
            for p in arrange(&result.products, &StoreFilter::All, SortKey::Relevance)
                .into_iter()
                .take(3)
            {
                let _ = writeln!(out, "- {} for {} at {}: {}", p.name, p.price, p.store, p.url);
            }
        }
        Outcome::Analysis(result) => {
            let _ = writeln!(out, "My quanBuy style analysis:");
            let _ = writeln!(out, "{}", result.analysis);
            for rec in result.recommendations.iter().take(3) {
                let _ = writeln!(out, "- {} ({})", rec.name, rec.price);
            }
        }
    }
    out
}
