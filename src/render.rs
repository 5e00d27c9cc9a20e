// src/render.rs
//! Turns search and analysis results into displayable views.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::models::{AnalysisResult, Product, Recommendation, SearchResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Store,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortKey::Relevance),
            "price-asc" | "price-low" => Ok(SortKey::PriceAsc),
            "price-desc" | "price-high" => Ok(SortKey::PriceDesc),
            "store" => Ok(SortKey::Store),
            other => Err(format!(
                "unknown sort key {other:?} (expected relevance, price-asc, price-desc or store)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreFilter {
    #[default]
    All,
    Store(String),
}

impl StoreFilter {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            StoreFilter::All => true,
            StoreFilter::Store(name) => product.store == *name,
        }
    }
}

impl FromStr for StoreFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "all" => StoreFilter::All,
            name => StoreFilter::Store(name.to_string()),
        })
    }
}

/// Numeric value of a display price such as `"$1,299.99"`.
///
/// Every character other than ASCII digits and `.` is dropped before parsing.
pub fn parse_price(display: &str) -> Option<f64> {
    let digits: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok()
}

/// Distinct store names present in `products`, sorted.
pub fn store_options(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.store.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// Unparseable prices go last whichever direction is requested.
fn compare_prices(a: &Product, b: &Product, descending: bool) -> Ordering {
    match (parse_price(&a.price), parse_price(&b.price)) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filters then sorts. The sort is stable, so ties keep backend order.
pub fn arrange<'a>(products: &'a [Product], filter: &StoreFilter, sort: SortKey) -> Vec<&'a Product> {
    let mut selected: Vec<&Product> = products.iter().filter(|p| filter.matches(p)).collect();
    match sort {
        SortKey::Relevance => selected.sort_by(|a, b| b.confidence.total_cmp(&a.confidence)),
        SortKey::PriceAsc => selected.sort_by(|a, b| compare_prices(a, b, false)),
        SortKey::PriceDesc => selected.sort_by(|a, b| compare_prices(a, b, true)),
        SortKey::Store => selected.sort_by(|a, b| a.store.cmp(&b.store)),
    }
    selected
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductGrid {
    pub products: Vec<Product>,
    pub store_options: Vec<String>,
    pub filter: StoreFilter,
    pub sort: SortKey,
    pub total_found: u32,
    pub stores_searched: u32,
    pub search_query: Option<String>,
}

impl ProductGrid {
    pub fn build(result: &SearchResult, filter: &StoreFilter, sort: SortKey) -> Self {
        Self {
            products: arrange(&result.products, filter, sort)
                .into_iter()
                .cloned()
                .collect(),
            store_options: store_options(&result.products),
            filter: filter.clone(),
            sort,
            total_found: result.total_found,
            stores_searched: result.stores_searched,
            search_query: result.search_query.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisTab {
    #[default]
    Analysis,
    Recommendations,
    Tips,
}

impl FromStr for AnalysisTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(AnalysisTab::Analysis),
            "recommendations" => Ok(AnalysisTab::Recommendations),
            "tips" => Ok(AnalysisTab::Tips),
            other => Err(format!(
                "unknown tab {other:?} (expected analysis, recommendations or tips)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub analysis: String,
    pub confidence_percent: u8,
    pub recommendations: Vec<Recommendation>,
    pub tips: Vec<String>,
    pub voice_response: Option<String>,
    pub active_tab: AnalysisTab,
}

impl AnalysisView {
    pub fn build(result: &AnalysisResult, tab: AnalysisTab) -> Self {
        Self {
            analysis: result.analysis.clone(),
            confidence_percent: confidence_width(result.confidence_score),
            recommendations: result.recommendations.clone(),
            tips: result.persuasion_points.clone(),
            voice_response: result.voice_response.clone(),
            active_tab: tab,
        }
    }
}

/// Confidence bar width in percent, clamped to `0..=100`.
pub fn confidence_width(score: f32) -> u8 {
    if score.is_nan() {
        return 0;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Nothing submitted yet.
    Empty,
    Loading,
    /// Shown with a retry action.
    Error { message: String },
    Products(ProductGrid),
    Analysis(AnalysisView),
}

impl View {
    pub fn is_error(&self) -> bool {
        matches!(self, View::Error { .. })
    }
}

fn write_product(f: &mut fmt::Formatter<'_>, index: usize, p: &Product) -> fmt::Result {
    write!(f, "{:>2}. {} | {}", index + 1, p.name, p.price)?;
    if let Some(original) = &p.original_price {
        write!(f, " (was {original})")?;
    }
    if let Some(discount) = &p.discount {
        write!(f, " {discount}")?;
    }
    writeln!(f, " | {} | match {}%", p.store, confidence_width(p.confidence))?;

    let mut details = Vec::new();
    if let Some(rating) = p.rating {
        match p.review_count {
            Some(count) => details.push(format!("{rating:.1}/5 ({count} reviews)")),
            None => details.push(format!("{rating:.1}/5")),
        }
    }
    if let Some(availability) = &p.availability {
        details.push(availability.clone());
    }
    if let Some(shipping) = &p.shipping {
        details.push(shipping.clone());
    }
    if !details.is_empty() {
        writeln!(f, "    {}", details.join(" | "))?;
    }
    writeln!(f, "    {}", p.buy_now_url.as_deref().unwrap_or(&p.url))
}

impl fmt::Display for ProductGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(query) = &self.search_query {
            writeln!(f, "Results for \"{query}\"")?;
        }
        writeln!(
            f,
            "Found {} products across {} stores (showing {})",
            self.total_found,
            self.stores_searched,
            self.products.len()
        )?;
        if !self.store_options.is_empty() {
            writeln!(f, "Stores: {}", self.store_options.join(", "))?;
        }
        if self.products.is_empty() {
            return writeln!(f, "No products match the current filter.");
        }
        for (i, product) in self.products.iter().enumerate() {
            write_product(f, i, product)?;
        }
        Ok(())
    }
}

impl fmt::Display for AnalysisView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = usize::from(self.confidence_percent) / 5;
        writeln!(
            f,
            "Confidence [{}{}] {}%",
            "#".repeat(filled),
            ".".repeat(20 - filled),
            self.confidence_percent
        )?;
        match self.active_tab {
            AnalysisTab::Analysis => writeln!(f, "{}", self.analysis)?,
            AnalysisTab::Recommendations => {
                if self.recommendations.is_empty() {
                    writeln!(f, "No recommendations yet.")?;
                }
                for rec in &self.recommendations {
                    writeln!(f, "* {} ({})", rec.name, rec.price)?;
                    writeln!(f, "  {}", rec.reason)?;
                }
            }
            AnalysisTab::Tips => {
                for (i, tip) in self.tips.iter().enumerate() {
                    writeln!(f, "{}. {}", i + 1, tip)?;
                }
            }
        }
        if let Some(voice) = &self.voice_response {
            writeln!(f, "\n\"{voice}\"")?;
        }
        Ok(())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Empty => writeln!(f, "Upload a photo or describe what you are looking for."),
            View::Loading => writeln!(f, "Searching stores..."),
            View::Error { message } => {
                writeln!(f, "Search failed: {message}")?;
                writeln!(f, "Retry to start over.")
            }
            View::Products(grid) => write!(f, "{grid}"),
            View::Analysis(view) => write!(f, "{view}"),
        }
    }
}
