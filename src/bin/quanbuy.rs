// src/bin/quanbuy.rs
//! Command-line client for the quanBuy assistant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::info;

use quanbuy::capture::{ImageCapture, StoreSelection};
use quanbuy::models::{SearchType, StoreRef};
use quanbuy::render::{AnalysisTab, SortKey, StoreFilter};
use quanbuy::share::{ShareOutcome, ShareTarget};
use quanbuy::{AppConfig, AppController, Dispatcher, Phase, QuanBuyError};

#[derive(Parser)]
#[command(name = "quanbuy", about = "Search online stores by photo or description")]
struct Cli {
    /// Assistant service base URL (defaults to QUANBUY_BACKEND_URL).
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[arg(long, global = true, env = "QUANBUY_USER_ID")]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find products matching a photo and/or a description.
    Search(SearchArgs),
    /// Ask for style advice about a photo.
    Style(StyleArgs),
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    photo: Option<PathBuf>,

    #[arg(long)]
    prompt: Option<String>,

    /// Extra store as NAME=URL. Repeatable.
    #[arg(long = "store", value_parser = parse_store)]
    stores: Vec<StoreRef>,

    /// Store link to add by hostname. Repeatable.
    #[arg(long = "add-url")]
    urls: Vec<String>,

    /// Preset stores to leave out. Repeatable.
    #[arg(long = "skip")]
    skip: Vec<String>,

    #[arg(long, default_value = "relevance")]
    sort: SortKey,

    /// Only show products from this store.
    #[arg(long, default_value = "all")]
    filter: StoreFilter,

    /// Print a shareable summary after the results.
    #[arg(long)]
    share: bool,
}

#[derive(Args)]
struct StyleArgs {
    #[arg(long)]
    photo: PathBuf,

    #[arg(long, default_value = "")]
    question: String,

    #[arg(long, default_value = "")]
    occasion: String,

    #[arg(long, default_value = "")]
    budget: String,

    #[arg(long, default_value = "analysis")]
    tab: AnalysisTab,
}

fn parse_store(raw: &str) -> Result<StoreRef, String> {
    let (name, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got {raw:?}"))?;
    Ok(StoreRef::new(name.trim(), url.trim()))
}

fn preset_stores() -> Vec<StoreRef> {
    vec![
        StoreRef::new("Amazon", "https://www.amazon.com"),
        StoreRef::new("Walmart", "https://www.walmart.com"),
        StoreRef::new("Target", "https://www.target.com"),
        StoreRef::new("Best Buy", "https://www.bestbuy.com"),
        StoreRef::new("eBay", "https://www.ebay.com"),
    ]
}

/// A terminal has no clipboard; print the text so it can be copied.
struct TerminalClipboard;

impl ShareTarget for TerminalClipboard {
    fn name(&self) -> &str {
        "terminal"
    }

    fn share(&self, title: &str, text: &str) -> Result<(), QuanBuyError> {
        println!("--- {title} ---\n{text}");
        Ok(())
    }
}

async fn load_photo(app: &mut AppController, path: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let content_type = ImageCapture::sniff_content_type(&bytes);
    app.upload_photo(content_type, bytes).await?;
    Ok(())
}

async fn wait_and_print(app: &mut AppController) -> anyhow::Result<()> {
    print!("{}", app.view());
    app.next_event().await;
    print!("{}", app.view());
    if app.phase() == Phase::ShowingError {
        bail!("request failed");
    }
    Ok(())
}

async fn run_search(mut app: AppController, args: SearchArgs) -> anyhow::Result<()> {
    for name in &args.skip {
        if app.stores_mut().toggle(name).is_none() {
            bail!("unknown preset store {name:?}");
        }
    }
    for url in &args.urls {
        if app.stores_mut().add_dropped_url(url).is_none() {
            info!("Not adding {}", url);
        }
    }
    if let Some(path) = &args.photo {
        load_photo(&mut app, path).await?;
    }
    if let Some(prompt) = &args.prompt {
        app.prompt_mut().set_text(prompt.as_str());
    }

    let search_type = match (args.photo.is_some(), args.prompt.is_some()) {
        (true, true) => SearchType::Both,
        (true, false) => SearchType::Photo,
        _ => SearchType::Prompt,
    };

    app.set_sort(args.sort);
    app.set_filter(args.filter);
    app.submit(search_type)?;
    wait_and_print(&mut app).await?;

    if args.share {
        if let ShareOutcome::Copied { notice } = app.share(None, &TerminalClipboard)? {
            println!("{notice}");
        }
    }
    Ok(())
}

async fn run_style(mut app: AppController, args: StyleArgs) -> anyhow::Result<()> {
    load_photo(&mut app, &args.photo).await?;
    app.prompt_mut().set_text(args.question.as_str());
    app.set_tab(args.tab);
    app.submit_analysis(&args.occasion, &args.budget)?;
    wait_and_print(&mut app).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let backend_url = cli.backend_url.unwrap_or(config.backend_url);
    let user_id = cli
        .user_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let dispatcher = Arc::new(Dispatcher::new(&backend_url, config.request_timeout_secs)?);
    let mut stores = StoreSelection::with_presets(preset_stores());

    match cli.command {
        Command::Search(args) => {
            for store in args.stores.iter().cloned() {
                let name = store.name.clone();
                if !stores.add(store) {
                    info!("Store {} already selected", name);
                }
            }
            run_search(AppController::new(dispatcher, user_id, stores), args).await
        }
        Command::Style(args) => {
            run_style(AppController::new(dispatcher, user_id, stores), args).await
        }
    }
}
