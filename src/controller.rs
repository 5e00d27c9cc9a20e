// src/controller.rs
//! Owns the transient search state and wires capture, dispatch and rendering.
//!
//! Every submit gets a fresh [`Ticket`]. The previous in-flight task is
//! aborted and any completion carrying an older ticket is discarded, so the
//! displayed result always belongs to the newest request.

use std::sync::Arc;

use bytes::Bytes;
use log::{debug, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use crate::capture::{Photo, PromptInput, StoreSelection};
use crate::dispatcher::Dispatcher;
use crate::errors::QuanBuyError;
use crate::models::{AnalysisResult, SearchRequest, SearchResult, SearchType, StyleRequest};
use crate::render::{AnalysisTab, AnalysisView, ProductGrid, SortKey, StoreFilter, View};
use crate::share::{self, ShareOutcome, ShareTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
    ShowingResults,
    ShowingError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Search(SearchResult),
    Analysis(AnalysisResult),
}

impl Outcome {
    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Search(r) => r.error.as_deref(),
            Outcome::Analysis(r) => r.error.as_deref(),
        }
    }
}

/// A finished dispatch, tagged with the ticket it was issued under.
#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Outcome,
}

enum PendingRequest {
    Search(SearchRequest),
    Style(StyleRequest),
}

pub struct AppController {
    dispatcher: Arc<Dispatcher>,
    user_id: String,
    photo: Option<Photo>,
    prompt: PromptInput,
    stores: StoreSelection,
    result: Option<Outcome>,
    phase: Phase,
    latest: u64,
    in_flight: Option<JoinHandle<()>>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    filter: StoreFilter,
    sort: SortKey,
    tab: AnalysisTab,
}

impl AppController {
    pub fn new(dispatcher: Arc<Dispatcher>, user_id: impl Into<String>, stores: StoreSelection) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            dispatcher,
            user_id: user_id.into(),
            photo: None,
            prompt: PromptInput::default(),
            stores,
            result: None,
            phase: Phase::Idle,
            latest: 0,
            in_flight: None,
            tx,
            rx,
            filter: StoreFilter::All,
            sort: SortKey::Relevance,
            tab: AnalysisTab::Analysis,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    /// Replaces the current photo wholesale.
    pub fn set_photo(&mut self, photo: Photo) {
        self.photo = Some(photo);
    }

    /// Validates and encodes an upload. On rejection the current photo is kept.
    pub async fn upload_photo(
        &mut self,
        content_type: &str,
        data: impl Into<Bytes>,
    ) -> Result<(), QuanBuyError> {
        let photo = Photo::load(content_type, data).await?;
        self.set_photo(photo);
        Ok(())
    }

    pub fn prompt(&self) -> &PromptInput {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut PromptInput {
        &mut self.prompt
    }

    pub fn stores(&self) -> &StoreSelection {
        &self.stores
    }

    pub fn stores_mut(&mut self) -> &mut StoreSelection {
        &mut self.stores
    }

    pub fn result(&self) -> Option<&Outcome> {
        self.result.as_ref()
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn set_filter(&mut self, filter: StoreFilter) {
        self.filter = filter;
    }

    pub fn set_tab(&mut self, tab: AnalysisTab) {
        self.tab = tab;
    }

    fn build_search_request(&self, search_type: SearchType) -> SearchRequest {
        let prompt = self.prompt.text().trim();
        SearchRequest {
            search_type,
            image_data: self
                .photo
                .as_ref()
                .filter(|_| search_type.needs_photo())
                .map(|p| p.base64().to_string()),
            prompt_text: (!prompt.is_empty()).then(|| prompt.to_string()),
            store_list: self.stores.selected(),
            user_id: self.user_id.clone(),
        }
    }

    /// Starts a product search. Must be called from within a tokio runtime.
    ///
    /// Missing inputs are rejected before any network call and leave state untouched.
    pub fn submit(&mut self, search_type: SearchType) -> Result<Ticket, QuanBuyError> {
        let request = self.build_search_request(search_type);
        request.validate()?;
        Ok(self.dispatch(PendingRequest::Search(request)))
    }

    /// Starts a style analysis of the current photo.
    pub fn submit_analysis(
        &mut self,
        occasion: &str,
        budget_range: &str,
    ) -> Result<Ticket, QuanBuyError> {
        let photo = self.photo.as_ref().ok_or_else(|| {
            QuanBuyError::Validation("Please upload a photo for style advice".to_string())
        })?;
        let request = StyleRequest {
            image_base64: photo.base64().to_string(),
            user_question: self.prompt.text().trim().to_string(),
            occasion: occasion.to_string(),
            budget_range: budget_range.to_string(),
            user_id: self.user_id.clone(),
        };
        Ok(self.dispatch(PendingRequest::Style(request)))
    }

    fn dispatch(&mut self, request: PendingRequest) -> Ticket {
        if let Some(previous) = self.in_flight.take() {
            debug!("Aborting superseded request #{}", self.latest);
            previous.abort();
        }
        self.latest += 1;
        let ticket = Ticket(self.latest);

        let dispatcher = Arc::clone(&self.dispatcher);
        let tx = self.tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = match request {
                PendingRequest::Search(req) => Outcome::Search(dispatcher.search(&req).await),
                PendingRequest::Style(req) => {
                    Outcome::Analysis(dispatcher.analyze_style(&req).await)
                }
            };
            // receiver only goes away with the controller
            let _ = tx.send(Completion { ticket, outcome });
        }));

        info!("Dispatched request #{}", ticket.0);
        self.result = None;
        self.phase = Phase::AwaitingResponse;
        ticket
    }

    /// Applies a completion if it belongs to the newest request. Returns whether it was applied.
    pub fn apply(&mut self, completion: Completion) -> bool {
        if completion.ticket != Ticket(self.latest) || self.phase != Phase::AwaitingResponse {
            debug!("Dropping stale response for request #{}", completion.ticket.0);
            return false;
        }
        self.in_flight = None;
        self.phase = match completion.outcome.error() {
            Some(message) => {
                info!("Request #{} failed: {}", completion.ticket.0, message);
                Phase::ShowingError
            }
            None => Phase::ShowingResults,
        };
        self.result = Some(completion.outcome);
        true
    }

    /// Waits until the newest request completes. Returns `None` when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<Phase> {
        while self.phase == Phase::AwaitingResponse {
            let completion = self.rx.recv().await?;
            if self.apply(completion) {
                return Some(self.phase);
            }
        }
        None
    }

    /// Cancels anything in flight and clears photo, prompt and result.
    pub fn retry(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        // invalidates any completion already queued
        self.latest += 1;
        self.photo = None;
        self.prompt.clear();
        self.result = None;
        self.phase = Phase::Idle;
    }

    pub fn view(&self) -> View {
        match (self.phase, &self.result) {
            (Phase::Idle, _) => View::Empty,
            (Phase::AwaitingResponse, _) => View::Loading,
            (Phase::ShowingError, Some(outcome)) => View::Error {
                message: outcome.error().unwrap_or("Unknown error").to_string(),
            },
            (Phase::ShowingResults, Some(Outcome::Search(result))) => {
                View::Products(ProductGrid::build(result, &self.filter, self.sort))
            }
            (Phase::ShowingResults, Some(Outcome::Analysis(result))) => {
                View::Analysis(AnalysisView::build(result, self.tab))
            }
            (_, None) => View::Empty,
        }
    }

    /// Shares the current results; falls back to the clipboard target.
    pub fn share(
        &self,
        native: Option<&dyn ShareTarget>,
        clipboard: &dyn ShareTarget,
    ) -> Result<ShareOutcome, QuanBuyError> {
        let outcome = self
            .result
            .as_ref()
            .filter(|o| o.error().is_none())
            .ok_or_else(|| QuanBuyError::Validation("There are no results to share".to_string()))?;
        share::share_results(&share::summary(outcome), native, clipboard)
    }
}
