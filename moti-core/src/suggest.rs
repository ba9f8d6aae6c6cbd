//! City autocomplete: a small local gazetteer merged with provider search.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};

use crate::{
    model::CitySuggestion,
    provider::WeatherProvider,
    sequence::{Sequencer, Ticket},
};

/// Quiet period between the last input change and the suggestion fetch.
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);
/// Shortest input sent to the remote search.
pub const MIN_REMOTE_INPUT: usize = 2;

/// Known cities offered without a network round-trip: (name, region, country).
pub const GAZETTEER: [(&str, &str, &str); 9] = [
    ("Prishtina", "Prishtina", "Kosovo"),
    ("Prizren", "Prizren", "Kosovo"),
    ("Peja", "Peja", "Kosovo"),
    ("Gjakova", "Gjakova", "Kosovo"),
    ("Mitrovica", "Mitrovica", "Kosovo"),
    ("Ferizaj", "Ferizaj", "Kosovo"),
    ("Gjilan", "Gjilan", "Kosovo"),
    ("Vushtrri", "Mitrovica", "Kosovo"),
    ("Podujeva", "Prishtina", "Kosovo"),
];

/// Gazetteer entries whose name contains `input`, ignoring case, in gazetteer order.
pub fn local_matches(input: &str) -> Vec<CitySuggestion> {
    let needle = input.to_lowercase();
    GAZETTEER
        .iter()
        .filter(|(name, _, _)| name.to_lowercase().contains(&needle))
        .map(|(name, region, country)| CitySuggestion::new(name, region, country))
        .collect()
}

/// Local matches first, then remote matches whose name isn't already listed.
pub fn merge_suggestions(
    local: Vec<CitySuggestion>,
    remote: Vec<CitySuggestion>,
) -> Vec<CitySuggestion> {
    let mut merged = local;
    for candidate in remote {
        if !merged.iter().any(|existing| existing.same_city(&candidate)) {
            merged.push(candidate);
        }
    }
    merged
}

#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    provider: Arc<dyn WeatherProvider>,
}

impl SuggestionEngine {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Never fails: a remote error degrades to local-only results.
    pub async fn suggest(&self, input: &str) -> Vec<CitySuggestion> {
        if input.is_empty() {
            return Vec::new();
        }

        let local = local_matches(input);

        let remote = if input.chars().count() >= MIN_REMOTE_INPUT {
            match self.provider.search(input).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(
                        input,
                        error = ?e,
                        "City search failed, using local suggestions only"
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        merge_suggestions(local, remote)
    }
}

/// Latest published suggestions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionList {
    pub input: String,
    pub items: Vec<CitySuggestion>,
    pub visible: bool,
}

/// Runs the engine once input has been quiet for the quiet period.
///
/// Each [`input`](Self::input) cancels a timer that hasn't fired yet. Once a
/// fetch has started it runs to completion, but its result is published only
/// if no newer fetch started in the meantime.
#[derive(Debug, Clone)]
pub struct SuggestionDebouncer {
    inner: Arc<DebouncerInner>,
}

#[derive(Debug)]
struct DebouncerInner {
    engine: SuggestionEngine,
    quiet: Duration,
    fetches: Sequencer,
    pending: Mutex<Option<JoinHandle<()>>>,
    latest: watch::Sender<SuggestionList>,
    runtime: Handle,
}

impl SuggestionDebouncer {
    pub fn new(engine: SuggestionEngine, runtime: Handle) -> Self {
        Self::with_quiet_period(engine, runtime, QUIET_PERIOD)
    }

    pub fn with_quiet_period(engine: SuggestionEngine, runtime: Handle, quiet: Duration) -> Self {
        let (latest, _) = watch::channel(SuggestionList::default());
        Self {
            inner: Arc::new(DebouncerInner {
                engine,
                quiet,
                fetches: Sequencer::new(),
                pending: Mutex::new(None),
                latest,
                runtime,
            }),
        }
    }

    /// Record a new input value and restart the quiet period.
    pub fn input(&self, text: &str) {
        let mut pending = self.inner.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(timer) = pending.take() {
            timer.abort();
        }

        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        *pending = Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep(inner.quiet).await;
            let ticket = inner.fetches.issue();
            let runtime = inner.runtime.clone();
            runtime.spawn(async move { inner.fetch(text, ticket).await });
        }));
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionList> {
        self.inner.latest.subscribe()
    }

    pub fn current(&self) -> SuggestionList {
        self.inner.latest.borrow().clone()
    }
}

impl DebouncerInner {
    async fn fetch(&self, input: String, ticket: Ticket) {
        let items = self.engine.suggest(&input).await;

        if !self.fetches.is_latest(ticket) {
            tracing::debug!(input, "Discarding superseded suggestions");
            return;
        }

        let visible = !input.is_empty();
        self.latest.send_replace(SuggestionList { input, items, visible });
    }
}
