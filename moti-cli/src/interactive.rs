//! Menu-driven session on top of the controller.

use inquire::{
    CustomUserError, InquireError, Select, Text,
    autocompletion::{Autocomplete, Replacement},
};
use std::{
    fmt,
    sync::{Arc, Mutex},
};
use tokio::{runtime::Handle, sync::watch};

use moti_core::{
    CitySuggestion, Controller, SuggestionDebouncer, SuggestionEngine, SuggestionList,
    suggest::local_matches,
};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Search,
    CurrentLocation,
    ShowWeather,
    ToggleFavorite,
    OpenFavorite,
    RemoveFavorite,
    OpenHistory,
    ClearHistory,
    Retry,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Search => "Search a city",
            Action::CurrentLocation => "Use my location",
            Action::ShowWeather => "Show weather",
            Action::ToggleFavorite => "Add/remove favorite",
            Action::OpenFavorite => "Open a favorite",
            Action::RemoveFavorite => "Remove a favorite",
            Action::OpenHistory => "Open from history",
            Action::ClearHistory => "Clear history",
            Action::Retry => "Try again",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Feeds every keystroke to the debouncer. Local matches show at once; the
/// merged list replaces them once the debouncer has published it for the
/// same input.
#[derive(Clone)]
struct CityAutocomplete {
    debouncer: SuggestionDebouncer,
    latest: watch::Receiver<SuggestionList>,
    // what the prompt is currently displaying
    shown: Arc<Mutex<Vec<CitySuggestion>>>,
}

impl CityAutocomplete {
    fn new(debouncer: &SuggestionDebouncer) -> Self {
        Self {
            debouncer: debouncer.clone(),
            latest: debouncer.subscribe(),
            shown: Arc::default(),
        }
    }

    fn displayed(&self, input: &str) -> Vec<CitySuggestion> {
        let list = self.latest.borrow();
        if list.visible && list.input == input {
            list.items.clone()
        } else {
            local_matches(input)
        }
    }

    fn remember(&self, items: Vec<CitySuggestion>) {
        *self.shown.lock().unwrap_or_else(|p| p.into_inner()) = items;
    }

    /// Map a displayed label back to its suggestion.
    fn resolve(&self, label: &str) -> Option<CitySuggestion> {
        self.shown
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|s| render::suggestion_label(s) == label)
            .cloned()
    }
}

impl Autocomplete for CityAutocomplete {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        self.debouncer.input(input);

        let items = if input.is_empty() { Vec::new() } else { self.displayed(input) };
        let labels = items.iter().map(render::suggestion_label).collect();
        self.remember(items);
        Ok(labels)
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion
            .and_then(|label| self.resolve(&label))
            .map(|s| s.name))
    }
}

pub async fn run(controller: Arc<Controller>, engine: SuggestionEngine) -> anyhow::Result<()> {
    // fire-and-forget: the menu is usable while the first lookup runs
    let _startup = controller.start();
    let debouncer = SuggestionDebouncer::new(engine, Handle::current());

    loop {
        let state = controller.snapshot();
        println!();
        println!("{}", render::status_line(&state));

        let mut actions = vec![Action::Search, Action::CurrentLocation];
        if state.weather.is_some() {
            actions.push(Action::ShowWeather);
            actions.push(Action::ToggleFavorite);
        }
        if state.error.is_some() {
            actions.push(Action::Retry);
        }
        if !state.favorites.is_empty() {
            actions.push(Action::OpenFavorite);
            actions.push(Action::RemoveFavorite);
        }
        if !state.history.is_empty() {
            actions.push(Action::OpenHistory);
            actions.push(Action::ClearHistory);
        }
        actions.push(Action::Quit);

        let Some(action) = ask(move || Select::new("What next?", actions).prompt()).await? else {
            break;
        };

        match action {
            Action::Search => search(&controller, &debouncer).await?,
            Action::CurrentLocation => match controller.use_current_location().await {
                Ok(()) => show(&controller),
                Err(e) => {
                    println!("Could not get your location ({e}). Set one with `moti configure`.")
                }
            },
            Action::ShowWeather => render::weather(&controller.snapshot()),
            Action::ToggleFavorite => match controller.toggle_favorite() {
                Some(true) => println!("Added to favorites."),
                Some(false) => println!("Removed from favorites."),
                None => {}
            },
            Action::OpenFavorite => {
                if let Some(city) = pick("Open favorite:", state.favorites).await? {
                    controller.select_favorite(&city).await;
                    show(&controller);
                }
            }
            Action::RemoveFavorite => {
                if let Some(city) = pick("Remove favorite:", state.favorites).await? {
                    controller.remove_favorite(&city);
                }
            }
            Action::OpenHistory => {
                let cities = state.history.into_iter().map(|h| h.city).collect();
                if let Some(city) = pick("Open from history:", cities).await? {
                    controller.select_history(&city).await;
                    show(&controller);
                }
            }
            Action::ClearHistory => {
                controller.clear_history();
                println!("Search history cleared.");
            }
            Action::Retry => {
                controller.retry().await;
                show(&controller);
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

async fn search(controller: &Controller, debouncer: &SuggestionDebouncer) -> anyhow::Result<()> {
    let autocomplete = CityAutocomplete::new(debouncer);
    let prompt_autocomplete = autocomplete.clone();

    let Some(text) = ask(move || {
        Text::new("City:")
            .with_autocomplete(prompt_autocomplete)
            .with_help_message("Type to see suggestions, ↑↓ to pick, Tab to complete")
            .prompt()
    })
    .await?
    else {
        return Ok(());
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }

    match autocomplete.resolve(text) {
        Some(suggestion) => controller.select_suggestion(&suggestion).await,
        None => controller.search(text).await,
    }

    show(controller);
    Ok(())
}

fn show(controller: &Controller) {
    let state = controller.snapshot();
    match &state.error {
        Some(err) => println!("⚠ {err}"),
        None => render::weather(&state),
    }
}

async fn pick(message: &'static str, options: Vec<String>) -> anyhow::Result<Option<String>> {
    ask(move || Select::new(message, options).prompt()).await
}

/// Run a blocking prompt off the async workers. Esc / Ctrl-C yield `None`.
async fn ask<T, F>(prompt: F) -> anyhow::Result<Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
{
    match tokio::task::spawn_blocking(prompt).await? {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
