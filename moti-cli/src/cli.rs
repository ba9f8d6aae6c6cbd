use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Text};
use std::sync::Arc;

use moti_core::{
    Config, Controller, FileStore, Phase, Store, SuggestionEngine, WeatherProvider,
    geolocation::{CachedGeolocator, StaticGeolocator},
    provider_from_config,
};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "moti", version, about = "Weather lookup with favorites and search history")]
pub struct Cli {
    /// Forecast length in days (1-10). Defaults to the configured value.
    #[arg(long, global = true)]
    pub days: Option<u8>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, default city and an optional fixed position.
    Configure,

    /// List city suggestions for a partial name.
    Suggest { partial: String },

    /// List or edit favorite cities.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Show the search history.
    History {
        /// Forget all searches.
        #[arg(long)]
        clear: bool,
    },

    #[command(flatten)]
    Lookup(Lookup),
}

/// Commands that go through the controller.
#[derive(Debug, Subcommand)]
pub enum Lookup {
    /// Show weather for a city name or a "lat,lon" pair.
    Show {
        query: String,

        /// Add the resolved city to favorites, or remove it if already there.
        #[arg(long)]
        toggle_favorite: bool,
    },

    /// Show weather at coordinates, as if clicking a point on the map.
    At {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Show weather at your configured position.
    Here,

    /// Repeat the most recent search, or look up the default city.
    Retry,

    /// Interactive session with autocomplete (the default).
    Interactive,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    Add { city: String },
    Remove { city: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let command = self.command.unwrap_or(Command::Lookup(Lookup::Interactive));

        match command {
            Command::Configure => configure()?,
            Command::Favorites { action } => {
                let store = open_store(&Config::load()?)?;
                match action.unwrap_or(FavoritesAction::List) {
                    FavoritesAction::List => {}
                    FavoritesAction::Add { city } => store.add_favorite(city.trim()),
                    FavoritesAction::Remove { city } => store.remove_favorite(city.trim()),
                }
                render::favorites(&store.load_favorites());
            }
            Command::History { clear } => {
                let store = open_store(&Config::load()?)?;
                if clear {
                    store.clear_history();
                    println!("Search history cleared.");
                } else {
                    render::history(&store.load_history());
                }
            }
            Command::Suggest { partial } => {
                let provider = build_provider(&Config::load()?)?;
                let items = SuggestionEngine::new(provider).suggest(&partial).await;
                render::suggestions(&items);
            }
            Command::Lookup(lookup) => {
                let config = Config::load()?;
                let store = open_store(&config)?;
                let provider = build_provider(&config)?;
                let controller =
                    Arc::new(build_controller(&config, provider.clone(), store, self.days));
                controller.hydrate();
                run_lookup(lookup, controller, SuggestionEngine::new(provider)).await?;
            }
        }

        Ok(())
    }
}

async fn run_lookup(
    lookup: Lookup,
    controller: Arc<Controller>,
    engine: SuggestionEngine,
) -> anyhow::Result<()> {
    match lookup {
        Lookup::Show { query, toggle_favorite } => {
            controller.search(query.trim()).await;
            finish_lookup(&controller)?;
            if toggle_favorite {
                match controller.toggle_favorite() {
                    Some(true) => println!("Added to favorites."),
                    Some(false) => println!("Removed from favorites."),
                    None => {}
                }
            }
        }
        Lookup::At { lat, lon } => {
            controller.map_click(lat, lon).await;
            finish_lookup(&controller)?;
        }
        Lookup::Here => {
            controller.use_current_location().await.map_err(|e| {
                anyhow!(
                    "Could not get your location ({e}).\n\
                     Hint: set a position with `moti configure`."
                )
            })?;
            finish_lookup(&controller)?;
        }
        Lookup::Retry => {
            controller.retry().await;
            finish_lookup(&controller)?;
        }
        Lookup::Interactive => interactive::run(controller, engine).await?,
    }

    Ok(())
}

/// Print the loaded weather, or turn a failed lookup into an error exit.
fn finish_lookup(controller: &Controller) -> anyhow::Result<()> {
    let state = controller.snapshot();
    if let Some(err) = state.error.clone() {
        return Err(err.into());
    }
    if state.phase() == Phase::Loaded {
        render::weather(&state);
    }
    Ok(())
}

fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    Ok(Arc::new(provider_from_config(config)?))
}

fn open_store(config: &Config) -> anyhow::Result<Arc<Store>> {
    let files = FileStore::new(config.data_dir()?);
    tracing::debug!(dir = %files.dir().display(), "Opening data store");
    Ok(Arc::new(Store::new(files)))
}

fn build_controller(
    config: &Config,
    provider: Arc<dyn WeatherProvider>,
    store: Arc<Store>,
    days: Option<u8>,
) -> Controller {
    let geolocator = Arc::new(CachedGeolocator::new(StaticGeolocator::new(config.location)));
    let days = days.unwrap_or_else(|| config.forecast_days());

    Controller::new(provider, store, geolocator)
        .with_default_city(config.default_city())
        .with_forecast_days(days)
}

/// Interactive first-run setup.
fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("WeatherAPI.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get a free key at https://www.weatherapi.com")
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    let city = Text::new("Default city:")
        .with_default(config.default_city())
        .prompt()
        .context("Failed to read default city")?;
    config.default_city = Some(city.trim().to_string());

    let fixed = Confirm::new("Set a fixed position for `moti here` and startup lookups?")
        .with_default(config.location.is_some())
        .prompt()
        .context("Failed to read answer")?;
    config.location = if fixed {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a number, e.g. 42.66")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a number, e.g. 21.16")
            .prompt()?;
        Some(moti_core::Coordinates { latitude, longitude })
    } else {
        None
    };

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
