use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Select, Text};
use std::sync::Arc;

use meteo_core::{
    CallVolumeCounter, Config, Key, Language, LocationQuery, ResolverEvent, SuggestionResolver,
    UpstashStore, WeatherQueryOrchestrator, provider::provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Weather lookups with place suggestions")]
pub struct Cli {
    /// Display language ("en" or "es"); defaults to the configured one.
    #[arg(long, global = true)]
    pub lang: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and default language.
    Configure,

    /// Show current weather and the daily forecast.
    Show {
        /// Place name, e.g. "Madrid" or "Madrid, ES".
        place: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List place suggestions for a partial name.
    Suggest {
        query: String,
    },

    /// Type a place, pick a suggestion, see its weather.
    Search,

    /// Show the call-volume counter.
    Usage,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let language = match self.lang.as_deref() {
            Some(code) => Language::try_from(code)?,
            None => config.language,
        };

        match self.command {
            Command::Configure => configure(config)?,
            Command::Show { place, lat, lon } => {
                let location = LocationQuery::from_params(place.as_deref(), lat, lon)
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
                show(&config, &location, language).await?;
            }
            Command::Suggest { query } => suggest(&config, &query, language).await?,
            Command::Search => search(&config, language).await?,
            Command::Usage => usage(&config).await?,
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Text::new("OpenWeather API key:")
        .with_initial_value(config.api_key().unwrap_or_default())
        .prompt()
        .context("Failed to read API key")?;

    let language = Select::new("Default language:", Language::all().to_vec())
        .with_starting_cursor(if config.language == Language::Es { 1 } else { 0 })
        .prompt()
        .context("Failed to read language")?;

    config.set_api_key(api_key.trim().to_string());
    config.language = language;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Counter from config, when enabled and fully configured.
fn counter_from_config(config: &Config) -> anyhow::Result<Option<CallVolumeCounter>> {
    let settings = &config.counter;
    if !settings.enabled {
        return Ok(None);
    }

    match (&settings.rest_url, &settings.rest_token) {
        (Some(url), Some(token)) => {
            let store = UpstashStore::new(url, token.clone(), config.timeout())?;
            Ok(Some(CallVolumeCounter::with_system_clock(Arc::new(store))))
        }
        _ => {
            tracing::warn!("Call counting enabled but Upstash URL or token is missing");
            Ok(None)
        }
    }
}

async fn show(config: &Config, location: &LocationQuery, language: Language) -> anyhow::Result<()> {
    let provider = provider_from_config(config)?;
    let orchestrator =
        WeatherQueryOrchestrator::new(Arc::new(provider), counter_from_config(config)?);

    let result = orchestrator.fetch_weather(location, language).await;
    if let Ok(report) = &result {
        println!("{}", render::report(report));
    }

    // Output is already on screen; let the counter update land before exit.
    orchestrator.flush_counter().await;

    if let Err(e) = result {
        tracing::debug!(error = %e, "Lookup failed");
        bail!(e.user_message());
    }
    Ok(())
}

fn resolver(
    config: &Config,
    language: Language,
) -> anyhow::Result<(SuggestionResolver, tokio::sync::mpsc::UnboundedReceiver<ResolverEvent>)> {
    let provider = provider_from_config(config)?;
    Ok(SuggestionResolver::new(Arc::new(provider), language, config.suggest.clone()))
}

async fn suggest(config: &Config, query: &str, language: Language) -> anyhow::Result<()> {
    let (resolver, _events) = resolver(config, language)?;

    resolver.on_query_change(query);
    let state = resolver.settled().await;

    if state.items.is_empty() {
        println!("No suggestions for '{query}'");
    } else {
        println!("{}", render::suggestions(&state.items));
    }
    Ok(())
}

async fn search(config: &Config, language: Language) -> anyhow::Result<()> {
    let (resolver, mut events) = resolver(config, language)?;

    let query = Text::new("Place:").prompt().context("Failed to read place")?;
    resolver.on_focus();
    resolver.on_query_change(&query);
    let state = resolver.settled().await;

    if state.is_visible() {
        let options = state.options();
        let labels: Vec<String> = options.iter().map(|o| o.label.clone()).collect();

        match Select::new("Choose a place:", labels).raw_prompt() {
            Ok(choice) => resolver.on_select(state.items[choice.index].clone()),
            Err(InquireError::OperationCanceled) => {
                resolver.on_key(Key::Escape);
                resolver.on_submit();
            }
            Err(e) => return Err(e).context("Failed to read selection"),
        }
    } else {
        resolver.on_key(Key::Enter);
    }

    let location = match events.try_recv() {
        Ok(ResolverEvent::Selected(place)) => {
            resolver.set_value(&place.field_text());
            println!("{}", place.field_text());
            place.coordinates()
        }
        Ok(ResolverEvent::Submitted(text)) => LocationQuery::Place(text),
        Ok(ResolverEvent::FocusInput) | Err(_) => bail!("Nothing to search for"),
    };

    show(config, &location, language).await
}

async fn usage(config: &Config) -> anyhow::Result<()> {
    let Some(counter) = counter_from_config(config)? else {
        println!(
            "Call counting is disabled.\n\
             Hint: set USE_UPSTASH=true with UPSTASH_REDIS_REST_URL and UPSTASH_REDIS_REST_TOKEN."
        );
        return Ok(());
    };

    let state = counter.snapshot().await?;
    println!("{}", render::usage(&state));
    Ok(())
}
