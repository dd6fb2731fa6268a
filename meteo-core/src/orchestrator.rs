//! One weather lookup: validate, count, fetch current + forecast, summarize.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    clock::{Clock, SystemClock},
    counter::CallVolumeCounter,
    error::FetchError,
    forecast::{aggregate, local_date},
    model::{Language, LocationQuery, WeatherReport},
    provider::WeatherProvider,
};

/// Provider asked us to slow down. Shown instead of an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitNotice {
    pub seconds_left: Option<u64>,
    pub message: String,
}

/// What a weather display needs to render at any moment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherView {
    pub loading: bool,
    pub error: Option<String>,
    pub rate_limit: Option<RateLimitNotice>,
    pub report: Option<WeatherReport>,
}

pub struct WeatherQueryOrchestrator {
    provider: Arc<dyn WeatherProvider>,
    counter: Option<CallVolumeCounter>,
    clock: Arc<dyn Clock>,
    view: watch::Sender<WeatherView>,
    /// Counter updates still running in the background.
    recording: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for WeatherQueryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherQueryOrchestrator")
            .field("provider", &self.provider)
            .field("counter", &self.counter)
            .finish()
    }
}

impl WeatherQueryOrchestrator {
    pub fn new(provider: Arc<dyn WeatherProvider>, counter: Option<CallVolumeCounter>) -> Self {
        let (view, _) = watch::channel(WeatherView::default());
        Self {
            provider,
            counter,
            clock: Arc::new(SystemClock),
            view,
            recording: Mutex::new(Vec::new()),
        }
    }

    /// Use `clock` to decide which forecast day is "today".
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> WeatherView {
        self.view.borrow().clone()
    }

    /// Wait for background counter updates started by earlier lookups.
    pub async fn flush_counter(&self) {
        let pending: Vec<_> = self.recording.lock().drain(..).collect();
        for task in pending {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "Counter update task did not finish");
            }
        }
    }

    /// Record the call on a background task so a slow store never holds up
    /// the lookup.
    fn spawn_record(&self) {
        let Some(counter) = self.counter.clone() else {
            return;
        };

        let task = tokio::spawn(async move { counter.record_call().await });
        let mut recording = self.recording.lock();
        recording.retain(|t| !t.is_finished());
        recording.push(task);
    }

    /// Fetch current conditions and the daily forecast for `location`.
    ///
    /// The published [`WeatherView`] is `loading` for the whole call. On
    /// failure the previous report is dropped; a 429 fills `rate_limit`,
    /// anything else fills `error`.
    pub async fn fetch_weather(
        &self,
        location: &LocationQuery,
        language: Language,
    ) -> Result<WeatherReport, FetchError> {
        self.view.send_modify(|view| {
            view.loading = true;
            view.error = None;
            view.rate_limit = None;
        });

        let result = self.fetch(location, language).await;

        self.view.send_modify(|view| {
            view.loading = false;
            match &result {
                Ok(report) => view.report = Some(report.clone()),
                Err(FetchError::RateLimited { seconds_left }) => {
                    view.report = None;
                    view.rate_limit = Some(RateLimitNotice {
                        seconds_left: *seconds_left,
                        message: FetchError::RateLimited { seconds_left: *seconds_left }
                            .user_message(),
                    });
                }
                Err(e) => {
                    view.report = None;
                    view.error = Some(e.user_message());
                }
            }
        });

        result
    }

    async fn fetch(
        &self,
        location: &LocationQuery,
        language: Language,
    ) -> Result<WeatherReport, FetchError> {
        location.validate()?;

        self.spawn_record();

        let fetched = tokio::try_join!(
            self.provider.current(location, language),
            self.provider.forecast(location, language),
        );
        let (current, feed) = fetched.inspect_err(|e| {
            tracing::warn!(%location, error = %e, "Weather lookup failed");
        })?;

        let today = local_date(self.clock.now(), feed.utc_offset);
        let daily = aggregate(&feed.samples, today, feed.utc_offset);

        tracing::info!(%location, %language, days = daily.len(), "Fetched weather");
        Ok(WeatherReport { current, daily, language })
    }
}
