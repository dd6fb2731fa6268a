//! Autocomplete state for the place search field.
//!
//! [`SuggestionResolver`] owns the suggestion list and reacts to input,
//! focus, keyboard and selection events. Resolution is debounced and runs on
//! a spawned tokio task; each new query bumps a generation number, and a
//! result is only applied if its generation is still the current one, so the
//! last issued query always wins regardless of which response lands last.
//!
//! State changes are published on a [`watch`] channel, selections and submits
//! on an unbounded [`mpsc`] channel. All event methods must be called from
//! within a tokio runtime.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    config::SuggestConfig,
    model::{Language, PlaceSuggestion},
    places::StaticPlaceIndex,
    provider::GeocodingProvider,
};

/// Keys the list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        match value {
            "ArrowDown" => Key::ArrowDown,
            "ArrowUp" => Key::ArrowUp,
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// Where focus went when the search field lost it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurTarget {
    /// One of the suggestion items; the list must stay open for the click.
    Suggestion,
    Elsewhere,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolverEvent {
    Selected(PlaceSuggestion),
    /// Free-text submit of the current query.
    Submitted(String),
    /// The search field should take focus again.
    FocusInput,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestionListState {
    pub query: String,
    pub items: Vec<PlaceSuggestion>,
    pub highlighted_index: Option<usize>,
    pub open: bool,
    /// A resolution is scheduled or in flight.
    pub resolving: bool,
}

/// One listbox option as the UI should render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListOption {
    pub id: String,
    pub key: String,
    pub label: String,
    pub selected: bool,
}

impl SuggestionListState {
    pub fn is_visible(&self) -> bool {
        self.open && !self.items.is_empty()
    }

    pub fn highlighted(&self) -> Option<&PlaceSuggestion> {
        self.highlighted_index.and_then(|i| self.items.get(i))
    }

    /// Listbox options keyed by coordinates, `selected` mirroring the highlight.
    pub fn options(&self) -> Vec<ListOption> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| ListOption {
                id: option_id(i),
                key: item.item_key(),
                label: item.label(),
                selected: self.highlighted_index == Some(i),
            })
            .collect()
    }

    /// Id of the highlighted option, for `aria-activedescendant`.
    pub fn active_descendant(&self) -> Option<String> {
        self.highlighted_index.map(option_id)
    }
}

fn option_id(index: usize) -> String {
    format!("autocomplete-item-{index}")
}

enum Resolution {
    /// Query too short: nothing to show.
    Cleared,
    Items(Vec<PlaceSuggestion>),
}

struct Inner {
    list: SuggestionListState,
    language: Language,
    index: Arc<StaticPlaceIndex>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    blur_close: Option<JoinHandle<()>>,
}

impl Inner {
    /// Invalidate any scheduled or in-flight resolution.
    fn cancel_pending(&mut self) {
        self.generation += 1;
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        self.list.resolving = false;
    }

    fn reset_list(&mut self) {
        self.cancel_pending();
        self.list.items.clear();
        self.list.open = false;
        self.list.highlighted_index = None;
    }
}

struct Shared {
    geocoder: Arc<dyn GeocodingProvider>,
    settings: SuggestConfig,
    state: Mutex<Inner>,
    published: watch::Sender<SuggestionListState>,
    events: mpsc::UnboundedSender<ResolverEvent>,
}

#[derive(Clone)]
pub struct SuggestionResolver {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SuggestionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionResolver")
            .field("geocoder", &self.shared.geocoder)
            .field("state", &self.state())
            .finish()
    }
}

impl SuggestionResolver {
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        language: Language,
        settings: SuggestConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ResolverEvent>) {
        let (published, _) = watch::channel(SuggestionListState::default());
        let (events, events_rx) = mpsc::unbounded_channel();

        let inner = Inner {
            list: SuggestionListState::default(),
            language,
            index: Arc::new(StaticPlaceIndex::builtin(language)),
            generation: 0,
            pending: None,
            blur_close: None,
        };

        let shared = Shared {
            geocoder,
            settings,
            state: Mutex::new(inner),
            published,
            events,
        };

        (Self { shared: Arc::new(shared) }, events_rx)
    }

    /// Current list state.
    pub fn state(&self) -> SuggestionListState {
        self.shared.state.lock().list.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionListState> {
        self.shared.published.subscribe()
    }

    /// Wait until no resolution is pending and return the state at that point.
    pub async fn settled(&self) -> SuggestionListState {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| !s.resolving).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    pub fn on_query_change(&self, text: &str) {
        let mut inner = self.shared.state.lock();
        inner.list.query = text.to_string();
        inner.list.open = true;
        inner.list.highlighted_index = None;
        self.schedule(&mut inner);
        self.publish(&inner);
    }

    pub fn on_focus(&self) {
        let mut inner = self.shared.state.lock();
        if let Some(task) = inner.blur_close.take() {
            task.abort();
        }
        if !inner.list.items.is_empty() && !inner.list.open {
            inner.list.open = true;
            self.publish(&inner);
        }
    }

    pub fn on_blur(&self, target: BlurTarget) {
        if target == BlurTarget::Suggestion {
            return;
        }

        let this = self.clone();
        let grace = self.shared.settings.blur_grace();
        let task = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut inner = this.shared.state.lock();
            inner.blur_close = None;
            if inner.list.open {
                inner.list.open = false;
                this.publish(&inner);
            }
        });

        let mut inner = self.shared.state.lock();
        if let Some(previous) = inner.blur_close.replace(task) {
            previous.abort();
        }
    }

    pub fn on_key(&self, key: Key) {
        let mut inner = self.shared.state.lock();
        let len = inner.list.items.len();
        let visible = inner.list.is_visible();

        match key {
            Key::ArrowDown if visible => {
                inner.list.highlighted_index = Some(match inner.list.highlighted_index {
                    Some(i) => (i + 1) % len,
                    None => 0,
                });
                self.publish(&inner);
            }
            Key::ArrowUp if visible => {
                inner.list.highlighted_index = Some(match inner.list.highlighted_index {
                    Some(i) if i > 0 => i - 1,
                    _ => len - 1,
                });
                self.publish(&inner);
            }
            Key::Enter => {
                let choice = if visible { inner.list.highlighted().cloned() } else { None };
                drop(inner);
                match choice {
                    Some(suggestion) => self.on_select(suggestion),
                    None => self.on_submit(),
                }
            }
            Key::Escape => {
                if inner.list.open {
                    inner.list.open = false;
                    self.publish(&inner);
                }
            }
            _ => {}
        }
    }

    pub fn on_select(&self, suggestion: PlaceSuggestion) {
        {
            let mut inner = self.shared.state.lock();
            inner.reset_list();
            self.publish(&inner);
        }

        tracing::debug!(place = %suggestion.label(), "Suggestion selected");
        self.emit(ResolverEvent::Selected(suggestion));
        self.emit(ResolverEvent::FocusInput);
    }

    pub fn on_submit(&self) {
        let query = {
            let mut inner = self.shared.state.lock();
            inner.reset_list();
            self.publish(&inner);
            inner.list.query.trim().to_string()
        };

        if !query.is_empty() {
            self.emit(ResolverEvent::Submitted(query));
        }
    }

    /// The field's text was replaced from outside (e.g. after a selection).
    /// Clears the list without resolving the new text.
    pub fn set_value(&self, text: &str) {
        let mut inner = self.shared.state.lock();
        if inner.list.query == text {
            return;
        }
        inner.list.query = text.to_string();
        inner.reset_list();
        self.publish(&inner);
    }

    /// Switch the display language; a non-empty query is resolved again.
    pub fn set_language(&self, language: Language) {
        let mut inner = self.shared.state.lock();
        if inner.language == language {
            return;
        }
        inner.language = language;
        inner.index = Arc::new(StaticPlaceIndex::builtin(language));

        if !inner.list.query.is_empty() {
            self.schedule(&mut inner);
            self.publish(&inner);
        }
    }

    fn schedule(&self, inner: &mut Inner) {
        inner.cancel_pending();
        inner.list.resolving = true;

        let generation = inner.generation;
        let query = inner.list.query.clone();
        let language = inner.language;
        let index = Arc::clone(&inner.index);
        let this = self.clone();

        inner.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(this.shared.settings.debounce()).await;
            this.resolve(generation, &query, language, &index).await;
        }));
    }

    async fn resolve(&self, generation: u64, query: &str, language: Language, index: &StaticPlaceIndex) {
        let settings = &self.shared.settings;
        let query = query.trim();

        if query.chars().count() < settings.min_query_len {
            self.apply(generation, Resolution::Cleared, true);
            return;
        }

        let local = index.search(query, settings.local_limit());
        if !local.is_empty() {
            self.apply(generation, Resolution::Items(local.clone()), false);
        }

        let remote = tokio::time::timeout(
            settings.remote_timeout(),
            self.shared.geocoder.geocode(query, settings.remote_limit(), language),
        )
        .await;

        let items = match remote {
            Ok(Ok(mut places)) if !places.is_empty() => {
                places.truncate(settings.remote_limit());
                places
            }
            Ok(Ok(_)) => {
                tracing::debug!(query, "Geocoding returned no matches, using built-in places");
                local
            }
            Ok(Err(e)) => {
                tracing::debug!(query, error = %e, "Geocoding failed, using built-in places");
                local
            }
            Err(_) => {
                tracing::debug!(query, "Geocoding timed out, using built-in places");
                local
            }
        };

        self.apply(generation, Resolution::Items(items), true);
    }

    /// Apply a resolution if `generation` is still current. Returns whether it
    /// was applied.
    fn apply(&self, generation: u64, resolution: Resolution, settled: bool) -> bool {
        let mut inner = self.shared.state.lock();
        if inner.generation != generation {
            tracing::debug!(generation, current = inner.generation, "Discarding stale suggestions");
            return false;
        }

        match resolution {
            Resolution::Cleared => {
                inner.list.items.clear();
                inner.list.open = false;
            }
            Resolution::Items(items) => inner.list.items = items,
        }
        inner.list.highlighted_index = None;

        if settled {
            inner.list.resolving = false;
            inner.pending = None;
        }

        self.publish(&inner);
        true
    }

    fn publish(&self, inner: &Inner) {
        self.shared.published.send_replace(inner.list.clone());
    }

    fn emit(&self, event: ResolverEvent) {
        if self.shared.events.send(event).is_err() {
            tracing::debug!("Resolver event dropped, no receiver");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Geocoder that records every query and answers after a per-query delay.
    #[derive(Debug, Default)]
    struct FakeGeocoder {
        calls: Mutex<Vec<String>>,
        fail: bool,
        /// Answer with this many places, ignoring the requested limit.
        answer_len: Option<usize>,
        delays: Vec<(&'static str, Duration)>,
    }

    impl FakeGeocoder {
        fn failing() -> Self {
            Self { fail: true, ..Default::default() }
        }

        fn with_delays(delays: Vec<(&'static str, Duration)>) -> Self {
            Self { delays, ..Default::default() }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl GeocodingProvider for FakeGeocoder {
        async fn geocode(
            &self,
            query: &str,
            limit: usize,
            language: Language,
        ) -> Result<Vec<PlaceSuggestion>, FetchError> {
            self.calls.lock().push(query.to_string());

            let delay = self
                .delays
                .iter()
                .find(|(q, _)| *q == query)
                .map(|(_, d)| *d)
                .unwrap_or(Duration::from_millis(10));
            tokio::time::sleep(delay).await;

            if self.fail {
                return Err(FetchError::Provider { status: 500, message: "down".into() });
            }

            Ok((0..self.answer_len.unwrap_or(limit.min(2)))
                .map(|i| {
                    PlaceSuggestion::new(
                        format!("{query} {i}"),
                        "GB",
                        None,
                        51.0 + i as f64,
                        0.0,
                        language,
                    )
                })
                .collect())
        }
    }

    fn resolver_with(
        geocoder: Arc<FakeGeocoder>,
    ) -> (SuggestionResolver, mpsc::UnboundedReceiver<ResolverEvent>) {
        SuggestionResolver::new(geocoder, Language::En, SuggestConfig::default())
    }

    fn place(name: &str) -> PlaceSuggestion {
        PlaceSuggestion::new(name, "ES", None, 40.0, -3.0, Language::En)
    }

    /// Put `items` straight into the list, opened.
    fn seed(resolver: &SuggestionResolver, items: Vec<PlaceSuggestion>) {
        let mut inner = resolver.shared.state.lock();
        inner.list.items = items;
        inner.list.open = true;
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn query_change_updates_immediately_and_resolves_after_debounce() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let (resolver, _events) = resolver_with(geocoder.clone());

        resolver.on_query_change("London");
        let state = resolver.state();
        assert_eq!(state.query, "London");
        assert!(state.open);
        assert!(state.resolving);
        assert!(geocoder.calls().is_empty());

        wait(600).await;
        let state = resolver.state();
        assert!(!state.resolving);
        assert_eq!(geocoder.calls(), ["London"]);
        assert_eq!(state.items[0].name, "London 0");
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_coalesces_into_one_resolution() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let (resolver, _events) = resolver_with(geocoder.clone());

        resolver.on_query_change("London");
        wait(100).await;
        resolver.on_query_change("Lond");
        wait(100).await;
        resolver.on_query_change("Lon");

        wait(1_000).await;
        assert_eq!(geocoder.calls(), ["Lon"]);
        assert_eq!(resolver.state().query, "Lon");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_response_never_overwrites_newer_query() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(vec![
            ("Lon", Duration::from_secs(2)),
            ("London", Duration::from_millis(10)),
        ]));
        let (resolver, _events) = resolver_with(geocoder.clone());

        resolver.on_query_change("Lon");
        wait(600).await;
        assert_eq!(geocoder.calls(), ["Lon"]);

        resolver.on_query_change("London");
        wait(600).await;
        assert_eq!(resolver.state().items[0].name, "London 0");

        wait(3_000).await;
        let state = resolver.state();
        assert_eq!(state.query, "London");
        assert_eq!(state.items[0].name, "London 0");
        assert!(!state.resolving);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_rejected() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        resolver.on_query_change("Lon");
        let stale = resolver.shared.state.lock().generation;
        resolver.on_query_change("London");

        let applied = resolver.apply(stale, Resolution::Items(vec![place("Stale")]), true);
        assert!(!applied);
        assert!(resolver.state().items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_failure_falls_back_to_builtin_places() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::failing()));

        resolver.on_query_change("Mad");
        let state = resolver.settled().await;

        assert!(state.items.len() <= 3);
        let labels: Vec<_> = state.items.iter().map(PlaceSuggestion::label).collect();
        assert!(labels.contains(&"Madrid, Spain".to_string()));
        assert!(state.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_results_replace_local_matches() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(vec![("Madrid", Duration::from_secs(1))]));
        let (resolver, _events) = resolver_with(geocoder);

        resolver.on_query_change("Madrid");
        wait(600).await;
        // Built-in match is shown while the remote lookup is in flight.
        let state = resolver.state();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].name, "Madrid");
        assert!(state.resolving);

        wait(1_000).await;
        let names: Vec<_> = resolver.state().items.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Madrid 0", "Madrid 1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_times_out_to_local_matches() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(vec![("Paris", Duration::from_secs(60))]));
        let (resolver, _events) = resolver_with(geocoder);

        resolver.on_query_change("Paris");
        let state = resolver.settled().await;
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].name, "Paris");
    }

    #[tokio::test(start_paused = true)]
    async fn list_never_exceeds_five_items() {
        let geocoder = Arc::new(FakeGeocoder { answer_len: Some(8), ..Default::default() });
        let settings = SuggestConfig { remote_limit: 8, local_limit: 8, ..Default::default() };
        let (resolver, _events) = SuggestionResolver::new(geocoder, Language::En, settings);

        resolver.on_query_change("an");
        let state = resolver.settled().await;
        assert_eq!(state.items.len(), 5);
        assert_eq!(state.items[4].name, "an 4");
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_clears_and_closes_without_remote_call() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let (resolver, _events) = resolver_with(geocoder.clone());
        seed(&resolver, vec![place("Madrid")]);

        resolver.on_query_change("M");
        let state = resolver.settled().await;
        assert!(state.items.is_empty());
        assert!(!state.open);
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn arrow_keys_wrap_in_both_directions() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        seed(&resolver, vec![place("A"), place("B"), place("C")]);

        resolver.on_key(Key::ArrowUp);
        assert_eq!(resolver.state().highlighted_index, Some(2));

        resolver.on_key(Key::ArrowDown);
        assert_eq!(resolver.state().highlighted_index, Some(0));

        resolver.on_key(Key::ArrowUp);
        assert_eq!(resolver.state().highlighted_index, Some(2));

        resolver.on_key(Key::ArrowDown);
        resolver.on_key(Key::ArrowDown);
        assert_eq!(resolver.state().highlighted_index, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn arrow_keys_are_ignored_while_list_is_hidden() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        resolver.on_key(Key::ArrowDown);
        assert_eq!(resolver.state().highlighted_index, None);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_selects_highlighted_item() {
        let (resolver, mut events) = resolver_with(Arc::new(FakeGeocoder::default()));
        seed(&resolver, vec![place("A"), place("B")]);

        resolver.on_key(Key::ArrowDown);
        resolver.on_key(Key::ArrowDown);
        resolver.on_key(Key::Enter);

        assert_eq!(events.recv().await, Some(ResolverEvent::Selected(place("B"))));
        assert_eq!(events.recv().await, Some(ResolverEvent::FocusInput));
    }

    #[tokio::test(start_paused = true)]
    async fn enter_without_highlight_submits_query() {
        let (resolver, mut events) = resolver_with(Arc::new(FakeGeocoder::default()));
        resolver.on_query_change("Lima ");
        resolver.on_key(Key::Enter);

        assert_eq!(events.recv().await, Some(ResolverEvent::Submitted("Lima".into())));
        let state = resolver.state();
        assert!(!state.open);
        assert!(state.items.is_empty());
        assert!(!state.resolving);
    }

    #[tokio::test(start_paused = true)]
    async fn escape_closes_but_keeps_query() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        resolver.on_query_change("Quito");
        resolver.settled().await;

        resolver.on_key(Key::Escape);
        let state = resolver.state();
        assert!(!state.open);
        assert_eq!(state.query, "Quito");
        assert!(!state.items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_resets_list_and_emits_exact_suggestion() {
        let (resolver, mut events) = resolver_with(Arc::new(FakeGeocoder::default()));
        resolver.on_query_change("Madrid");
        let state = resolver.settled().await;
        let chosen = state.items[1].clone();

        resolver.on_key(Key::ArrowDown);
        resolver.on_select(chosen.clone());

        let state = resolver.state();
        assert!(state.items.is_empty());
        assert!(!state.open);
        assert_eq!(state.highlighted_index, None);
        assert_eq!(events.recv().await, Some(ResolverEvent::Selected(chosen)));
    }

    #[tokio::test(start_paused = true)]
    async fn selection_cancels_pending_resolution() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let (resolver, _events) = resolver_with(geocoder.clone());

        resolver.on_query_change("Berlin");
        resolver.on_select(place("Madrid"));
        wait(1_000).await;

        assert!(geocoder.calls().is_empty());
        assert!(resolver.state().items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn external_overwrite_clears_without_resolving() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let (resolver, _events) = resolver_with(geocoder.clone());
        seed(&resolver, vec![place("Madrid")]);

        resolver.set_value("Madrid, ES");
        wait(1_000).await;

        let state = resolver.state();
        assert_eq!(state.query, "Madrid, ES");
        assert!(state.items.is_empty());
        assert!(!state.open);
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn blur_closes_after_grace_unless_focus_moved_to_suggestion() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        seed(&resolver, vec![place("A")]);

        resolver.on_blur(BlurTarget::Suggestion);
        wait(500).await;
        assert!(resolver.state().open);

        resolver.on_blur(BlurTarget::Elsewhere);
        wait(100).await;
        assert!(resolver.state().open);
        wait(200).await;
        assert!(!resolver.state().open);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_reopens_non_empty_list_and_cancels_blur() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        seed(&resolver, vec![place("A")]);

        resolver.on_key(Key::Escape);
        assert!(!resolver.state().open);

        resolver.on_focus();
        assert!(resolver.state().open);

        resolver.on_blur(BlurTarget::Elsewhere);
        wait(50).await;
        resolver.on_focus();
        wait(500).await;
        assert!(resolver.state().open);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_keeps_empty_list_closed() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        resolver.on_focus();
        assert!(!resolver.state().open);
    }

    #[tokio::test(start_paused = true)]
    async fn language_switch_relocalizes_builtin_places() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::failing()));
        resolver.on_query_change("Mad");
        resolver.settled().await;

        resolver.set_language(Language::Es);
        let state = resolver.settled().await;
        assert_eq!(state.items[0].country_name, "España");
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_published_state() {
        let (resolver, _events) = resolver_with(Arc::new(FakeGeocoder::default()));
        let rx = resolver.subscribe();

        resolver.on_query_change("Rome");
        assert_eq!(rx.borrow().query, "Rome");
    }

    #[test]
    fn options_mirror_highlight() {
        let state = SuggestionListState {
            items: vec![place("A"), place("B")],
            highlighted_index: Some(1),
            open: true,
            ..Default::default()
        };

        let options = state.options();
        assert_eq!(options.len(), 2);
        assert!(!options[0].selected);
        assert!(options[1].selected);
        assert_eq!(options[1].key, "40--3");
        assert_eq!(state.active_descendant().as_deref(), Some("autocomplete-item-1"));
        assert_eq!(state.highlighted().map(|p| p.name.as_str()), Some("B"));
    }

    #[test]
    fn key_names_parse() {
        assert_eq!(Key::from("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from("Escape"), Key::Escape);
        assert_eq!(Key::from("Tab"), Key::Other);
    }
}
