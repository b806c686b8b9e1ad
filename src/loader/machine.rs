//! Progressive loading state machine for one displayed media element.
//!
//! ```text
//! Init -> LoadingOptimized -> LoadingDirect -> LoadingAltGateway(0..n) -> LoadingFallback -> Failed
//!                \______________________________________________________________/
//!                                   load ok / timeout -> Loaded
//! ```
//!
//! The machine is a pure transition function: events go in, effects come
//! out. Rendering and timers are the caller's job. Every armed timer carries a
//! generation, and a timeout whose generation is stale is ignored, so a source
//! change or a newer attempt can never be cut short by an old timer.

use std::fmt;
use std::time::Duration;

use crate::config::{Config, GatewayConfig, LoaderConfig};
use crate::media::{candidate_urls, classify, content_address_from_url, urlencoded};
use artforged_common::Scheme;

/// Where the element is in its loading cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMediaState {
    Init,
    /// Attempt 1: optimised URL, or the direct one when there is no optimiser
    LoadingOptimized,
    /// Unmodified first-gateway URL
    LoadingDirect,
    /// Alternate gateway `i` (0-based, excluding the first gateway)
    LoadingAltGateway(usize),
    /// Static placeholder asset
    LoadingFallback,
    /// Terminal: loaded, or given up after the hard timeout
    Loaded,
    /// Terminal: even the placeholder failed
    Failed,
}

impl ClientMediaState {
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            Self::LoadingOptimized
                | Self::LoadingDirect
                | Self::LoadingAltGateway(_)
                | Self::LoadingFallback
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

impl fmt::Display for ClientMediaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::LoadingOptimized => write!(f, "loading_optimized"),
            Self::LoadingDirect => write!(f, "loading_direct"),
            Self::LoadingAltGateway(i) => write!(f, "loading_alt_gateway({i})"),
            Self::LoadingFallback => write!(f, "loading_fallback"),
            Self::Loaded => write!(f, "loaded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent {
    /// The requested source changed (also the initial mount).
    SourceChanged(String),
    LoadOk,
    LoadError,
    Timeout { generation: u64 },
    Unmount,
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEffect {
    Render(String),
    ArmTimer { generation: u64, after: Duration },
    CancelTimer,
    Notify(LoaderOutcome),
}

/// Lifecycle notification surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderOutcome {
    /// `onLoaded`; `placeholder` is set when only the static asset loaded.
    Loaded { url: String, placeholder: bool },
    /// Hard timeout: treated as terminal, not as success.
    GaveUp,
    /// `onFailed`
    Failed,
}

/// URLs to try, in order, for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub optimized: Option<String>,
    pub direct: String,
    pub alternates: Vec<String>,
    pub content_addressed: bool,
    pub placeholder: String,
}

impl LoadPlan {
    /// Build the plan for a source. Stale gateway URLs are recognised and
    /// re-expanded against the configured gateways.
    pub fn build(gateways: &GatewayConfig, settings: &LoaderConfig, src: &str) -> Self {
        let src = src.trim();
        let reference = content_address_from_url(gateways, src)
            .or_else(|| classify(src).filter(|r| r.is_content_addressed()));

        let (direct, alternates, content_addressed) = match reference {
            Some(reference) => {
                let mut urls = candidate_urls(gateways, &reference).into_iter();
                match urls.next() {
                    Some(first) => (first, urls.collect(), true),
                    None => (src.to_string(), Vec::new(), false),
                }
            }
            None => (src.to_string(), Vec::new(), false),
        };

        let is_data = classify(src).is_some_and(|r| r.scheme == Scheme::Data);
        let optimized = settings
            .optimizer_template
            .as_deref()
            .filter(|_| !is_data && !direct.is_empty())
            .map(|template| {
                template
                    .replace("{url}", &urlencoded(&direct))
                    .replace("{width}", &settings.optimizer_width.to_string())
            });

        Self {
            optimized,
            direct,
            alternates,
            content_addressed,
            placeholder: settings.placeholder_url.clone(),
        }
    }

    /// URL of the first attempt.
    pub fn first(&self) -> &str {
        self.optimized.as_deref().unwrap_or(&self.direct)
    }
}

/// Pure progressive loader for one element.
#[derive(Debug, Clone)]
pub struct ProgressiveLoader {
    gateways: GatewayConfig,
    settings: LoaderConfig,
    state: ClientMediaState,
    plan: Option<LoadPlan>,
    current: Option<String>,
    generation: u64,
}

impl ProgressiveLoader {
    pub fn new(gateways: GatewayConfig, settings: LoaderConfig) -> Self {
        Self {
            gateways,
            settings,
            state: ClientMediaState::Init,
            plan: None,
            current: None,
            generation: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.gateways.clone(), config.loader.clone())
    }

    pub fn state(&self) -> ClientMediaState {
        self.state
    }

    /// URL currently rendered, if any.
    pub fn current_url(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn plan(&self) -> Option<&LoadPlan> {
        self.plan.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply one event and return the effects to perform, in order.
    pub fn handle(&mut self, event: LoaderEvent) -> Vec<LoaderEffect> {
        match event {
            LoaderEvent::SourceChanged(src) => {
                let plan = LoadPlan::build(&self.gateways, &self.settings, &src);
                let first = plan.first().to_string();
                self.plan = Some(plan);
                let mut effects = vec![LoaderEffect::CancelTimer];
                effects.extend(self.attempt(ClientMediaState::LoadingOptimized, first));
                effects
            }
            LoaderEvent::Unmount => {
                self.generation += 1;
                self.state = ClientMediaState::Init;
                self.plan = None;
                self.current = None;
                vec![LoaderEffect::CancelTimer]
            }
            LoaderEvent::LoadOk if self.state.is_loading() => {
                let placeholder = self.state == ClientMediaState::LoadingFallback;
                self.state = ClientMediaState::Loaded;
                vec![
                    LoaderEffect::CancelTimer,
                    LoaderEffect::Notify(LoaderOutcome::Loaded {
                        url: self.current.clone().unwrap_or_default(),
                        placeholder,
                    }),
                ]
            }
            LoaderEvent::LoadError if self.state.is_loading() => self.advance(),
            LoaderEvent::Timeout { generation }
                if generation == self.generation && self.state.is_loading() =>
            {
                self.state = ClientMediaState::Loaded;
                vec![LoaderEffect::Notify(LoaderOutcome::GaveUp)]
            }
            // Stale timers and events outside a load are ignored
            _ => Vec::new(),
        }
    }

    /// Move to the next URL after a load error.
    fn advance(&mut self) -> Vec<LoaderEffect> {
        let Some(plan) = &self.plan else {
            return Vec::new();
        };

        let next = match self.state {
            ClientMediaState::LoadingOptimized
                if plan.content_addressed && plan.optimized.is_some() =>
            {
                Some((ClientMediaState::LoadingDirect, plan.direct.clone()))
            }
            ClientMediaState::LoadingOptimized | ClientMediaState::LoadingDirect
                if plan.content_addressed =>
            {
                plan.alternates
                    .first()
                    .map(|url| (ClientMediaState::LoadingAltGateway(0), url.clone()))
            }
            ClientMediaState::LoadingAltGateway(i) => plan
                .alternates
                .get(i + 1)
                .map(|url| (ClientMediaState::LoadingAltGateway(i + 1), url.clone())),
            ClientMediaState::LoadingFallback => {
                self.state = ClientMediaState::Failed;
                self.current = None;
                return vec![
                    LoaderEffect::CancelTimer,
                    LoaderEffect::Notify(LoaderOutcome::Failed),
                ];
            }
            _ => None,
        };

        let (state, url) =
            next.unwrap_or_else(|| (ClientMediaState::LoadingFallback, plan.placeholder.clone()));
        let mut effects = vec![LoaderEffect::CancelTimer];
        effects.extend(self.attempt(state, url));
        effects
    }

    /// Enter a loading state: render its URL under a fresh timer.
    fn attempt(&mut self, state: ClientMediaState, url: String) -> Vec<LoaderEffect> {
        self.generation += 1;
        self.state = state;
        self.current = Some(url.clone());
        vec![
            LoaderEffect::Render(url),
            LoaderEffect::ArmTimer {
                generation: self.generation,
                after: self.settings.timeout(),
            },
        ]
    }
}
