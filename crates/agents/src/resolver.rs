use std::sync::Arc;
use std::time::Instant;

use futures::future::{AbortRegistration, Abortable};
use stroll_core::{
    build_prompt, route_url, GroundedItinerary, Itinerary, OutputContract, PromptPlan,
    ResponseMode, StructuredItinerary, TourError, TourRequest, TourRequestInput,
};
use stroll_observability::AppMetrics;
use tracing::{info, instrument, warn};

use crate::enrich::attach_map_images;
use crate::model::{GenerativeModel, ModelCall, ModelReply};

pub const GROUNDED_FALLBACK_TEXT: &str =
    "I couldn't put together a walking tour for that request. Try a nearby neighbourhood or a different theme.";

const PLACEHOLDER_KEYS: &[&str] = &[
    "PLACEHOLDER_API_KEY",
    "YOUR_API_KEY",
    "YOUR_GEMINI_API_KEY",
    "YOUR_MAPS_API_KEY",
    "CHANGE_ME",
];

/// Credentials and response shaping, injected at construction.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub api_key: Option<String>,
    pub maps_api_key: Option<String>,
    pub mode: ResponseMode,
}

/// `None` for missing, blank or placeholder keys.
pub fn usable_key(key: Option<&str>) -> Option<&str> {
    let key = key?.trim();
    if key.is_empty()
        || PLACEHOLDER_KEYS
            .iter()
            .any(|placeholder| key.eq_ignore_ascii_case(placeholder))
    {
        None
    } else {
        Some(key)
    }
}

pub struct TourResolver<M> {
    model: M,
    config: ResolverConfig,
    metrics: Arc<AppMetrics>,
}

impl<M> TourResolver<M>
where
    M: GenerativeModel,
{
    pub fn new(model: M, config: ResolverConfig, metrics: Arc<AppMetrics>) -> Self {
        Self {
            model,
            config,
            metrics,
        }
    }

    pub fn mode(&self) -> ResponseMode {
        self.config.mode
    }

    pub fn model_configured(&self) -> bool {
        usable_key(self.config.api_key.as_deref()).is_some()
    }

    pub fn map_images_enabled(&self) -> bool {
        usable_key(self.config.maps_api_key.as_deref()).is_some()
    }

    /// Validates raw caller input, then resolves it.
    pub async fn resolve_input(&self, input: TourRequestInput) -> Result<Itinerary, TourError> {
        let request = TourRequest::try_from(input)?;
        self.resolve(&request).await
    }

    #[instrument(
        skip(self, request),
        fields(
            category = request.category.slug(),
            duration = request.duration,
            mode = self.config.mode.as_str()
        )
    )]
    pub async fn resolve(&self, request: &TourRequest) -> Result<Itinerary, TourError> {
        let started = Instant::now();
        self.metrics.inc_tour_requested();

        let result = self.resolve_inner(request).await;

        self.metrics.observe_latency(started.elapsed());
        match &result {
            Ok(itinerary) => {
                self.metrics.inc_tour_succeeded();
                info!(
                    mode = itinerary.mode().as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tour resolved"
                );
            }
            Err(error) => {
                match error {
                    TourError::Upstream { .. } => self.metrics.inc_upstream_failure(),
                    TourError::Parse { .. } => self.metrics.inc_parse_failure(),
                    _ => {}
                }
                warn!(kind = error.kind(), error = %error, "tour resolution failed");
            }
        }

        result
    }

    /// Like [`resolve`](Self::resolve), but stops early with
    /// `TourError::Cancelled` once the paired `AbortHandle` is aborted.
    pub async fn resolve_abortable(
        &self,
        request: &TourRequest,
        registration: AbortRegistration,
    ) -> Result<Itinerary, TourError> {
        Abortable::new(self.resolve(request), registration)
            .await
            .unwrap_or(Err(TourError::Cancelled))
    }

    async fn resolve_inner(&self, request: &TourRequest) -> Result<Itinerary, TourError> {
        let api_key = usable_key(self.config.api_key.as_deref())
            .ok_or_else(|| TourError::configuration("model API key is missing or a placeholder"))?
            .to_string();

        let PromptPlan {
            prompt,
            contract,
            lat_lng,
        } = build_prompt(request, self.config.mode);

        let reply = self
            .model
            .generate(ModelCall {
                api_key,
                prompt,
                contract: contract.clone(),
                lat_lng,
            })
            .await?;

        match contract {
            OutputContract::Grounded => Ok(Itinerary::Grounded(grounded_itinerary(reply))),
            OutputContract::Structured { .. } => {
                let mut itinerary = parse_structured(&reply.text)?;
                if let Some(maps_key) = usable_key(self.config.maps_api_key.as_deref()) {
                    let attached = attach_map_images(&mut itinerary, maps_key);
                    self.metrics.add_map_images(attached);
                }
                Ok(Itinerary::Structured(itinerary))
            }
        }
    }
}

fn grounded_itinerary(reply: ModelReply) -> GroundedItinerary {
    let text = if reply.text.trim().is_empty() {
        GROUNDED_FALLBACK_TEXT.to_string()
    } else {
        reply.text
    };
    let mut itinerary = GroundedItinerary {
        text,
        grounding_chunks: reply.grounding_chunks,
        route_url: None,
    };
    itinerary.route_url = route_url(itinerary.place_titles());
    itinerary
}

/// Missing or null stops/directions default to empty; a body that is not a JSON
/// object is a parse failure.
pub fn parse_structured(raw: &str) -> Result<StructuredItinerary, TourError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|error| TourError::parse(error.to_string()))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
