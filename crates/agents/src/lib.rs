mod enrich;
mod gemini;
mod model;
mod resolver;

pub use enrich::attach_map_images;
pub use futures::future::{AbortHandle, AbortRegistration};
pub use gemini::{GeminiClient, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use model::{GenerativeModel, ModelCall, ModelReply};
pub use resolver::{
    parse_structured, usable_key, ResolverConfig, TourResolver, GROUNDED_FALLBACK_TEXT,
};
