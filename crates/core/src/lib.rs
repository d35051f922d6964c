pub mod error;
pub mod models;
pub mod prompt;
pub mod route;
pub mod schema;
pub mod static_map;
pub mod wizard;

pub use error::{TourError, GENERIC_FAILURE_MESSAGE};
pub use models::*;
pub use prompt::{build_prompt, specialty_guidance, OutputContract, PromptPlan};
pub use route::{route_url, unique_places};
pub use wizard::{TourWizard, WizardStep};
