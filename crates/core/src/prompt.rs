use serde_json::Value;

use crate::models::{LatLng, ResponseMode, TourCategory, TourRequest};
use crate::schema::itinerary_schema;

const FOOD_GUIDANCE: &str = "Food focus: only choose places that are consistently well reviewed \
(roughly 4.5 stars or better). Prefer independent, locally loved spots with a dish or \
specialty they are known for; skip chains, tourist traps and generic cafes.";

/// How the model is asked to shape its answer.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputContract {
    /// Markdown prose plus grounded place references.
    Grounded,
    /// A JSON object matching `schema`.
    Structured { schema: Value },
}

impl OutputContract {
    pub fn mode(&self) -> ResponseMode {
        match self {
            Self::Grounded => ResponseMode::Grounded,
            Self::Structured { .. } => ResponseMode::Structured,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPlan {
    pub prompt: String,
    pub contract: OutputContract,
    pub lat_lng: Option<LatLng>,
}

pub fn specialty_guidance(category: TourCategory) -> Option<&'static str> {
    match category {
        TourCategory::Food => Some(FOOD_GUIDANCE),
        _ => None,
    }
}

pub fn build_prompt(request: &TourRequest, mode: ResponseMode) -> PromptPlan {
    let mut sections = vec![base_instructions(request)];

    if let Some(guidance) = specialty_guidance(request.category) {
        sections.push(guidance.to_string());
    }

    let contract = match mode {
        ResponseMode::Grounded => {
            sections.push(grounded_instructions().to_string());
            OutputContract::Grounded
        }
        ResponseMode::Structured => {
            sections.push(structured_instructions().to_string());
            OutputContract::Structured {
                schema: itinerary_schema(),
            }
        }
    };

    PromptPlan {
        prompt: sections.join("\n\n"),
        contract,
        lat_lng: request.lat_lng,
    }
}

fn base_instructions(request: &TourRequest) -> String {
    let start = match request.lat_lng {
        Some(coords) => format!(
            "{} (the walker is currently near {:.5}, {:.5})",
            request.location, coords.latitude, coords.longitude
        ),
        None => request.location.clone(),
    };

    format!(
        "You are a local walking-tour guide. Plan a {category} walking tour starting from {start}. \
The whole tour, including walking between stops, must fit in {duration} minutes.\n\
Pick 3 to 5 stops that can be visited in sequence on foot, each a short walk from the previous one. \
For every stop say why it fits the {category} theme and how long to spend there.",
        category = request.category.label(),
        start = start,
        duration = request.duration,
    )
}

fn grounded_instructions() -> &'static str {
    "Format the answer as Markdown: a title, a one-paragraph overview, then a numbered list of \
stops with walking directions between them. Use Google Maps to ground the places you recommend. \
Only the main tour stops should be cited as places; do not cite the starting location or \
anything mentioned in passing."
}

fn structured_instructions() -> &'static str {
    "Return a single JSON object with the tour name, a short summary, the total walking distance, \
the ordered stops with their latitude and longitude, and the ordered directions between \
consecutive stops with the coordinates of both ends. Do not include any other text."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(category: TourCategory) -> TourRequest {
        TourRequest::new(category, "Alfama, Lisbon", 120, None).unwrap()
    }

    #[test]
    fn prompt_mentions_category_location_and_duration_verbatim() {
        for category in TourCategory::ALL {
            for mode in [ResponseMode::Grounded, ResponseMode::Structured] {
                let plan = build_prompt(&request(category), mode);
                assert!(plan.prompt.contains(category.label()));
                assert!(plan.prompt.contains("Alfama, Lisbon"));
                assert!(plan.prompt.contains("120"));
            }
        }
    }

    #[test]
    fn specialty_guidance_only_for_food() {
        for category in TourCategory::ALL {
            let plan = build_prompt(&request(category), ResponseMode::Structured);
            assert_eq!(
                plan.prompt.contains(FOOD_GUIDANCE),
                category == TourCategory::Food,
                "{category:?}"
            );
        }
    }

    #[test]
    fn structured_mode_carries_schema() {
        let plan = build_prompt(&request(TourCategory::Art), ResponseMode::Structured);
        match plan.contract {
            OutputContract::Structured { schema } => {
                assert_eq!(schema["type"], "OBJECT");
            }
            other => panic!("unexpected contract {other:?}"),
        }
    }

    #[test]
    fn grounded_mode_excludes_start_location_from_citations() {
        let plan = build_prompt(&request(TourCategory::Nature), ResponseMode::Grounded);
        assert_eq!(plan.contract, OutputContract::Grounded);
        assert!(plan.prompt.contains("do not cite the starting location"));
    }

    #[test]
    fn coordinate_bias_is_forwarded() {
        let coords = LatLng::new(38.7118, -9.1300);
        let request =
            TourRequest::new(TourCategory::History, "Lisbon", 60, Some(coords)).unwrap();
        let plan = build_prompt(&request, ResponseMode::Grounded);
        assert_eq!(plan.lat_lng, Some(coords));
        assert!(plan.prompt.contains("38.71180"));
    }

    #[test]
    fn building_is_deterministic() {
        let first = build_prompt(&request(TourCategory::Food), ResponseMode::Structured);
        let second = build_prompt(&request(TourCategory::Food), ResponseMode::Structured);
        assert_eq!(first, second);
    }
}
