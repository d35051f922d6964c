use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TourError;

pub const DURATION_PRESETS_MINUTES: [u32; 5] = [30, 60, 90, 120, 180];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourCategory {
    History,
    Food,
    Art,
    Architecture,
    Nature,
    HiddenGems,
}

impl TourCategory {
    pub const ALL: [TourCategory; 6] = [
        Self::History,
        Self::Food,
        Self::Art,
        Self::Architecture,
        Self::Nature,
        Self::HiddenGems,
    ];

    /// Accepts the slug (`hidden_gems`) or the display label (`Hidden Gems`),
    /// ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value
            .trim()
            .to_lowercase()
            .replace(&['-', ' '][..], "_");
        match normalized.as_str() {
            "history" | "historical" => Some(Self::History),
            "food" | "foodie" => Some(Self::Food),
            "art" | "art_and_culture" | "art_&_culture" => Some(Self::Art),
            "architecture" => Some(Self::Architecture),
            "nature" | "parks" => Some(Self::Nature),
            "hidden_gems" => Some(Self::HiddenGems),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Food => "food",
            Self::Art => "art",
            Self::Architecture => "architecture",
            Self::Nature => "nature",
            Self::HiddenGems => "hidden_gems",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::History => "History",
            Self::Food => "Food",
            Self::Art => "Art",
            Self::Architecture => "Architecture",
            Self::Nature => "Nature",
            Self::HiddenGems => "Hidden Gems",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn as_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Request body as it arrives from a caller, before any validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRequestInput {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default, alias = "lat_lng")]
    pub lat_lng: Option<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRequest {
    pub category: TourCategory,
    pub location: String,
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_lng: Option<LatLng>,
}

impl TourRequest {
    pub fn new(
        category: TourCategory,
        location: impl Into<String>,
        duration: u32,
        lat_lng: Option<LatLng>,
    ) -> Result<Self, TourError> {
        let location = location.into().trim().to_string();
        if location.is_empty() {
            return Err(TourError::validation("location must not be empty"));
        }
        if !DURATION_PRESETS_MINUTES.contains(&duration) {
            return Err(TourError::validation(format!(
                "duration {duration} is not one of {DURATION_PRESETS_MINUTES:?} minutes"
            )));
        }
        if let Some(coords) = lat_lng {
            if !coords.is_valid() {
                return Err(TourError::validation(format!(
                    "coordinates ({}, {}) are out of range",
                    coords.latitude, coords.longitude
                )));
            }
        }

        Ok(Self {
            category,
            location,
            duration,
            lat_lng,
        })
    }
}

impl TryFrom<TourRequestInput> for TourRequest {
    type Error = TourError;

    fn try_from(input: TourRequestInput) -> Result<Self, Self::Error> {
        let category = TourCategory::parse(&input.category).ok_or_else(|| {
            TourError::validation(format!("unsupported category '{}'", input.category))
        })?;
        let duration = u32::try_from(input.duration)
            .map_err(|_| TourError::validation("duration must be a positive number of minutes"))?;
        Self::new(category, input.location, duration, input.lat_lng)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time_to_spend: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Stop {
    pub fn coordinates(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Direction {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub from_lat_lng: Option<LatLng>,
    #[serde(default)]
    pub to_lat_lng: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredItinerary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tour_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_distance: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stops: Vec<Stop>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub directions: Vec<Direction>,
}

/// Model output sometimes carries `null` where a value is absent.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A place reference attached to a grounded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub title: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundedItinerary {
    pub text: String,
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_url: Option<String>,
}

impl GroundedItinerary {
    pub fn place_titles(&self) -> Vec<&str> {
        self.grounding_chunks
            .iter()
            .map(|chunk| chunk.title.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Itinerary {
    Structured(StructuredItinerary),
    Grounded(GroundedItinerary),
}

impl Itinerary {
    pub fn mode(&self) -> ResponseMode {
        match self {
            Self::Structured(_) => ResponseMode::Structured,
            Self::Grounded(_) => ResponseMode::Grounded,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Grounded,
    #[default]
    Structured,
}

impl ResponseMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "grounded" | "maps" | "text" => Some(Self::Grounded),
            "structured" | "json" | "schema" => Some(Self::Structured),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grounded => "grounded",
            Self::Structured => "structured",
        }
    }
}
