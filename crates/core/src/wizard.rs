use serde::Serialize;

use crate::error::TourError;
use crate::models::{Itinerary, LatLng, TourCategory, TourRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Category,
    Location,
    Duration,
    Loading,
    Itinerary,
}

/// One user's pass through category -> location -> duration -> itinerary.
/// Lives only in the caller's memory.
#[derive(Debug, Clone, Serialize)]
pub struct TourWizard {
    step: WizardStep,
    category: Option<TourCategory>,
    location: Option<String>,
    lat_lng: Option<LatLng>,
    duration: Option<u32>,
    error: Option<String>,
    itinerary: Option<Itinerary>,
}

impl Default for TourWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl TourWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Category,
            category: None,
            location: None,
            lat_lng: None,
            duration: None,
            error: None,
            itinerary: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn category(&self) -> Option<TourCategory> {
        self.category
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.itinerary.as_ref()
    }

    pub fn select_category(&mut self, category: TourCategory) {
        self.category = Some(category);
        self.error = None;
        self.step = WizardStep::Location;
    }

    pub fn set_location(
        &mut self,
        location: &str,
        lat_lng: Option<LatLng>,
    ) -> Result<(), TourError> {
        if self.category.is_none() {
            return Err(TourError::validation("choose a category first"));
        }
        let location = location.trim();
        if location.is_empty() {
            return Err(TourError::validation("location must not be empty"));
        }

        self.location = Some(location.to_string());
        self.lat_lng = lat_lng;
        self.error = None;
        self.step = WizardStep::Duration;
        Ok(())
    }

    /// Moves to `Loading` and hands back the request to resolve. Refused while
    /// a request is already in flight.
    pub fn choose_duration(&mut self, duration: u32) -> Result<TourRequest, TourError> {
        if self.step == WizardStep::Loading {
            return Err(TourError::validation("a tour is already being generated"));
        }
        let (Some(category), Some(location)) = (self.category, self.location.clone()) else {
            return Err(TourError::validation("category and location are required"));
        };

        let request = TourRequest::new(category, location, duration, self.lat_lng)?;
        self.duration = Some(duration);
        self.error = None;
        self.step = WizardStep::Loading;
        Ok(request)
    }

    /// On failure, returns to the duration step keeping category and location.
    pub fn complete(&mut self, result: Result<Itinerary, TourError>) {
        match result {
            Ok(itinerary) => {
                self.itinerary = Some(itinerary);
                self.error = None;
                self.step = WizardStep::Itinerary;
            }
            Err(error) => {
                self.itinerary = None;
                self.error = Some(error.user_message().to_string());
                self.step = WizardStep::Duration;
            }
        }
    }

    pub fn start_over(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructuredItinerary;

    fn wizard_at_duration() -> TourWizard {
        let mut wizard = TourWizard::new();
        wizard.select_category(TourCategory::Food);
        wizard.set_location("Porto", None).unwrap();
        wizard
    }

    #[test]
    fn walks_through_the_happy_path() {
        let mut wizard = wizard_at_duration();
        assert_eq!(wizard.step(), WizardStep::Duration);

        let request = wizard.choose_duration(60).unwrap();
        assert_eq!(request.location, "Porto");
        assert_eq!(wizard.step(), WizardStep::Loading);

        wizard.complete(Ok(Itinerary::Structured(StructuredItinerary::default())));
        assert_eq!(wizard.step(), WizardStep::Itinerary);
        assert!(wizard.itinerary().is_some());
    }

    #[test]
    fn failure_returns_to_duration_and_keeps_selections() {
        let mut wizard = wizard_at_duration();
        wizard.choose_duration(90).unwrap();
        wizard.complete(Err(TourError::upstream("503")));

        assert_eq!(wizard.step(), WizardStep::Duration);
        assert_eq!(wizard.category(), Some(TourCategory::Food));
        assert_eq!(wizard.location(), Some("Porto"));
        assert_eq!(
            wizard.error(),
            Some(crate::error::GENERIC_FAILURE_MESSAGE)
        );

        assert!(wizard.choose_duration(90).is_ok());
    }

    #[test]
    fn duration_is_locked_while_loading() {
        let mut wizard = wizard_at_duration();
        wizard.choose_duration(30).unwrap();
        assert!(wizard.choose_duration(60).is_err());
    }

    #[test]
    fn start_over_discards_everything() {
        let mut wizard = wizard_at_duration();
        wizard.start_over();
        assert_eq!(wizard.step(), WizardStep::Category);
        assert!(wizard.location().is_none());
    }
}
