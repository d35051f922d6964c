use std::future::Future;

use stroll_core::{GroundingChunk, LatLng, OutputContract, TourError};

/// Everything one outbound generation call needs.
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub api_key: String,
    pub prompt: String,
    pub contract: OutputContract,
    pub lat_lng: Option<LatLng>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub grounding_chunks: Vec<GroundingChunk>,
}

pub trait GenerativeModel: Send + Sync {
    /// Performs exactly one call. Failures of the call itself are
    /// `TourError::Upstream`.
    fn generate(
        &self,
        call: ModelCall,
    ) -> impl Future<Output = Result<ModelReply, TourError>> + Send;
}
