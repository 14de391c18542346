//! Typed entry points for the built-in flows.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::catalog::dealers::{DealerList, DealerRequest};
use crate::catalog::diagnose::{GardenDiagnosis, GardenPhoto};
use crate::catalog::layout::{GardenLayout, LayoutRequest};
use crate::catalog::parse_query::{ParsedQuery, QueryRequest};
use crate::catalog::rationale::{CropRationale, RationaleRequest};
use crate::catalog::recipe::{Recipe, RecipeRequest};
use crate::catalog::recommend::{CropRecommendations, CropRequest};
use crate::catalog::training::{TrainingGuide, TrainingRequest};
use crate::catalog::{
    dealers, diagnose, layout, parse_query, rationale, recipe, recommend, training,
};
use crate::engine::Engine;
use crate::error::Result;

/// Garden planning facade over an [`Engine`].
///
/// Serializes typed requests, runs the matching built-in flow and
/// deserializes the validated result. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Planner {
    engine: Arc<Engine>,
}

impl Planner {
    /// Creates a planner running flows on `engine`.
    pub fn new(engine: impl Into<Arc<Engine>>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    async fn call<I, O>(&self, flow: &str, request: &I) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let input = serde_json::to_value(request)?;
        let result = self.engine.run(flow, input).await?;
        Ok(serde_json::from_value(result.value)?)
    }

    /// Recommends crops, each with a photo or placeholder.
    pub async fn recommend_crops(&self, request: &CropRequest) -> Result<CropRecommendations> {
        self.call(recommend::NAME, request).await
    }

    /// Diagnoses a garden photo.
    pub async fn diagnose_garden(&self, photo: &GardenPhoto) -> Result<GardenDiagnosis> {
        self.call(diagnose::NAME, photo).await
    }

    /// Arranges crops on a planting grid.
    pub async fn plan_layout(&self, request: &LayoutRequest) -> Result<GardenLayout> {
        self.call(layout::NAME, request).await
    }

    /// Lists agricultural dealers near a region.
    pub async fn find_dealers(&self, request: &DealerRequest) -> Result<DealerList> {
        self.call(dealers::NAME, request).await
    }

    /// Writes a printable training guide.
    pub async fn training_guide(&self, request: &TrainingRequest) -> Result<TrainingGuide> {
        self.call(training::NAME, request).await
    }

    /// Writes a local recipe for a crop.
    pub async fn recipe(&self, request: &RecipeRequest) -> Result<Recipe> {
        self.call(recipe::NAME, request).await
    }

    /// Extracts planner fields from a free-text query.
    pub async fn parse_query(&self, query: impl Into<String>) -> Result<ParsedQuery> {
        let request = QueryRequest {
            query: query.into(),
        };
        self.call(parse_query::NAME, &request).await
    }

    /// Explains why each crop was chosen.
    pub async fn explain(&self, request: &RationaleRequest) -> Result<CropRationale> {
        self.call(rationale::NAME, request).await
    }
}

#[cfg(test)]
mod tests {
    use mavuno_core::mock::MockClient;
    use serde_json::json;

    use super::*;
    use crate::FlowError;
    use crate::catalog::{DietaryNeed, GardenVariant, PlantingMonth, WaterAvailability};

    fn planner(client: &MockClient) -> Planner {
        let engine = Engine::with_defaults(client.clone().into_shared()).unwrap();
        Planner::new(engine)
    }

    #[tokio::test]
    async fn recommends_typed_crops() {
        let client = MockClient::new()
            .with_structured(json!({
                "overallRationale": "Leafy greens and roots for iron.",
                "crops": [
                    { "name": "Kale", "rationale": "Iron", "imageKeywords": "kale plant",
                      "plantingInfo": { "spacing": "30cm", "maturity": "60 days", "intercropping": "onions" } },
                    { "name": "Beans", "rationale": "Protein", "imageKeywords": "bean plant",
                      "plantingInfo": { "spacing": "15cm", "maturity": "70 days", "intercropping": "maize" } },
                    { "name": "Amaranth", "rationale": "Iron", "imageKeywords": "amaranth leaves",
                      "plantingInfo": { "spacing": "20cm", "maturity": "40 days", "intercropping": "none" } }
                ]
            }))
            .with_image("kale plant", "data:image/png;base64,a2FsZQ==");

        let request = CropRequest {
            variant: GardenVariant::Family,
            land_size: "20 sqm".into(),
            region: "Nakuru".into(),
            family_size: 5,
            dietary_needs: DietaryNeed::IronRich,
            water_availability: WaterAvailability::Rainfed,
        };
        let recommendations = planner(&client).recommend_crops(&request).await.unwrap();

        assert_eq!(recommendations.crops.len(), 3);
        assert_eq!(
            recommendations.crops[0].image_data_uri,
            "data:image/png;base64,a2FsZQ=="
        );
        assert!(recommendations.seed_quantities.is_none());
        assert_eq!(client.image_calls().len(), 3);
    }

    #[tokio::test]
    async fn parses_partial_query() {
        let client = MockClient::new().with_structured(json!({
            "region": "Nakuru",
            "plantingMonth": "March",
            "familySize": null,
            "waterAvailability": "sack/bag garden"
        }));

        let parsed = planner(&client)
            .parse_query("Planting in bags in Nakuru this March")
            .await
            .unwrap();
        assert_eq!(parsed.region.as_deref(), Some("Nakuru"));
        assert_eq!(parsed.planting_month, Some(PlantingMonth::March));
        assert_eq!(parsed.water_availability, Some(WaterAvailability::SackGarden));
        assert_eq!(parsed.family_size, None);
        assert_eq!(parsed.dietary_needs, None);
    }

    #[tokio::test]
    async fn recipe_gets_audio_text() {
        let client = MockClient::new().with_structured(json!({
            "title": "Moringa porridge",
            "description": "A warm porridge",
            "ingredients": ["flour", "moringa"],
            "instructions": ["Boil", "Stir"]
        }));
        let request = RecipeRequest {
            crop_name: "Moringa".into(),
            context: "for toddlers".into(),
        };

        let recipe = planner(&client).recipe(&request).await.unwrap();
        assert!(recipe.full_text_for_audio.starts_with("Recipe: Moringa porridge."));
        assert!(recipe.full_text_for_audio.ends_with("1. Boil 2. Stir"));
    }

    #[tokio::test]
    async fn training_guide_reports_empty_title() {
        let client = MockClient::new().with_structured(json!({
            "title": "  ",
            "introduction": "",
            "sections": [],
            "conclusion": ""
        }));
        let request = TrainingRequest {
            crops: vec!["Kale".into()],
            variant: GardenVariant::Family,
            dietary_needs: "general".into(),
        };

        let err = planner(&client).training_guide(&request).await.unwrap_err();
        assert!(matches!(err, FlowError::EmptyResult { .. }));
        assert_eq!(err.to_string(), training::EMPTY_MESSAGE);
    }
}
