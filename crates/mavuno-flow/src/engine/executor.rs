//! Flow execution engine.

use std::sync::Arc;

use mavuno_core::client::SharedClient;
use mavuno_core::schema::validate;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;

use super::{EngineConfig, ExecutionReport};
use crate::assemble::assemble;
use crate::definition::FlowDefinition;
use crate::enrich::{BaseEntity, EnrichmentOrchestrator};
use crate::error::{FlowError, Result};
use crate::registry::FlowRegistry;
use crate::{FlowState, TRACING_TARGET_ENGINE};

/// Validated output of a successful invocation.
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    /// The result, guaranteed to satisfy the flow's output schema.
    pub value: Value,
    /// What happened during the run.
    pub report: ExecutionReport,
}

/// The flow execution engine.
///
/// Owns the flow registry and the generative client and bounds the number
/// of concurrent invocations. Each invocation makes exactly one primary
/// generation call, then an optional per-entity fan-out.
pub struct Engine {
    config: EngineConfig,
    registry: Arc<FlowRegistry>,
    client: SharedClient,
    semaphore: Arc<Semaphore>,
    orchestrator: EnrichmentOrchestrator,
}

impl Engine {
    /// Creates a new engine.
    pub fn new(config: EngineConfig, registry: FlowRegistry, client: SharedClient) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_runs.max(1)));
        let orchestrator = EnrichmentOrchestrator::new(config.max_concurrent_enrichments);

        tracing::info!(
            target: TRACING_TARGET_ENGINE,
            client = client.client_name(),
            flows = registry.len(),
            max_concurrent_runs = config.max_concurrent_runs,
            max_concurrent_enrichments = config.max_concurrent_enrichments,
            "flow engine initialized"
        );

        Self {
            config,
            registry: Arc::new(registry),
            client,
            semaphore,
            orchestrator,
        }
    }

    /// Creates an engine with default configuration and the built-in flows.
    pub fn with_defaults(client: SharedClient) -> Result<Self> {
        Ok(Self::new(
            EngineConfig::default(),
            FlowRegistry::with_defaults()?,
            client,
        ))
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the flow registry.
    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    /// Runs the flow registered as `name` on `input`.
    pub async fn run(&self, name: &str, input: Value) -> Result<FlowResult> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| FlowError::Internal(format!("semaphore closed: {e}")))?;

        let flow = self.registry.lookup(name)?;
        let mut report = ExecutionReport::new(flow.name());

        tracing::debug!(
            target: TRACING_TARGET_ENGINE,
            run_id = %report.run_id(),
            flow = flow.name(),
            "starting flow invocation"
        );

        match self.execute(&flow, input, &mut report).await {
            Ok(value) => {
                report.transition(FlowState::Completed);
                tracing::debug!(
                    target: TRACING_TARGET_ENGINE,
                    run_id = %report.run_id(),
                    flow = flow.name(),
                    fallbacks = report.fallback_keys().len(),
                    "flow invocation completed"
                );
                Ok(FlowResult { value, report })
            }
            Err(error) => {
                report.transition(FlowState::Failed);
                tracing::warn!(
                    target: TRACING_TARGET_ENGINE,
                    run_id = %report.run_id(),
                    flow = flow.name(),
                    error = %error,
                    "flow invocation failed"
                );
                Err(error)
            }
        }
    }

    async fn execute(
        &self,
        flow: &FlowDefinition,
        input: Value,
        report: &mut ExecutionReport,
    ) -> Result<Value> {
        let name = flow.name();

        validate(&input, flow.input_schema()).map_err(|violations| {
            FlowError::RequestValidation {
                flow: name.to_string(),
                violations,
            }
        })?;

        report.transition(FlowState::Rendering);
        let mut request = input;
        flow.prepare(&mut request);
        let prompt = flow.render_prompt(&request).map_err(|violations| {
            FlowError::RequestValidation {
                flow: name.to_string(),
                violations,
            }
        })?;

        report.transition(FlowState::Requesting);
        let generation_schema = flow.generation_schema_for(&request);
        let base = self
            .client
            .generate_structured(&prompt, &generation_schema)
            .await
            .map_err(|source| {
                tracing::error!(
                    target: TRACING_TARGET_ENGINE,
                    flow = name,
                    client = self.client.client_name(),
                    kind = source.kind_str(),
                    error = %source,
                    "primary generation failed"
                );
                FlowError::GenerationTransport {
                    flow: name.to_string(),
                    source,
                }
            })?;

        report.transition(FlowState::Validating);
        if let Some(guard) = flow.guard()
            && !guard.passes(&base)
        {
            return Err(FlowError::EmptyResult {
                flow: name.to_string(),
                field: guard.field().to_string(),
                message: guard.message().to_string(),
            });
        }
        validate(&base, &generation_schema).map_err(|violations| FlowError::OutputValidation {
            flow: name.to_string(),
            violations,
        })?;

        let mut output = match flow.enrichment() {
            Some(step) => {
                report.transition(FlowState::Enriching);
                let entities = BaseEntity::collect(&base, step);
                let enriched = self
                    .orchestrator
                    .enrich(
                        entities,
                        |entity| {
                            let client = self.client.clone();
                            let prompt = step.prompt().render(&entity.fields);
                            async move {
                                client
                                    .generate_image(&prompt)
                                    .await
                                    .map(|asset| Value::String(asset.into_uri()))
                            }
                        },
                        |entity| Value::String(step.fallback(&entity.key)),
                    )
                    .await;
                report.record_enrichments(&enriched);

                report.transition(FlowState::Assembling);
                assemble(&base, step, enriched).map_err(|source| FlowError::Assembly {
                    flow: name.to_string(),
                    source,
                })?
            }
            None => {
                report.transition(FlowState::Assembling);
                base
            }
        };

        flow.strip_inactive_variants(&request, &mut output);
        flow.post_process(&request, &mut output);

        validate(&output, &flow.output_schema_for(&request)).map_err(|violations| {
            FlowError::OutputValidation {
                flow: name.to_string(),
                violations,
            }
        })?;

        Ok(output)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("client", &self.client.client_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mavuno_core::mock::MockClient;
    use serde_json::json;

    use super::*;
    use crate::catalog::{layout, recommend};

    fn engine(client: &MockClient) -> Engine {
        Engine::with_defaults(client.clone().into_shared()).unwrap()
    }

    fn request(variant: &str) -> Value {
        json!({
            "variant": variant,
            "landSize": "20 sqm",
            "region": "Nakuru",
            "familySize": 5,
            "dietaryNeeds": "iron_rich",
            "waterAvailability": "rainfed"
        })
    }

    fn crop(name: &str, keywords: &str) -> Value {
        json!({
            "name": name,
            "rationale": format!("{name} is rich in iron."),
            "imageKeywords": keywords,
            "plantingInfo": { "spacing": "30cm", "maturity": "60 days", "intercropping": "onions" }
        })
    }

    fn base() -> Value {
        json!({
            "overallRationale": "Greens and legumes for iron.",
            "crops": [
                crop("Kale", "kale plant"),
                crop("Beans", "bean plant"),
                crop("Amaranth", "amaranth leaves")
            ]
        })
    }

    fn community_base() -> Value {
        let mut base = base();
        let fields = json!({
            "areaRequired": "200 sqm",
            "seedQuantities": [
                { "cropName": "Kale", "quantity": "50g" },
                { "cropName": "Beans", "quantity": "2kg" },
                { "cropName": "Amaranth", "quantity": "30g" }
            ],
            "plantingSchedule": "Kale in week 1, beans in week 2",
            "estimatedWeeklyYield": "40kg"
        });
        if let (Some(map), Value::Object(extra)) = (base.as_object_mut(), fields) {
            map.extend(extra);
        }
        base
    }

    #[tokio::test]
    async fn family_recommendations_get_images() {
        let client = MockClient::new()
            .with_structured(base())
            .with_image("kale plant", "data:image/png;base64,a2FsZQ==");

        let result = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap();

        let crops = result.value["crops"].as_array().unwrap();
        assert_eq!(crops.len(), 3);
        assert_eq!(crops[0]["imageDataUri"], "data:image/png;base64,a2FsZQ==");
        for crop in crops {
            assert!(crop["imageDataUri"].as_str().is_some_and(|uri| !uri.is_empty()));
            assert!(crop.get("imageKeywords").is_none());
        }
        assert!(result.value.get("seedQuantities").is_none());
        assert!(result.value.get("areaRequired").is_none());

        assert_eq!(
            result.report.states(),
            [
                FlowState::Pending,
                FlowState::Rendering,
                FlowState::Requesting,
                FlowState::Validating,
                FlowState::Enriching,
                FlowState::Assembling,
                FlowState::Completed,
            ]
        );
        assert!(result.report.fallback_keys().is_empty());
        assert!(result.report.finished_at().is_some());

        let prompts = client.structured_calls();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].text.contains("Region: Nakuru"));
        assert_eq!(client.image_calls().len(), 3);
    }

    #[tokio::test]
    async fn failed_image_gets_placeholder() {
        let client = MockClient::new()
            .with_structured(base())
            .with_image_failure("kale plant");

        let result = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap();

        let crops = result.value["crops"].as_array().unwrap();
        assert_eq!(crops[0]["imageDataUri"], recommend::placeholder_image("Kale"));
        for crop in &crops[1..] {
            assert!(crop["imageDataUri"].as_str().unwrap().starts_with("mock://image/"));
        }
        assert_eq!(result.report.fallback_keys(), vec!["Kale"]);
        assert_eq!(result.report.enrichments().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn images_keep_entity_order() {
        let client = MockClient::new()
            .with_structured(base())
            .with_image_delay("kale plant", "mock://kale", Duration::from_millis(30))
            .with_image_delay("bean plant", "mock://beans", Duration::from_millis(20))
            .with_image_delay("amaranth leaves", "mock://amaranth", Duration::from_millis(10));

        let result = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap();

        let uris: Vec<_> = result.value["crops"]
            .as_array()
            .unwrap()
            .iter()
            .map(|crop| crop["imageDataUri"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(uris, ["mock://kale", "mock://beans", "mock://amaranth"]);

        let completed = client.image_completion_order();
        assert!(completed[0].contains("amaranth leaves"));
        assert!(completed[2].contains("kale plant"));
    }

    #[tokio::test]
    async fn community_fields_follow_variant() {
        let client = MockClient::new().with_structured(community_base());
        let result = engine(&client)
            .run(recommend::NAME, request("community"))
            .await
            .unwrap();
        assert_eq!(result.value["areaRequired"], "200 sqm");
        assert_eq!(result.value["seedQuantities"].as_array().unwrap().len(), 3);
        assert!(client.structured_calls()[0].text.contains("community garden"));

        let client = MockClient::new().with_structured(community_base());
        let result = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap();
        assert!(result.value.get("areaRequired").is_none());
        assert!(result.value.get("estimatedWeeklyYield").is_none());
    }

    #[tokio::test]
    async fn community_requires_bulk_fields() {
        let client = MockClient::new().with_structured(base());
        let err = engine(&client)
            .run(recommend::NAME, request("community"))
            .await
            .unwrap_err();

        let FlowError::OutputValidation { violations, .. } = err else {
            panic!("expected output validation error");
        };
        assert!(violations.contains_path("areaRequired"));
        assert!(violations.contains_path("seedQuantities"));
        assert!(client.image_calls().is_empty());
    }

    #[tokio::test]
    async fn empty_crops_skip_enrichment() {
        let client = MockClient::new()
            .with_structured(json!({ "overallRationale": "Nothing fits.", "crops": [] }));

        let err = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::EmptyResult { ref field, .. } if field == "crops"));
        assert_eq!(err.to_string(), recommend::EMPTY_MESSAGE);
        assert!(client.image_calls().is_empty());
    }

    #[tokio::test]
    async fn missing_field_fails_validation() {
        let mut base = base();
        if let Some(crop) = base["crops"][1].as_object_mut() {
            crop.remove("rationale");
        }
        let client = MockClient::new().with_structured(base);

        let err = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap_err();

        let FlowError::OutputValidation { violations, .. } = err else {
            panic!("expected output validation error");
        };
        assert_eq!(violations.paths(), vec!["crops[1].rationale"]);
        assert!(client.image_calls().is_empty());
    }

    #[tokio::test]
    async fn too_few_crops_fail_validation() {
        let client = MockClient::new().with_structured(json!({
            "overallRationale": "Only two.",
            "crops": [crop("Kale", "kale plant"), crop("Beans", "bean plant")]
        }));

        let err = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::OutputValidation { .. }));
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let client = MockClient::new().with_structured_error(
            mavuno_core::Error::rate_limited().with_message("quota exceeded"),
        );

        let err = engine(&client)
            .run(recommend::NAME, request("family"))
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::GenerationTransport { .. }));
        assert!(!err.is_client_error());
        assert!(!err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_client() {
        let client = MockClient::new().with_structured(base());
        let mut input = request("family");
        input["familySize"] = json!(0);

        let err = engine(&client)
            .run(recommend::NAME, input)
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        let FlowError::RequestValidation { violations, .. } = err else {
            panic!("expected request validation error");
        };
        assert!(violations.contains_path("familySize"));
        assert!(client.structured_calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_flow() {
        let client = MockClient::new();
        let err = engine(&client).run("harvest", json!({})).await.unwrap_err();
        assert!(matches!(err, FlowError::UnknownFlow(name) if name == "harvest"));
    }

    #[tokio::test]
    async fn layout_is_normalized() {
        let mut row = vec!["Kale"; 12];
        row[1] = "Cabbage";
        row[2] = "Beans";
        row[3] = "";
        let client = MockClient::new().with_structured(json!({
            "layout": vec![row; 12],
            "description": "Rows of kale with beans.",
            "legend": { "Kale": "green" }
        }));
        let input = json!({
            "crops": [
                { "name": "Kale", "spacing": "30cm", "intercropping": "onions" },
                { "name": "Beans", "spacing": "15cm", "intercropping": "maize" }
            ],
            "landSize": "10 sqm",
            "plantingLocation": "On Ground"
        });

        let result = engine(&client).run(layout::NAME, input).await.unwrap();

        let rows = result.value["layout"].as_array().unwrap();
        assert_eq!(rows.len(), layout::MAX_GRID);
        assert_eq!(
            rows[0].as_array().unwrap()[..4],
            [json!("Kale"), json!(layout::EMPTY_CELL), json!("Beans"), json!(layout::EMPTY_CELL)]
        );
        assert!(rows.iter().all(|row| row.as_array().unwrap().len() == layout::MAX_GRID));
        assert_eq!(result.value["legend"], json!({ "Kale": "green", "Beans": "orange" }));
        assert_eq!(
            result.report.states(),
            [
                FlowState::Pending,
                FlowState::Rendering,
                FlowState::Requesting,
                FlowState::Validating,
                FlowState::Assembling,
                FlowState::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn diagnosis_attaches_photo() {
        let client = MockClient::new().with_structured(json!({
            "feedback": "Lovely and green!",
            "alerts": ["Mulch needed"]
        }));

        let result = engine(&client)
            .run("diagnosis", json!({ "photoDataUri": "data:image/jpeg;base64,/9j/4AAQ" }))
            .await
            .unwrap();

        assert_eq!(result.value["alerts"], json!(["Mulch needed"]));
        let prompt = &client.structured_calls()[0];
        assert_eq!(prompt.media.len(), 1);
        assert_eq!(prompt.media[0].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn rejects_photo_that_is_not_a_data_uri() {
        let client = MockClient::new();
        let err = engine(&client)
            .run("diagnosis", json!({ "photoDataUri": "https://example.com/garden.jpg" }))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::RequestValidation { .. }));
        assert!(client.structured_calls().is_empty());
    }
}
