//! Streaming-availability verification step
//!
//! Lets the model probe the candidate titles through a single catalog tool, under
//! the hard invocation cap from configuration. The tool reports three outcomes as
//! plain text the model can reason over:
//!
//! - `'<title>' is available on: <platforms> in <region>.`
//! - `'<title>' is NOT available for streaming in <region>.`
//! - `Could not find '<title>' in the catalog.`
//!
//! Misses are never errors; only provider transport failures abort the step, and
//! those leave the thread's checkpoint retryable.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use watchgraph_core::{
    ChatModel, GraphError, Message, Result, Step, StepContext, StepOutcome, ToolCall,
    ToolDefinition, ToolFuture, ToolLoopExecutor,
};

use crate::config::RecommenderConfig;
use crate::providers::CatalogProvider;
use crate::state::{RecommenderState, StateUpdate};

const TOOL_NAME: &str = "check_streaming_availability";

/// Verifies which candidates can actually be streamed tonight.
pub struct CheckAvailability {
    model: Arc<dyn ChatModel>,
    catalog: Arc<dyn CatalogProvider>,
    config: RecommenderConfig,
}

impl CheckAvailability {
    /// Create the step with injected collaborators
    pub fn new(
        model: Arc<dyn ChatModel>,
        catalog: Arc<dyn CatalogProvider>,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            model,
            catalog,
            config,
        }
    }

    fn tool_definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            TOOL_NAME,
            format!(
                "Check whether a movie or series is available for streaming in {}. \
                 Takes the exact title to look up.",
                self.config.region_name
            ),
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Title to check"}
            },
            "required": ["title"],
        }))
    }

    fn seed_transcript(&self, state: &RecommenderState) -> Vec<Message> {
        let system = Message::system(format!(
            "You verify streaming availability for a couple deciding what to watch. \
             Use the {TOOL_NAME} tool to check which of the candidate titles can be \
             streamed in {} right now, starting with the most promising ones. \
             You may check up to {} titles. Stop once you have checked enough.",
            self.config.region_name, self.config.max_availability_checks
        ));

        let mood = if state.mood.is_empty() {
            "not specified".to_string()
        } else {
            state.mood.join(", ")
        };
        let genres = if state.genres.is_empty() {
            "no preference".to_string()
        } else {
            state.genres.join(", ")
        };
        let candidates = if state.search_results.is_empty() {
            "(none)".to_string()
        } else {
            state
                .search_results
                .iter()
                .map(|m| format!("- {} ({})", m.title, m.media_type))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let human = Message::human(format!(
            "Current mood: {mood}\n\
             Wants: {}\n\
             Genres: {genres}\n\
             Nostalgic reference: {}\n\n\
             Candidate titles from their watch history:\n{candidates}",
            state.media_type.as_deref().unwrap_or("not specified"),
            state.nostalgic_title.as_deref().unwrap_or("none"),
        ));

        vec![system, human]
    }
}

/// Build the tool handler: resolve the title to its top catalog candidate, look
/// up regional platforms, and phrase the outcome.
fn availability_handler(
    catalog: Arc<dyn CatalogProvider>,
    region_code: String,
    region_name: String,
) -> impl Fn(ToolCall) -> ToolFuture + Send + Sync {
    move |call: ToolCall| {
        let catalog = catalog.clone();
        let region_code = region_code.clone();
        let region_name = region_name.clone();
        Box::pin(async move {
            let title = call.string_arg("title").unwrap_or("").to_string();

            let candidates = catalog
                .find_title(&title)
                .await
                .map_err(|e| GraphError::upstream("check_availability", e.to_string()))?;

            let top = match candidates.first() {
                Some(entry) => entry.clone(),
                None => return Ok(format!("Could not find '{title}' in the catalog.")),
            };

            let regions = catalog
                .availability(top.id, &top.media_type)
                .await
                .map_err(|e| GraphError::upstream("check_availability", e.to_string()))?;

            let platforms = regions.get(&region_code).cloned().unwrap_or_default();
            if platforms.is_empty() {
                Ok(format!(
                    "'{}' is NOT available for streaming in {region_name}.",
                    top.title
                ))
            } else {
                Ok(format!(
                    "'{}' is available on: {} in {region_name}.",
                    top.title,
                    platforms.join(", ")
                ))
            }
        })
    }
}

#[async_trait]
impl Step<RecommenderState> for CheckAvailability {
    async fn run(
        &self,
        state: &RecommenderState,
        _ctx: &mut StepContext,
    ) -> Result<StepOutcome<RecommenderState>> {
        let executor = ToolLoopExecutor::new(self.model.clone())
            .with_max_tool_calls(self.config.max_availability_checks)
            .register_tool(
                self.tool_definition(),
                availability_handler(
                    self.catalog.clone(),
                    self.config.region_code.clone(),
                    self.config.region_name.clone(),
                ),
            );

        let info = executor.run(self.seed_transcript(state)).await?;
        debug!(chars = info.len(), "availability check finished");

        Ok(StepOutcome::Update(StateUpdate {
            availability_info: Some(info),
            ..Default::default()
        }))
    }
}
