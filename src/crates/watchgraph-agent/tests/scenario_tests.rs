//! End-to-end dialogue scenarios
//!
//! These tests run whole conversations through the public `Recommender` surface
//! with scripted collaborators: a queue-driven search provider, an in-memory
//! catalog, and a scripted chat model. Final state is inspected through the
//! shared checkpoint backend, the same way a restarted process would see it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::json;

use watchgraph_checkpoint::{CheckpointSaver, InMemoryCheckpointSaver};
use watchgraph_core::{
    ChatModel, ChatRequest, ChatResponse, GraphError, Message, Result, StreamEvent, TokenStream,
    ToolCall,
};

use watchgraph_agent::{
    route_after_search, CatalogEntry, CatalogProvider, MediaMatch, ProviderResult, Recommender,
    RecommenderConfig, RecommenderState, SearchProvider, StepId, TurnReply,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn media_match(title: &str) -> MediaMatch {
    MediaMatch {
        title: title.to_string(),
        media_type: "movie".to_string(),
        user_rating: Some(8),
        user_review: "Loved it.".to_string(),
        partner_review: "Favourite.".to_string(),
    }
}

/// Search provider that pops one canned result list per call and records queries.
struct QueueSearch {
    responses: Mutex<VecDeque<Vec<MediaMatch>>>,
    queries: Mutex<Vec<String>>,
}

impl QueueSearch {
    fn new(responses: Vec<Vec<MediaMatch>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchProvider for QueueSearch {
    async fn search(&self, query: &str, _limit: usize) -> ProviderResult<Vec<MediaMatch>> {
        self.queries.lock().push(query.to_string());
        Ok(self.responses.lock().pop_front().unwrap_or_default())
    }
}

struct FixtureCatalog {
    entries: Vec<CatalogEntry>,
    platforms: HashMap<String, Vec<String>>,
}

impl FixtureCatalog {
    fn with_title(title: &str, platforms: Vec<&str>) -> Self {
        Self {
            entries: vec![CatalogEntry {
                id: 1,
                title: title.to_string(),
                media_type: "movie".to_string(),
            }],
            platforms: HashMap::from([(
                "RO".to_string(),
                platforms.into_iter().map(String::from).collect(),
            )]),
        }
    }
}

#[async_trait]
impl CatalogProvider for FixtureCatalog {
    async fn find_title(&self, name: &str) -> ProviderResult<Vec<CatalogEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.title == name)
            .cloned()
            .collect())
    }

    async fn availability(
        &self,
        _id: i64,
        _media_type: &str,
    ) -> ProviderResult<HashMap<String, Vec<String>>> {
        Ok(self.platforms.clone())
    }
}

/// Chat model that pops one canned reply per `chat` call and streams fixed
/// fragments from `stream`.
struct ScriptedModel {
    replies: Mutex<VecDeque<Message>>,
    fragments: Vec<String>,
}

impl ScriptedModel {
    fn new(replies: Vec<Message>, fragments: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fragments: fragments.into_iter().map(String::from).collect(),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Message::assistant("## Fallback\n\nA fine pick."));
        Ok(ChatResponse::new(reply))
    }

    async fn stream(&self, _request: ChatRequest) -> Result<TokenStream> {
        let fragments = self.fragments.clone();
        Ok(Box::pin(futures::stream::iter(
            fragments.into_iter().map(Ok),
        )))
    }
}

fn check_call(id: &str, title: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: "check_streaming_availability".to_string(),
        arguments: json!({"title": title}),
    }
}

struct Harness {
    recommender: Recommender,
    saver: Arc<InMemoryCheckpointSaver>,
    search: Arc<QueueSearch>,
}

fn harness(
    searches: Vec<Vec<MediaMatch>>,
    model_replies: Vec<Message>,
    fragments: Vec<&str>,
    catalog: FixtureCatalog,
) -> Harness {
    let saver = Arc::new(InMemoryCheckpointSaver::new());
    let search = Arc::new(QueueSearch::new(searches));
    let recommender = Recommender::new(
        Arc::new(ScriptedModel::new(model_replies, fragments)),
        search.clone(),
        Arc::new(catalog),
        saver.clone() as Arc<dyn CheckpointSaver>,
        RecommenderConfig::default(),
    )
    .expect("valid graph");
    Harness {
        recommender,
        saver,
        search,
    }
}

async fn final_state(saver: &InMemoryCheckpointSaver, thread_id: &str) -> RecommenderState {
    let cp = saver.get(thread_id).await.unwrap().unwrap();
    serde_json::from_value(cp.state).unwrap()
}

/// Walk the three-question interview; the third answer triggers the rest of
/// the run.
async fn answer_interview(h: &Harness, genres_answer: &str) -> (String, TurnReply) {
    let opened = h.recommender.start().await.unwrap();
    assert!(matches!(&opened.reply, TurnReply::Question(q) if q.contains("What mood")));

    let reply = h
        .recommender
        .reply(&opened.thread_id, "relaxed")
        .await
        .unwrap();
    assert!(matches!(&reply, TurnReply::Question(q) if q.contains("movie, a series, or both")));

    let reply = h.recommender.reply(&opened.thread_id, "movie").await.unwrap();
    assert!(matches!(&reply, TurnReply::Question(q) if q.contains("genre preferences")));

    let reply = h
        .recommender
        .reply(&opened.thread_id, genres_answer)
        .await
        .unwrap();
    (opened.thread_id, reply)
}

// ---------------------------------------------------------------------------
// Scenario 1: enough matches, straight to the recommendation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_happy_path_skips_nostalgic_question() {
    let h = harness(
        vec![vec![
            media_match("Inception"),
            media_match("Arrival"),
            media_match("Interstellar"),
        ]],
        vec![
            // Availability: one check, then stop.
            Message::assistant_with_tool_calls("", vec![check_call("1", "Inception")]),
            Message::assistant("done checking"),
            // Recommendation.
            Message::assistant("## Dune\n\nMoody and epic.\n\n### Available on: `Netflix`"),
        ],
        vec![],
        FixtureCatalog::with_title("Inception", vec!["Netflix"]),
    );

    let (thread_id, reply) = answer_interview(&h, "no preference").await;

    match reply {
        TurnReply::Recommendation(text) => assert!(text.starts_with("## Dune")),
        other => panic!("expected recommendation, got {other:?}"),
    }

    let state = final_state(&h.saver, &thread_id).await;
    assert!(!state.asked_nostalgic, "nostalgic step must never run");
    assert_eq!(state.genres, Vec::<String>::new());
    assert_eq!(
        state.availability_info.as_deref(),
        Some("'Inception' is available on: Netflix in Romania.")
    );

    let queries = h.search.queries.lock().clone();
    assert_eq!(queries, vec!["mood: relaxed. type: movie"]);
}

// ---------------------------------------------------------------------------
// Scenario 2: thin results, nostalgic fallback, second search proceeds anyway
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_thin_results_ask_nostalgic_then_proceed() {
    let h = harness(
        vec![
            Vec::new(),                        // first search: nothing
            vec![media_match("The Matrix")],   // second search: still only one
        ],
        vec![
            Message::assistant("nothing to check"), // availability: no tool calls
            Message::assistant("## Dark City\n\nSame haunting feel.\n\n### Available on: `HBO`"),
        ],
        vec![],
        FixtureCatalog::with_title("The Matrix", vec![]),
    );

    let (thread_id, reply) = answer_interview(&h, "thriller and sci-fi").await;

    // Thin pool: the dialogue falls back to the nostalgic question.
    match reply {
        TurnReply::Question(q) => assert!(q.contains("really stuck with you")),
        other => panic!("expected nostalgic question, got {other:?}"),
    }

    // One result is still below the threshold, but the question is spent, so
    // the dialogue proceeds to the recommendation.
    let reply = h
        .recommender
        .reply(&thread_id, "The Matrix")
        .await
        .unwrap();
    match reply {
        TurnReply::Recommendation(text) => assert!(text.starts_with("## Dark City")),
        other => panic!("expected recommendation, got {other:?}"),
    }

    let state = final_state(&h.saver, &thread_id).await;
    assert!(state.asked_nostalgic);
    assert_eq!(state.nostalgic_title.as_deref(), Some("The Matrix"));
    assert_eq!(state.search_results.len(), 1);
    // The availability round made no tool calls.
    assert_eq!(state.availability_info.as_deref(), Some(""));

    let queries = h.search.queries.lock().clone();
    assert_eq!(queries.len(), 2);
    assert!(queries[1].ends_with("similar feel to: The Matrix"));
}

// ---------------------------------------------------------------------------
// Scenario 3: availability tool round produces the exact message shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_availability_info_message_shape() {
    let h = harness(
        vec![vec![media_match("Inception"), media_match("Arrival")]],
        vec![
            Message::assistant_with_tool_calls("", vec![check_call("1", "Inception")]),
            Message::assistant("done"),
            Message::assistant("## Tenet\n\nTwisty.\n\n### Available on: `Netflix`"),
        ],
        vec![],
        FixtureCatalog::with_title("Inception", vec!["Netflix"]),
    );

    let (thread_id, reply) = answer_interview(&h, "no preference").await;
    assert!(matches!(reply, TurnReply::Recommendation(_)));

    let state = final_state(&h.saver, &thread_id).await;
    assert_eq!(
        state.availability_info.as_deref(),
        Some("'Inception' is available on: Netflix in Romania.")
    );
}

// ---------------------------------------------------------------------------
// Scenario 4: an insistent responder is cut off at the configured bound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_tool_loop_bound_cuts_off_insistent_responder() {
    // One tool call per round, six rounds scripted; the cap of 4 must stop the
    // loop after exactly four executed checks and never consult the responder
    // for a fifth round.
    let replies: Vec<Message> = (1..=6)
        .map(|i| Message::assistant_with_tool_calls("", vec![check_call(&i.to_string(), "Inception")]))
        .collect();

    let h = harness(
        vec![vec![media_match("Inception"), media_match("Arrival")]],
        replies,
        vec![],
        FixtureCatalog::with_title("Inception", vec!["Netflix"]),
    );

    let (thread_id, reply) = answer_interview(&h, "no preference").await;
    assert!(matches!(reply, TurnReply::Recommendation(_)));

    let state = final_state(&h.saver, &thread_id).await;
    let info = state.availability_info.expect("availability ran");
    let lines: Vec<&str> = info.lines().collect();
    assert_eq!(lines.len(), 4, "exactly four tool results, never a fifth");
    assert!(lines
        .iter()
        .all(|l| *l == "'Inception' is available on: Netflix in Romania."));
}

// ---------------------------------------------------------------------------
// Scenario 5: streaming final turn
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_streaming_final_turn() {
    let h = harness(
        vec![vec![media_match("Inception"), media_match("Arrival")]],
        vec![
            Message::assistant("nothing to check"), // availability round
        ],
        vec!["Here's my pick: ", "## Dune", "\n\n", "Epic ", "and moody."],
        FixtureCatalog::with_title("Inception", vec!["Netflix"]),
    );

    let opened = h.recommender.start().await.unwrap();
    h.recommender
        .reply(&opened.thread_id, "relaxed")
        .await
        .unwrap();
    h.recommender
        .reply(&opened.thread_id, "movie")
        .await
        .unwrap();

    let stream = h
        .recommender
        .reply_stream(&opened.thread_id, "no preference")
        .await
        .unwrap();
    let events: Vec<_> = stream.collect().await;

    let chunks: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Chunk(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(chunks, "Here's my pick: ## Dune\n\nEpic and moody.");
    assert_eq!(events.last(), Some(&StreamEvent::Done));

    // The persisted recommendation is heading-normalized even though the raw
    // stream carried the preamble.
    let state = final_state(&h.saver, &opened.thread_id).await;
    assert_eq!(
        state.recommendation.as_deref(),
        Some("## Dune\n\nEpic and moody.")
    );
}

// ---------------------------------------------------------------------------
// Protocol errors and thread independence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reply_to_unknown_thread() {
    let h = harness(vec![], vec![], vec![], FixtureCatalog::with_title("x", vec![]));
    let err = h.recommender.reply("no-such-thread", "hi").await.unwrap_err();
    assert!(matches!(err, GraphError::ThreadNotFound(_)));
}

#[tokio::test]
async fn test_reply_after_completion_is_protocol_error() {
    let h = harness(
        vec![vec![media_match("Inception"), media_match("Arrival")]],
        vec![
            Message::assistant("nothing to check"),
            Message::assistant("## Dune\n\nGood.\n\n### Available on: `Netflix`"),
        ],
        vec![],
        FixtureCatalog::with_title("Inception", vec!["Netflix"]),
    );

    let (thread_id, reply) = answer_interview(&h, "no preference").await;
    assert!(matches!(reply, TurnReply::Recommendation(_)));

    let err = h.recommender.reply(&thread_id, "more please").await.unwrap_err();
    assert!(matches!(err, GraphError::NoPendingInterrupt { .. }));
}

#[tokio::test]
async fn test_two_threads_are_independent() {
    let h = harness(vec![], vec![], vec![], FixtureCatalog::with_title("x", vec![]));

    let a = h.recommender.start().await.unwrap();
    let b = h.recommender.start().await.unwrap();
    assert_ne!(a.thread_id, b.thread_id);

    h.recommender.reply(&a.thread_id, "tense").await.unwrap();

    let state_a = final_state(&h.saver, &a.thread_id).await;
    let state_b = final_state(&h.saver, &b.thread_id).await;
    assert_eq!(state_a.mood, vec!["tense"]);
    assert!(state_b.mood.is_empty());
}

// ---------------------------------------------------------------------------
// Router property
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_router_decision_matches_threshold_rule(
        result_count in 0usize..10,
        asked in any::<bool>(),
    ) {
        let state = RecommenderState {
            search_results: (0..result_count).map(|i| media_match(&format!("T{i}"))).collect(),
            asked_nostalgic: asked,
            ..Default::default()
        };

        let expected = if result_count >= 2 || asked {
            StepId::CheckAvailability
        } else {
            StepId::AskNostalgic
        };
        prop_assert_eq!(route_after_search(&state, 2), expected);
    }
}
