//! Integration tests for complete dialogue runs
//!
//! These tests drive a small interview graph with a conditional edge through
//! the engine, covering suspension, resume re-entry, durability across engine
//! instances, routing failure, and the streaming gate.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use watchgraph_checkpoint::{CheckpointSaver, InMemoryCheckpointSaver, ThreadStatus};
use watchgraph_core::{
    GraphBuilder, GraphEngine, GraphError, GraphState, Result, RunOutcome, Step, StepContext,
    StepOutcome, StreamEvent,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Quiz {
    answer: Option<String>,
    attempts: u32,
    verdict: Option<String>,
}

#[derive(Debug)]
enum QuizPatch {
    Answer(String),
    Verdict(String),
}

impl GraphState for Quiz {
    type Patch = QuizPatch;

    fn apply(&mut self, patch: QuizPatch) {
        match patch {
            QuizPatch::Answer(a) => {
                self.answer = Some(a);
                self.attempts += 1;
            }
            QuizPatch::Verdict(v) => self.verdict = Some(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum QuizStep {
    Ask,
    Grade,
    Announce,
}

struct Ask;

#[async_trait]
impl Step<Quiz> for Ask {
    async fn run(&self, _state: &Quiz, ctx: &mut StepContext) -> Result<StepOutcome<Quiz>> {
        match ctx.take_resume() {
            Some(answer) => Ok(StepOutcome::Update(QuizPatch::Answer(answer))),
            None => Ok(StepOutcome::RequestInput {
                prompt: "What is the capital of France?".to_string(),
            }),
        }
    }
}

struct Grade;

#[async_trait]
impl Step<Quiz> for Grade {
    async fn run(&self, state: &Quiz, _ctx: &mut StepContext) -> Result<StepOutcome<Quiz>> {
        let verdict = if state.answer.as_deref() == Some("Paris") {
            "correct"
        } else {
            "incorrect"
        };
        Ok(StepOutcome::Update(QuizPatch::Verdict(verdict.to_string())))
    }
}

/// Streams the verdict word by word, so the stream gate can be observed.
struct Announce;

#[async_trait]
impl Step<Quiz> for Announce {
    async fn run(&self, state: &Quiz, ctx: &mut StepContext) -> Result<StepOutcome<Quiz>> {
        let verdict = state.verdict.clone().unwrap_or_default();
        for word in ["Your", "answer", "is", verdict.as_str()] {
            ctx.emit(format!("{word} ")).await;
        }
        Ok(StepOutcome::Update(QuizPatch::Verdict(verdict)))
    }
}

fn quiz_router(state: &Quiz) -> QuizStep {
    if state.answer.is_some() {
        QuizStep::Grade
    } else {
        QuizStep::Ask
    }
}

fn build_engine(saver: Arc<InMemoryCheckpointSaver>) -> GraphEngine<Quiz, QuizStep> {
    GraphBuilder::new()
        .add_step(QuizStep::Ask, Ask)
        .add_step(QuizStep::Grade, Grade)
        .add_step(QuizStep::Announce, Announce)
        .set_entry(QuizStep::Ask)
        .add_branch(QuizStep::Ask, quiz_router, vec![QuizStep::Ask, QuizStep::Grade])
        .add_edge(QuizStep::Grade, QuizStep::Announce)
        .finish_at(QuizStep::Announce)
        .stream_tokens_from(QuizStep::Announce)
        .compile(saver as Arc<dyn CheckpointSaver>)
        .expect("valid graph")
}

#[tokio::test]
async fn test_run_to_completion() {
    let saver = Arc::new(InMemoryCheckpointSaver::new());
    let engine = build_engine(saver.clone());

    let (thread_id, outcome) = engine.start(Quiz::default()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Suspended { .. }));

    let outcome = engine.resume(&thread_id, "Paris".to_string()).await.unwrap();
    match outcome {
        RunOutcome::Completed(state) => {
            assert_eq!(state.verdict.as_deref(), Some("correct"));
            assert_eq!(state.attempts, 1);
        }
        other => panic!("expected completion, got {other:?}"),
    }

    let cp = saver.get(&thread_id).await.unwrap().unwrap();
    assert_eq!(cp.status, ThreadStatus::Completed);
}

#[tokio::test]
async fn test_resume_survives_engine_restart() {
    let saver = Arc::new(InMemoryCheckpointSaver::new());

    // First "process": ask the question, then drop the engine.
    let thread_id = {
        let engine = build_engine(saver.clone());
        let (thread_id, _) = engine.start(Quiz::default()).await.unwrap();
        thread_id
    };

    // Second "process": a fresh engine over the same storage resumes the thread.
    let engine = build_engine(saver.clone());
    let outcome = engine.resume(&thread_id, "Paris".to_string()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));
}

#[tokio::test]
async fn test_streaming_resume_chunks_then_done() {
    let saver = Arc::new(InMemoryCheckpointSaver::new());
    let engine = build_engine(saver.clone());

    let (thread_id, _) = engine.start(Quiz::default()).await.unwrap();
    let stream = engine
        .resume_stream(&thread_id, "Paris".to_string())
        .await
        .unwrap();
    let events: Vec<_> = stream.collect().await;

    let (chunks, terminals): (Vec<_>, Vec<_>) =
        events.into_iter().partition(|e| !e.is_terminal());

    let text: String = chunks
        .iter()
        .map(|e| match e {
            StreamEvent::Chunk(t) => t.as_str(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(text, "Your answer is correct ");
    assert_eq!(terminals, vec![StreamEvent::Done]);
}

#[tokio::test]
async fn test_streaming_resume_of_unknown_thread_fails_eagerly() {
    let saver = Arc::new(InMemoryCheckpointSaver::new());
    let engine = build_engine(saver);

    let err = engine
        .resume_stream("missing", "Paris".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::ThreadNotFound(_)));
}

#[tokio::test]
async fn test_failed_resume_can_be_retried_without_losing_answers() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Grades correctly once its backing service recovers.
    struct FlakyGrade {
        failures_left: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Step<Quiz> for FlakyGrade {
        async fn run(&self, state: &Quiz, _ctx: &mut StepContext) -> Result<StepOutcome<Quiz>> {
            if self.failures_left.swap(0, Ordering::SeqCst) > 0 {
                return Err(GraphError::upstream("grade", "grading service offline"));
            }
            let verdict = if state.answer.as_deref() == Some("Paris") {
                "correct"
            } else {
                "incorrect"
            };
            Ok(StepOutcome::Update(QuizPatch::Verdict(verdict.to_string())))
        }
    }

    let saver = Arc::new(InMemoryCheckpointSaver::new());
    let engine = GraphBuilder::new()
        .add_step(QuizStep::Ask, Ask)
        .add_step(
            QuizStep::Grade,
            FlakyGrade {
                failures_left: Arc::new(AtomicUsize::new(1)),
            },
        )
        .add_step(QuizStep::Announce, Announce)
        .set_entry(QuizStep::Ask)
        .add_branch(QuizStep::Ask, quiz_router, vec![QuizStep::Ask, QuizStep::Grade])
        .add_edge(QuizStep::Grade, QuizStep::Announce)
        .finish_at(QuizStep::Announce)
        .compile(saver.clone() as Arc<dyn CheckpointSaver>)
        .unwrap();

    let (thread_id, _) = engine.start(Quiz::default()).await.unwrap();

    let err = engine.resume(&thread_id, "Paris".to_string()).await.unwrap_err();
    assert!(matches!(err, GraphError::Upstream { .. }));
    assert!(err.is_retryable());

    // The answer merged before the failure survives in the stored record,
    // which points back at the step that failed.
    let cp = saver.get(&thread_id).await.unwrap().unwrap();
    assert!(matches!(cp.status, ThreadStatus::Running { .. }));
    let stored: Quiz = serde_json::from_value(cp.state.clone()).unwrap();
    assert_eq!(stored.answer.as_deref(), Some("Paris"));

    // The identical resume call succeeds once the collaborator recovers, and
    // re-enters at the failed step rather than re-merging the answer.
    let outcome = engine.resume(&thread_id, "Paris".to_string()).await.unwrap();
    match outcome {
        RunOutcome::Completed(state) => {
            assert_eq!(state.answer.as_deref(), Some("Paris"));
            assert_eq!(state.verdict.as_deref(), Some("correct"));
            assert_eq!(state.attempts, 1);
        }
        other => panic!("expected completion after retry, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undeclared_router_target_fails_thread() {
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Unit;

    impl GraphState for Unit {
        type Patch = ();
        fn apply(&mut self, _patch: ()) {}
    }

    struct Noop;

    #[async_trait]
    impl Step<Unit> for Noop {
        async fn run(&self, _state: &Unit, _ctx: &mut StepContext) -> Result<StepOutcome<Unit>> {
            Ok(StepOutcome::Update(()))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum K {
        A,
        B,
        C,
    }

    let saver = Arc::new(InMemoryCheckpointSaver::new());
    // Router returns C, but only B is declared as a target.
    let engine = GraphBuilder::new()
        .add_step(K::A, Noop)
        .add_step(K::B, Noop)
        .add_step(K::C, Noop)
        .set_entry(K::A)
        .add_branch(K::A, |_s: &Unit| K::C, vec![K::B])
        .finish_at(K::B)
        .finish_at(K::C)
        .compile(saver.clone() as Arc<dyn CheckpointSaver>)
        .unwrap();

    let result = engine.start(Unit).await;
    match result {
        Ok((_, outcome)) => panic!("expected routing failure, got {outcome:?}"),
        Err(GraphError::Routing { from, selected }) => {
            assert_eq!(from, "A");
            assert_eq!(selected, "C");
        }
        Err(other) => panic!("expected Routing, got {other}"),
    }
}

#[tokio::test]
async fn test_backpressure_is_bounded_not_lossy() {
    // A consumer that drains slowly still receives every chunk.
    let saver = Arc::new(InMemoryCheckpointSaver::new());
    let engine = build_engine(saver.clone());

    let (thread_id, _) = engine.start(Quiz::default()).await.unwrap();
    let mut stream = engine
        .resume_stream(&thread_id, "Lyon".to_string())
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.last(), Some(&StreamEvent::Done));
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Chunk(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Your answer is incorrect ");
}
