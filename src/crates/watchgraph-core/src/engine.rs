//! Graph execution engine
//!
//! This module provides **[`GraphEngine`]** - the runtime that drives a thread through
//! a compiled dialogue graph, persisting a checkpoint after every step so the
//! conversation survives process restarts between turns.
//!
//! # Overview
//!
//! The engine owns three responsibilities:
//!
//! - **The drive loop** - run the current step, merge its patch, persist, follow the
//!   outgoing edge; or persist the pause when the step asks a question.
//! - **The resume protocol** - validate that a resume addresses a real thread that is
//!   either waiting on a question or was cut short mid-run by a step failure, then
//!   re-enter the recorded step with the answer in the step context.
//! - **Thread exclusivity** - at most one execution per thread id at a time, enforced
//!   by an in-process permit set; the losing caller gets [`GraphError::ThreadBusy`]
//!   and the stored checkpoint is never touched by the loser.
//!
//! # Persistence Points
//!
//! ```text
//! start ──► put(Running { step: entry }, initial)
//! step returns RequestInput ──► put(WaitingForInput { step, prompt })
//! step returns Update ──► apply patch ──► put(Running { step: next }) ──► follow edge
//! edge is End ──► put(Completed)
//! router selects unregistered step ──► put(Failed) ──► Err(Routing)
//! step returns Err ──► checkpoint untouched; its status still names the failed
//!                      step, so retrying the same resume re-enters that step
//!                      with every previously merged answer intact
//! ```
//!
//! # Streaming
//!
//! [`GraphEngine::resume_stream`] validates eagerly (thread exists, question pending,
//! permit acquired) and then drives the run on a spawned task, forwarding events
//! through a bounded channel. Chunks can only come from the step designated by
//! `stream_tokens_from`; the task closes the stream with exactly one terminal event.
//!
//! # See Also
//!
//! - [`GraphBuilder`](crate::graph::GraphBuilder) - Produces the compiled graph
//! - [`Step`](crate::interrupt::Step) - The work being driven
//! - [`CheckpointSaver`](watchgraph_checkpoint::CheckpointSaver) - Persistence seam

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use watchgraph_checkpoint::{Checkpoint, CheckpointSaver, ThreadStatus};

use crate::error::{GraphError, Result};
use crate::graph::{Edge, Graph};
use crate::interrupt::{StepContext, StepOutcome};
use crate::state::{GraphState, StepKey};
use crate::stream::StreamEvent;

/// Capacity of the streaming event channel; a slow consumer backpressures the
/// producing run, never unbounded memory.
const STREAM_CHANNEL_CAPACITY: usize = 32;

/// Result of driving a thread until it pauses or finishes.
#[derive(Debug)]
pub enum RunOutcome<S> {
    /// The run paused on a question; answer it with a later resume.
    Suspended {
        /// Question text for the user.
        prompt: String,
    },
    /// The run reached the finish step.
    Completed(S),
}

/// In-process permit set enforcing one execution per thread id.
#[derive(Clone, Default)]
struct ActiveThreads {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActiveThreads {
    fn acquire(&self, thread_id: &str) -> Option<ThreadPermit> {
        let mut held = self.inner.lock();
        if held.insert(thread_id.to_string()) {
            Some(ThreadPermit {
                thread_id: thread_id.to_string(),
                set: self.inner.clone(),
            })
        } else {
            None
        }
    }
}

/// RAII guard releasing a thread's execution permit on drop.
struct ThreadPermit {
    thread_id: String,
    set: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ThreadPermit {
    fn drop(&mut self) {
        self.set.lock().remove(&self.thread_id);
    }
}

struct EngineInner<S: GraphState, N: StepKey> {
    graph: Graph<S, N>,
    checkpointer: Arc<dyn CheckpointSaver>,
    active: ActiveThreads,
}

/// Executes a compiled dialogue graph against persisted threads.
///
/// Cheap to clone; clones share the graph, the checkpointer, and the permit set.
pub struct GraphEngine<S: GraphState, N: StepKey> {
    inner: Arc<EngineInner<S, N>>,
}

impl<S: GraphState, N: StepKey> std::fmt::Debug for GraphEngine<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphEngine").finish_non_exhaustive()
    }
}

impl<S: GraphState, N: StepKey> Clone for GraphEngine<S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: GraphState, N: StepKey> GraphEngine<S, N> {
    pub(crate) fn new(graph: Graph<S, N>, checkpointer: Arc<dyn CheckpointSaver>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                graph,
                checkpointer,
                active: ActiveThreads::default(),
            }),
        }
    }

    /// Begin a new thread from the entry step.
    ///
    /// Returns the assigned thread id together with the first outcome, which for
    /// an interview graph is normally `Suspended` on the opening question.
    pub async fn start(&self, initial: S) -> Result<(String, RunOutcome<S>)> {
        let thread_id = Uuid::new_v4().to_string();
        let permit = self
            .inner
            .active
            .acquire(&thread_id)
            .ok_or_else(|| GraphError::ThreadBusy(thread_id.clone()))?;

        info!(thread_id = %thread_id, "starting thread");

        let base = Checkpoint::new(
            thread_id.clone(),
            serde_json::to_value(&initial)?,
            ThreadStatus::Running {
                step: serde_json::to_value(self.inner.graph.entry)?,
            },
        );
        self.inner.checkpointer.put(base.clone()).await?;

        let outcome = self
            .drive(&thread_id, initial, self.inner.graph.entry, None, base, None)
            .await;
        drop(permit);

        Ok((thread_id, outcome?))
    }

    /// Answer the pending question of a waiting thread and drive until the next
    /// pause or completion.
    ///
    /// A thread whose previous run was cut short by a step failure is still at
    /// `Running` with the failed step recorded; resuming it again with the same
    /// answer re-enters that step, with every answer merged before the failure
    /// intact.
    pub async fn resume(&self, thread_id: &str, answer: String) -> Result<RunOutcome<S>> {
        let permit = self
            .inner
            .active
            .acquire(thread_id)
            .ok_or_else(|| GraphError::ThreadBusy(thread_id.to_string()))?;

        let (state, step, base) = self.load_resumable(thread_id).await?;
        let outcome = self
            .drive(thread_id, state, step, Some(answer), base, None)
            .await;
        drop(permit);
        outcome
    }

    /// Streaming variant of [`resume`](Self::resume).
    ///
    /// Validation happens before this returns, so an unknown thread, a terminal
    /// thread, or a busy thread is an `Err` rather than an event. The
    /// returned stream yields zero or more `Chunk`s followed by exactly one
    /// terminal event.
    pub async fn resume_stream(
        &self,
        thread_id: &str,
        answer: String,
    ) -> Result<ReceiverStream<StreamEvent>> {
        let permit = self
            .inner
            .active
            .acquire(thread_id)
            .ok_or_else(|| GraphError::ThreadBusy(thread_id.to_string()))?;

        let (state, step, base) = self.load_resumable(thread_id).await?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let engine = self.clone();
        let thread_id = thread_id.to_string();

        tokio::spawn(async move {
            let outcome = engine
                .drive(&thread_id, state, step, Some(answer), base, Some(tx.clone()))
                .await;
            drop(permit);

            let terminal = match outcome {
                Ok(RunOutcome::Completed(_)) => StreamEvent::Done,
                Ok(RunOutcome::Suspended { prompt }) => StreamEvent::Question(prompt),
                Err(e) => StreamEvent::Error(e.to_string()),
            };
            let _ = tx.send(terminal).await;
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Fetch a thread's checkpoint and the step a resume re-enters.
    ///
    /// `WaitingForInput` re-enters the step that asked the pending question;
    /// `Running` re-enters the recorded next step (the one whose failure cut the
    /// previous run short). Terminal statuses are protocol violations.
    async fn load_resumable(&self, thread_id: &str) -> Result<(S, N, Checkpoint)> {
        let checkpoint = self
            .inner
            .checkpointer
            .get(thread_id)
            .await?
            .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?;

        match &checkpoint.status {
            ThreadStatus::WaitingForInput { step, .. } | ThreadStatus::Running { step } => {
                let step: N = serde_json::from_value(step.clone())?;
                let state: S = serde_json::from_value(checkpoint.state.clone())?;
                Ok((state, step, checkpoint))
            }
            other => Err(GraphError::NoPendingInterrupt {
                thread_id: thread_id.to_string(),
                status: status_label(other).to_string(),
            }),
        }
    }

    /// Run steps until the thread pauses, completes, or fails.
    ///
    /// The resume answer is threaded only into the first step executed; every
    /// later step in the same drive sees an empty resume slot.
    async fn drive(
        &self,
        thread_id: &str,
        mut state: S,
        mut current: N,
        mut resume: Option<String>,
        mut base: Checkpoint,
        tokens: Option<mpsc::Sender<StreamEvent>>,
    ) -> Result<RunOutcome<S>> {
        loop {
            let step = self.inner.graph.steps.get(&current).ok_or_else(|| {
                GraphError::configuration(format!("step {current:?} is not registered"))
            })?;

            let mut ctx = match resume.take() {
                Some(answer) => StepContext::with_resume(answer),
                None => StepContext::new(),
            };
            if self.inner.graph.streaming_step == Some(current) {
                if let Some(sink) = &tokens {
                    ctx = ctx.with_tokens(sink.clone());
                }
            }

            debug!(thread_id = %thread_id, step = ?current, "running step");
            let outcome = step.run(&state, &mut ctx).await?;

            match outcome {
                StepOutcome::RequestInput { prompt } => {
                    let next = base.advanced(
                        serde_json::to_value(&state)?,
                        ThreadStatus::WaitingForInput {
                            step: serde_json::to_value(current)?,
                            prompt: prompt.clone(),
                        },
                    );
                    self.inner.checkpointer.put(next).await?;
                    debug!(thread_id = %thread_id, step = ?current, "suspended on question");
                    return Ok(RunOutcome::Suspended { prompt });
                }
                StepOutcome::Update(patch) => {
                    state.apply(patch);

                    let edge = self.inner.graph.edges.get(&current).ok_or_else(|| {
                        GraphError::configuration(format!("step {current:?} has no outgoing edge"))
                    })?;

                    match edge {
                        Edge::End => {
                            let done = base
                                .advanced(serde_json::to_value(&state)?, ThreadStatus::Completed);
                            self.inner.checkpointer.put(done).await?;
                            info!(thread_id = %thread_id, "thread completed");
                            return Ok(RunOutcome::Completed(state));
                        }
                        Edge::Next(to) => {
                            let next = base.advanced(
                                serde_json::to_value(&state)?,
                                ThreadStatus::Running {
                                    step: serde_json::to_value(*to)?,
                                },
                            );
                            self.inner.checkpointer.put(next.clone()).await?;
                            base = next;
                            current = *to;
                        }
                        Edge::Branch { router, targets } => {
                            let selected = router(&state);
                            if !targets.contains(&selected)
                                || !self.inner.graph.steps.contains_key(&selected)
                            {
                                let err = GraphError::routing(
                                    format!("{current:?}"),
                                    format!("{selected:?}"),
                                );
                                warn!(thread_id = %thread_id, step = ?current, selected = ?selected,
                                    "router selected undeclared step");
                                let failed = base.advanced(
                                    serde_json::to_value(&state)?,
                                    ThreadStatus::Failed {
                                        error: err.to_string(),
                                    },
                                );
                                self.inner.checkpointer.put(failed).await?;
                                return Err(err);
                            }
                            let next = base.advanced(
                                serde_json::to_value(&state)?,
                                ThreadStatus::Running {
                                    step: serde_json::to_value(selected)?,
                                },
                            );
                            self.inner.checkpointer.put(next.clone()).await?;
                            base = next;
                            debug!(thread_id = %thread_id, step = ?current, selected = ?selected,
                                "conditional edge taken");
                            current = selected;
                        }
                    }
                }
            }
        }
    }
}

fn status_label(status: &ThreadStatus) -> &'static str {
    match status {
        ThreadStatus::Running { .. } => "running",
        ThreadStatus::WaitingForInput { .. } => "waiting_for_input",
        ThreadStatus::Completed => "completed",
        ThreadStatus::Failed { .. } => "failed",
    }
}
