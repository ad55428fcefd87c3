//! Graph construction and validation
//!
//! This module provides **[`GraphBuilder`]** - the fluent API for wiring steps into
//! a dialogue graph - and the internal edge table the engine executes.
//!
//! # Overview
//!
//! A graph is a set of steps keyed by a closed enum, one outgoing edge per step
//! (direct, conditional, or end), a single entry step, and optionally one step
//! designated for token streaming.
//!
//! # Construction-Time Validation
//!
//! `compile` rejects a malformed graph before any thread can run:
//!
//! - entry step missing or unregistered
//! - a step with no outgoing edge
//! - a direct edge pointing at an unregistered step
//! - a conditional edge declaring an unregistered target, or none at all
//! - a streaming designation naming an unregistered step
//!
//! All violations are [`GraphError::Configuration`]. Because step keys are a closed
//! enum, the remaining runtime hazard is a conditional router selecting a key that
//! was never declared as a target; that surfaces as [`GraphError::Routing`] during
//! execution.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use watchgraph_core::{GraphBuilder, GraphEngine};
//!
//! let engine = GraphBuilder::new()
//!     .add_step(StepId::AskMood, AskMood)
//!     .add_step(StepId::Recommend, Recommend::new(model.clone()))
//!     .set_entry(StepId::AskMood)
//!     .add_edge(StepId::AskMood, StepId::Recommend)
//!     .finish_at(StepId::Recommend)
//!     .stream_tokens_from(StepId::Recommend)
//!     .compile(checkpointer)?;
//! ```
//!
//! # See Also
//!
//! - [`GraphEngine`](crate::engine::GraphEngine) - Executes the compiled graph
//! - [`Step`](crate::interrupt::Step) - The unit of work being wired

use std::collections::HashMap;
use std::sync::Arc;

use watchgraph_checkpoint::CheckpointSaver;

use crate::engine::GraphEngine;
use crate::error::{GraphError, Result};
use crate::interrupt::Step;
use crate::state::{GraphState, StepKey};

/// Router function for a conditional edge.
pub type Router<S, N> = Arc<dyn Fn(&S) -> N + Send + Sync>;

/// Outgoing edge of a step.
pub(crate) enum Edge<S: GraphState, N: StepKey> {
    /// Unconditional transition.
    Next(N),
    /// Terminal: the run completes after this step.
    End,
    /// State-dependent transition among declared targets.
    Branch {
        router: Router<S, N>,
        targets: Vec<N>,
    },
}

/// Compiled, validated graph structure.
pub(crate) struct Graph<S: GraphState, N: StepKey> {
    pub(crate) steps: HashMap<N, Arc<dyn Step<S>>>,
    pub(crate) edges: HashMap<N, Edge<S, N>>,
    pub(crate) entry: N,
    pub(crate) streaming_step: Option<N>,
}

/// Fluent builder for dialogue graphs.
pub struct GraphBuilder<S: GraphState, N: StepKey> {
    steps: HashMap<N, Arc<dyn Step<S>>>,
    edges: HashMap<N, Edge<S, N>>,
    entry: Option<N>,
    streaming_step: Option<N>,
}

impl<S: GraphState, N: StepKey> GraphBuilder<S, N> {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            streaming_step: None,
        }
    }

    /// Register a step under its key
    pub fn add_step(mut self, key: N, step: impl Step<S> + 'static) -> Self {
        self.steps.insert(key, Arc::new(step));
        self
    }

    /// Add an unconditional edge
    pub fn add_edge(mut self, from: N, to: N) -> Self {
        self.edges.insert(from, Edge::Next(to));
        self
    }

    /// Add a conditional edge with its declared targets
    pub fn add_branch(
        mut self,
        from: N,
        router: impl Fn(&S) -> N + Send + Sync + 'static,
        targets: Vec<N>,
    ) -> Self {
        self.edges.insert(
            from,
            Edge::Branch {
                router: Arc::new(router),
                targets,
            },
        );
        self
    }

    /// Mark a step as terminal
    pub fn finish_at(mut self, step: N) -> Self {
        self.edges.insert(step, Edge::End);
        self
    }

    /// Set the entry step
    pub fn set_entry(mut self, step: N) -> Self {
        self.entry = Some(step);
        self
    }

    /// Designate the one step whose output is token-streamed
    pub fn stream_tokens_from(mut self, step: N) -> Self {
        self.streaming_step = Some(step);
        self
    }

    /// Validate the wiring and produce an engine bound to the checkpointer.
    pub fn compile(self, checkpointer: Arc<dyn CheckpointSaver>) -> Result<GraphEngine<S, N>> {
        let entry = self
            .entry
            .ok_or_else(|| GraphError::configuration("no entry step set"))?;

        if !self.steps.contains_key(&entry) {
            return Err(GraphError::configuration(format!(
                "entry step {entry:?} is not registered"
            )));
        }

        for key in self.steps.keys() {
            match self.edges.get(key) {
                None => {
                    return Err(GraphError::configuration(format!(
                        "step {key:?} has no outgoing edge"
                    )));
                }
                Some(Edge::Next(to)) => {
                    if !self.steps.contains_key(to) {
                        return Err(GraphError::configuration(format!(
                            "edge {key:?} -> {to:?} points at an unregistered step"
                        )));
                    }
                }
                Some(Edge::Branch { targets, .. }) => {
                    if targets.is_empty() {
                        return Err(GraphError::configuration(format!(
                            "conditional edge at {key:?} declares no targets"
                        )));
                    }
                    for target in targets {
                        if !self.steps.contains_key(target) {
                            return Err(GraphError::configuration(format!(
                                "conditional edge at {key:?} declares unregistered target {target:?}"
                            )));
                        }
                    }
                }
                Some(Edge::End) => {}
            }
        }

        for from in self.edges.keys() {
            if !self.steps.contains_key(from) {
                return Err(GraphError::configuration(format!(
                    "edge from unregistered step {from:?}"
                )));
            }
        }

        if let Some(step) = &self.streaming_step {
            if !self.steps.contains_key(step) {
                return Err(GraphError::configuration(format!(
                    "streaming step {step:?} is not registered"
                )));
            }
        }

        Ok(GraphEngine::new(
            Graph {
                steps: self.steps,
                edges: self.edges,
                entry,
                streaming_step: self.streaming_step,
            },
            checkpointer,
        ))
    }
}

impl<S: GraphState, N: StepKey> Default for GraphBuilder<S, N> {
    fn default() -> Self {
        Self::new()
    }
}
