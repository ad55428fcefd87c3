//! State and step-key traits
//!
//! The engine is generic over two application-supplied types:
//!
//! - [`GraphState`] - the full conversation state plus its patch type. Steps never
//!   mutate state directly; they return a patch and the engine applies it, so every
//!   persisted checkpoint reflects a whole-step transition.
//! - [`StepKey`] - a closed enum of step identifiers. Using an enum instead of
//!   strings lets the builder validate every edge and branch target when the graph
//!   is compiled, and makes an unknown routing target unrepresentable in well-typed
//!   application code.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Conversation state driven through the graph.
///
/// `Patch` is the partial-update type returned by steps. [`apply`](GraphState::apply)
/// defines the merge; field-level semantics (overwrite vs. logical-OR) belong to the
/// implementor.
pub trait GraphState:
    Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Partial update produced by a step.
    type Patch: Debug + Send + 'static;

    /// Merge a patch into this state.
    fn apply(&mut self, patch: Self::Patch);
}

/// Identifier type for graph steps.
///
/// Implemented automatically for any closed enum that derives the listed traits;
/// serde bounds exist so a pending step can be stored in a checkpoint and re-entered
/// on resume.
pub trait StepKey:
    Copy + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

impl<T> StepKey for T where
    T: Copy + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}
