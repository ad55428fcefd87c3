//! The dialogue steps
//!
//! Four interview steps (mood, media type, genres, and the one-shot nostalgic
//! fallback), the watch-history search, the availability tool loop, and the final
//! streamed recommendation. Each step follows the interrupt protocol: no resume
//! answer means ask the question; a resume answer means parse it into a patch.

mod availability;
mod interview;
mod recommend;
mod search;

pub use availability::CheckAvailability;
pub use interview::{AskGenres, AskMediaType, AskMood, AskNostalgic};
pub use recommend::Recommend;
pub use search::SearchLibrary;
