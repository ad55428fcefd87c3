//! Terminal walkthrough of the recommendation dialogue.
//!
//! Runs the full interview loop against fixture collaborators (a tiny canned
//! watch history, a two-title catalog, and an offline model), so the flow can be
//! tried without any API keys:
//!
//! ```text
//! cargo run -p watchgraph-agent --example terminal_chat
//! ```

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;

use watchgraph_agent::{
    CatalogEntry, CatalogProvider, MediaMatch, ProviderResult, Recommender, RecommenderConfig,
    SearchProvider, TurnReply,
};
use watchgraph_checkpoint::InMemoryCheckpointSaver;
use watchgraph_core::{ChatModel, ChatRequest, ChatResponse, Message, TokenStream};

struct DemoSearch;

#[async_trait]
impl SearchProvider for DemoSearch {
    async fn search(&self, _query: &str, limit: usize) -> ProviderResult<Vec<MediaMatch>> {
        let history = vec![
            MediaMatch {
                title: "Fleabag".to_string(),
                media_type: "series".to_string(),
                user_rating: Some(9),
                user_review: "Sharp and devastating.".to_string(),
                partner_review: "Favourite show ever.".to_string(),
            },
            MediaMatch {
                title: "Arrival".to_string(),
                media_type: "movie".to_string(),
                user_rating: Some(8),
                user_review: "Quiet, huge ideas.".to_string(),
                partner_review: "Cried twice.".to_string(),
            },
        ];
        Ok(history.into_iter().take(limit).collect())
    }
}

struct DemoCatalog;

#[async_trait]
impl CatalogProvider for DemoCatalog {
    async fn find_title(&self, name: &str) -> ProviderResult<Vec<CatalogEntry>> {
        let known = [("Fleabag", "series"), ("Arrival", "movie")];
        Ok(known
            .iter()
            .filter(|(title, _)| *title == name)
            .enumerate()
            .map(|(i, (title, media_type))| CatalogEntry {
                id: i as i64 + 1,
                title: title.to_string(),
                media_type: media_type.to_string(),
            })
            .collect())
    }

    async fn availability(
        &self,
        _id: i64,
        _media_type: &str,
    ) -> ProviderResult<HashMap<String, Vec<String>>> {
        Ok(HashMap::from([(
            "RO".to_string(),
            vec!["Prime Video".to_string()],
        )]))
    }
}

/// Offline stand-in for a real provider; answers without tools and recommends a
/// fixed title.
struct DemoModel;

#[async_trait]
impl ChatModel for DemoModel {
    async fn chat(&self, _request: ChatRequest) -> watchgraph_core::Result<ChatResponse> {
        Ok(ChatResponse::new(Message::assistant(
            "## Severance\n\nIt has the slow-burn strangeness you loved in Arrival \
             and the bite of Fleabag's writing, and you can binge it together tonight.\n\n\
             ### Available on: `Prime Video`",
        )))
    }

    async fn stream(&self, request: ChatRequest) -> watchgraph_core::Result<TokenStream> {
        let text = self.chat(request).await?.message.content;
        let words: Vec<watchgraph_core::Result<String>> = text
            .split_inclusive(' ')
            .map(|w| Ok(w.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(words)))
    }
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}\n> ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recommender = Recommender::new(
        Arc::new(DemoModel),
        Arc::new(DemoSearch),
        Arc::new(DemoCatalog),
        Arc::new(InMemoryCheckpointSaver::new()),
        RecommenderConfig::from_env(),
    )?;

    let opened = recommender.start().await?;
    let mut pending = match opened.reply {
        TurnReply::Question(q) => q,
        TurnReply::Recommendation(text) => {
            println!("{text}");
            return Ok(());
        }
    };

    loop {
        let answer = read_line(&pending)?;
        match recommender.reply(&opened.thread_id, answer).await? {
            TurnReply::Question(q) => pending = q,
            TurnReply::Recommendation(text) => {
                println!("\n{text}");
                return Ok(());
            }
        }
    }
}
