//! Conversational session pipeline
//!
//! Orchestrates one invocation end to end: read history, resolve the
//! reformulation decision, retrieve and fuse, assemble the grounding
//! context, generate, persist the exchange, and deliver the answer either
//! one-shot or as an ordered event stream.

mod context;
mod reformulate;
mod protocol;

pub use context::{assemble_context, source_from_chunk, PREVIEW_MAX_CHARS};
pub use protocol::{ChatEvent, ChatRequest, ChatResponse, Source};
pub use reformulate::{HistoryDecision, QueryReformulator, CONTEXTUALIZE_SYSTEM_PROMPT};

use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::generation::GenerationProvider;
use crate::history::{session_key, ConversationTurn, HistoryStore};
use crate::retrieval::HybridRetriever;

/// Fixed instruction for grounded answering; the assembled context is
/// appended below it.
pub const QA_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.";

/// Streamed event channel depth
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Everything resolved before the generation call
struct Prepared {
    session_key: String,
    history: Vec<ConversationTurn>,
    effective_query: String,
    system_prompt: String,
}

/// The conversational grounding pipeline
///
/// The retriever is an atomically swappable snapshot: queries clone the
/// `Arc` under a read lock, a corpus rebuild replaces it under the write
/// lock. In-flight queries keep whichever snapshot they started with and
/// never observe a partially built index.
pub struct ChatEngine {
    retriever: RwLock<Arc<HybridRetriever>>,
    reformulator: QueryReformulator,
    generation: Arc<dyn GenerationProvider>,
    history: Arc<dyn HistoryStore>,
}

impl ChatEngine {
    pub fn new(
        retriever: HybridRetriever,
        generation: Arc<dyn GenerationProvider>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            retriever: RwLock::new(Arc::new(retriever)),
            reformulator: QueryReformulator::new(Arc::clone(&generation)),
            generation,
            history,
        }
    }

    /// Swap in a freshly built retriever after a corpus rebuild
    pub fn swap_retriever(&self, retriever: HybridRetriever) {
        let mut guard = self.retriever.write().unwrap();
        *guard = Arc::new(retriever);
        tracing::info!("Retriever snapshot swapped");
    }

    fn retriever_snapshot(&self) -> Arc<HybridRetriever> {
        Arc::clone(&self.retriever.read().unwrap())
    }

    /// Read session history, degrading to an empty (fresh) conversation on
    /// store read failure.
    async fn read_history(&self, session_key: &str) -> Vec<ConversationTurn> {
        match self.history.read(session_key).await {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(
                    "History read failed for {}, treating as fresh conversation: {}",
                    session_key,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Shared front half of both delivery modes: history, reformulation,
    /// retrieval, fusion, and context assembly.
    async fn prepare(&self, user_id: &str, request: &ChatRequest) -> Result<Prepared> {
        let session_key = session_key(user_id, &request.conversation_id);

        let turns = self.read_history(&session_key).await;
        let decision = HistoryDecision::from_turns(turns);

        let effective_query = self
            .reformulator
            .reformulate(&request.message, &decision)
            .await?;

        let retriever = self.retriever_snapshot();
        let fused = retriever.retrieve_chunks(&effective_query);
        let context = assemble_context(&fused);

        tracing::debug!(
            "Prepared invocation: session={}, {} context chunks",
            session_key,
            fused.len()
        );

        Ok(Prepared {
            session_key,
            history: decision.into_turns(),
            effective_query,
            system_prompt: format!("{}\n\n{}", QA_SYSTEM_PROMPT, context),
        })
    }

    /// Sources shown to the caller are re-retrieved against the original,
    /// non-reformulated message. The answer is grounded on the reformulated
    /// query; this asymmetry is deliberate and preserved.
    fn sources_for(&self, original_message: &str) -> Vec<Source> {
        let retriever = self.retriever_snapshot();
        retriever
            .retrieve(original_message)
            .iter()
            .map(|fused| source_from_chunk(&fused.chunk))
            .collect()
    }

    /// Append the user turn then the assistant turn, exactly once, only
    /// after generation fully completed (never leaves an orphaned
    /// user-only turn on failure).
    async fn persist_exchange(
        &self,
        session_key: &str,
        user_message: &str,
        answer: &str,
    ) -> Result<()> {
        self.history
            .append(session_key, ConversationTurn::user(user_message))
            .await?;
        self.history
            .append(session_key, ConversationTurn::assistant(answer))
            .await?;
        Ok(())
    }

    /// One-shot invocation: run the pipeline to completion and return the
    /// answer plus cited sources.
    pub async fn chat(&self, user_id: &str, request: &ChatRequest) -> Result<ChatResponse> {
        let prepared = self.prepare(user_id, request).await?;

        let answer = self
            .generation
            .complete(
                &prepared.system_prompt,
                &prepared.history,
                &prepared.effective_query,
            )
            .await?;

        let sources = self.sources_for(&request.message);

        // A write failure surfaces here: the one-shot caller would otherwise
        // silently lose persistence.
        self.persist_exchange(&prepared.session_key, &request.message, &answer)
            .await?;

        Ok(ChatResponse { answer, sources })
    }

    /// Streaming invocation: events arrive in order as zero or more
    /// `Token`, one `Sources`, then a terminal `Done`; any failure before
    /// `Done` ends the stream with a terminal `Error` instead.
    pub fn chat_stream(self: Arc<Self>, user_id: &str, request: ChatRequest) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            self.run_stream(&user_id, request, tx).await;
        });

        rx
    }

    async fn run_stream(&self, user_id: &str, request: ChatRequest, tx: mpsc::Sender<ChatEvent>) {
        let prepared = match self.prepare(user_id, &request).await {
            Ok(prepared) => prepared,
            Err(e) => {
                let _ = tx
                    .send(ChatEvent::Error {
                        detail: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        let mut answer = String::new();
        let mut streamed_any = false;
        let mut mid_stream_failure = None;

        match self
            .generation
            .complete_streaming(
                &prepared.system_prompt,
                &prepared.history,
                &prepared.effective_query,
            )
            .await
        {
            Ok(mut fragments) => {
                while let Some(item) = fragments.recv().await {
                    match item {
                        Ok(fragment) => {
                            streamed_any = true;
                            answer.push_str(&fragment);
                            if tx.send(ChatEvent::Token { t: fragment }).await.is_err() {
                                // Caller disconnected; stop producing.
                                return;
                            }
                        }
                        Err(e) if !streamed_any => {
                            // Nothing delivered yet: eligible for one-shot
                            // fallback below.
                            tracing::warn!(
                                "Streaming generation failed before any fragment: {}",
                                e
                            );
                            break;
                        }
                        Err(e) => {
                            mid_stream_failure = Some(e);
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!("Streaming channel unavailable, falling back to one-shot: {}", e);
            }
        }

        if let Some(e) = mid_stream_failure {
            let _ = tx
                .send(ChatEvent::Error {
                    detail: e.to_string(),
                })
                .await;
            return;
        }

        if !streamed_any {
            // Fallback: one-shot generation delivered as a single token
            // event, preserving the event contract.
            match self
                .generation
                .complete(
                    &prepared.system_prompt,
                    &prepared.history,
                    &prepared.effective_query,
                )
                .await
            {
                Ok(full_answer) => {
                    answer = full_answer.clone();
                    if tx.send(ChatEvent::Token { t: full_answer }).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    let _ = tx
                        .send(ChatEvent::Error {
                            detail: e.to_string(),
                        })
                        .await;
                    return;
                }
            }
        }

        let sources = self.sources_for(&request.message);
        if tx.send(ChatEvent::Sources { sources }).await.is_err() {
            return;
        }

        // The event stream already delivered the answer; a lost write is
        // logged as acceptable loss rather than failing the stream.
        if let Err(e) = self
            .persist_exchange(&prepared.session_key, &request.message, &answer)
            .await
        {
            tracing::warn!(
                "Failed to persist exchange for {}: {}",
                prepared.session_key,
                e
            );
        }

        let _ = tx.send(ChatEvent::Done).await;
    }
}
