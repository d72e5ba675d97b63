//! History-aware query reformulation

use std::sync::Arc;

use crate::error::{DocchatError, Result};
use crate::generation::GenerationProvider;
use crate::history::ConversationTurn;

/// Fixed instruction for producing a standalone question
pub const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question \
which can be understood without the chat history. Do NOT answer the question, \
just reformulate it if needed and otherwise return it as is.";

/// Explicit two-arm decision resolved before retrieval
///
/// Replaces a runtime "has history?" predicate with a tagged value so the
/// branch is taken exactly once, up front.
#[derive(Debug, Clone)]
pub enum HistoryDecision {
    NoHistory,
    WithHistory(Vec<ConversationTurn>),
}

impl HistoryDecision {
    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        if turns.is_empty() {
            Self::NoHistory
        } else {
            Self::WithHistory(turns)
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        match self {
            Self::NoHistory => &[],
            Self::WithHistory(turns) => turns,
        }
    }

    pub fn into_turns(self) -> Vec<ConversationTurn> {
        match self {
            Self::NoHistory => Vec::new(),
            Self::WithHistory(turns) => turns,
        }
    }
}

/// Rewrites follow-up questions into standalone ones using prior turns
pub struct QueryReformulator {
    generation: Arc<dyn GenerationProvider>,
}

impl QueryReformulator {
    pub fn new(generation: Arc<dyn GenerationProvider>) -> Self {
        Self { generation }
    }

    /// Produce the effective retrieval query
    ///
    /// With no history the message passes through untouched and the
    /// generation capability is never invoked. With history, the rewrite is
    /// returned verbatim (trimmed); a generation failure here propagates as
    /// a pipeline error rather than silently falling back to the raw
    /// message, since skipping the rewrite changes retrieval semantics.
    pub async fn reformulate(&self, message: &str, decision: &HistoryDecision) -> Result<String> {
        match decision {
            HistoryDecision::NoHistory => Ok(message.to_string()),
            HistoryDecision::WithHistory(turns) => {
                let rewritten = self
                    .generation
                    .complete(CONTEXTUALIZE_SYSTEM_PROMPT, turns, message)
                    .await
                    .map_err(DocchatError::Reformulation)?;
                Ok(rewritten.trim().to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        response: String,
    }

    #[async_trait]
    impl GenerationProvider for CountingProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            _history: &[ConversationTurn],
            _input: &str,
        ) -> std::result::Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_no_history_passes_through_without_generation() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            response: "rewritten".to_string(),
        });
        let reformulator = QueryReformulator::new(provider.clone());

        let query = reformulator
            .reformulate("What color are apples?", &HistoryDecision::NoHistory)
            .await
            .unwrap();

        assert_eq!(query, "What color are apples?");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_with_history_returns_trimmed_rewrite() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            response: "  What color are bananas?  ".to_string(),
        });
        let reformulator = QueryReformulator::new(provider.clone());

        let decision = HistoryDecision::from_turns(vec![
            ConversationTurn::user("What color are apples?"),
            ConversationTurn::assistant("Red."),
        ]);
        let query = reformulator
            .reformulate("What about bananas?", &decision)
            .await
            .unwrap();

        assert_eq!(query, "What color are bananas?");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_decision_from_empty_turns() {
        assert!(matches!(
            HistoryDecision::from_turns(Vec::new()),
            HistoryDecision::NoHistory
        ));
        assert!(matches!(
            HistoryDecision::from_turns(vec![ConversationTurn::user("hi")]),
            HistoryDecision::WithHistory(_)
        ));
    }
}
