//! Policy QA tool — retrieval-augmented answers about the HR policies.
//!
//! Pure query tool: searches the policy index for the most relevant
//! snippets, then asks the model to answer from them. No side effects, so
//! repeated dispatches with the same input are idempotent (modulo model
//! sampling at low temperature).

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;

use maria_core::types::Message;
use maria_integrations::Retriever;
use maria_providers::ChatModel;

use super::base::Tool;

/// Snippets fetched per question.
const SNIPPETS_PER_QUERY: usize = 5;

/// Answers HR-policy questions from the policy document.
pub struct PolicyQaTool {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn ChatModel>,
}

impl PolicyQaTool {
    pub fn new(retriever: Arc<dyn Retriever>, model: Arc<dyn ChatModel>) -> Self {
        Self { retriever, model }
    }
}

#[async_trait]
impl Tool for PolicyQaTool {
    fn name(&self) -> &str {
        "HR_policy_QA_tool"
    }

    fn description(&self) -> &str {
        "useful to answer questions about the HR policies. The input to this tool is a string with the question."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let question = input.trim();
        if question.is_empty() {
            return Ok("The input is empty; expected a question about the HR policies".to_string());
        }

        let snippets = self
            .retriever
            .search(question, SNIPPETS_PER_QUERY)
            .await
            .context("policy search failed")?;

        let prompt = format!(
            "You are a helpful question-answering assistant. You are asked the following \
             question:\n\n\"{question}\"\n\nYou have to answer the question. You can use the \
             following information:\n\n{context}\n\nBe concise. Answer:",
            context = snippets.join("\n\n"),
        );

        let answer = self
            .model
            .complete(&[Message::user(prompt)], &[])
            .await
            .context("policy answer generation failed")?;

        Ok(format!("\n{answer}\n"))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use maria_providers::LlmError;
    use std::sync::Mutex;

    /// Retriever that records queries and returns canned snippets.
    struct FakeRetriever {
        queries: Mutex<Vec<String>>,
        snippets: Vec<String>,
    }

    #[async_trait]
    impl Retriever for FakeRetriever {
        async fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<String>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.snippets.iter().take(k).cloned().collect())
        }
    }

    /// Chat model that echoes back a canned answer and records the prompt.
    struct FakeModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for FakeModel {
        async fn complete(
            &self,
            messages: &[Message],
            _stop: &[String],
        ) -> Result<String, LlmError> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages.last().unwrap().content.clone());
            Ok("Employees get 25 days of vacation per year.".to_string())
        }

        fn model_name(&self) -> &str {
            "fake-model"
        }
    }

    fn make_tool() -> (Arc<FakeRetriever>, Arc<FakeModel>, PolicyQaTool) {
        let retriever = Arc::new(FakeRetriever {
            queries: Mutex::new(Vec::new()),
            snippets: vec![
                "Holiday policy: 25 days per year.".to_string(),
                "Probation: three months.".to_string(),
            ],
        });
        let model = Arc::new(FakeModel {
            prompts: Mutex::new(Vec::new()),
        });
        let tool = PolicyQaTool::new(retriever.clone(), model.clone());
        (retriever, model, tool)
    }

    #[tokio::test]
    async fn searches_with_the_user_question() {
        let (retriever, _model, tool) = make_tool();
        tool.execute("what is the holiday policy?").await.unwrap();

        let queries = retriever.queries.lock().unwrap();
        assert_eq!(queries.as_slice(), ["what is the holiday policy?"]);
    }

    #[tokio::test]
    async fn prompt_includes_snippets_and_question() {
        let (_retriever, model, tool) = make_tool();
        tool.execute("what is the holiday policy?").await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("what is the holiday policy?"));
        assert!(prompts[0].contains("Holiday policy: 25 days per year."));
        assert!(prompts[0].contains("Probation: three months."));
    }

    #[tokio::test]
    async fn answer_becomes_observation() {
        let (_retriever, _model, tool) = make_tool();
        let observation = tool.execute("holidays?").await.unwrap();
        assert!(observation.contains("25 days of vacation"));
    }

    #[tokio::test]
    async fn empty_question_is_observation() {
        let (retriever, _model, tool) = make_tool();
        let observation = tool.execute("   ").await.unwrap();
        assert!(observation.contains("empty"));
        assert!(retriever.queries.lock().unwrap().is_empty());
    }
}
