//! RAG query pipeline.

use super::context::{assemble_context, ContextBuilder};
use crate::config::{Prompts, RetrievalSettings};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::Generator;
use crate::vector_store::{SearchResult, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers queries from retrieved passages.
pub struct QueryPipeline {
    context_builder: ContextBuilder,
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl QueryPipeline {
    /// Create a new query pipeline.
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        retrieval: &RetrievalSettings,
    ) -> Self {
        let context_builder = ContextBuilder::new(index, embedder)
            .with_k(retrieval.k)
            .with_score_threshold(retrieval.score_threshold);

        Self {
            context_builder,
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Retrieve passages without generating an answer.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.context_builder.retrieve(query).await
    }

    /// Answer a query.
    ///
    /// An empty retrieval still calls the model, with an empty context.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn ask(&self, query: &str) -> Result<QueryAnswer> {
        let sources = self.context_builder.retrieve(query).await?;
        info!("Answering with {} passages", sources.len());

        let context = assemble_context(&sources);
        let user_message = self.prompts.fill(
            &self.prompts.rag.user,
            &[("query", query), ("context", context.as_str())],
        );

        let answer = self
            .generator
            .generate(&self.prompts.rag.system, &user_message)
            .await?;

        debug!("Generated answer of {} characters", answer.len());
        Ok(QueryAnswer { answer, sources })
    }
}

/// A generated answer with the passages it was conditioned on.
#[derive(Debug, Clone)]
pub struct QueryAnswer {
    /// The generated answer.
    pub answer: String,
    /// Retrieved passages, best first.
    pub sources: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagbookError;
    use crate::generation::Role;
    use crate::ingest::IngestPipeline;
    use crate::chunking::ChunkingConfig;
    use crate::document::SourceMetadata;
    use crate::testing::{LetterEmbedder, RecordingGenerator, StaticSource};
    use crate::vector_store::{MemoryVectorIndex, VectorRecord};

    fn retrieval(k: usize, score_threshold: f32) -> RetrievalSettings {
        RetrievalSettings { k, score_threshold }
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_calls() {
        let embedder = Arc::new(LetterEmbedder::new());
        let generator = Arc::new(RecordingGenerator::replying("unused"));
        let pipeline = QueryPipeline::new(
            Arc::new(MemoryVectorIndex::new()),
            embedder.clone(),
            generator.clone(),
            &retrieval(10, 0.5),
        );

        for query in ["", "   \n"] {
            let err = pipeline.ask(query).await.unwrap_err();
            assert!(matches!(err, RagbookError::InvalidParameter(_)));
        }
        assert_eq!(embedder.calls(), 0);
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_threshold_above_best_score_gives_empty_context() {
        let index = Arc::new(MemoryVectorIndex::new());
        // cos([1,0], [0.9, sqrt(0.19)]) = 0.9
        let record = VectorRecord::new(
            vec![0.9, (0.19f32).sqrt()],
            "nearly relevant".to_string(),
            SourceMetadata::new("guide.pdf", Some(1)),
            0,
        );
        index.insert(&[record]).await.unwrap();

        let direct = index.search(&[1.0, 0.0], 10, 0.95).await.unwrap();
        assert!(direct.is_empty());

        let generator = Arc::new(RecordingGenerator::replying("no context answer"));
        let pipeline = QueryPipeline::new(
            index,
            Arc::new(LetterEmbedder::new()),
            generator.clone(),
            &retrieval(10, 0.95),
        );

        let answer = pipeline.ask("zzz").await.unwrap();
        assert!(answer.sources.is_empty());
        assert_eq!(answer.answer, "no context answer");

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0][1].content.contains("nearly relevant"));
    }

    #[tokio::test]
    async fn test_prompt_contains_query_and_ranked_context() {
        let index = Arc::new(MemoryVectorIndex::new());
        let embedder = Arc::new(LetterEmbedder::new());
        let mut ingest = IngestPipeline::new(
            Arc::new(StaticSource::new(&["aaaa", "aabb", "zzzz"])),
            embedder.clone(),
            index.clone(),
            ChunkingConfig { chunk_size: 4, overlap: 0 },
        )
        .unwrap();
        ingest.run(false).await.unwrap();

        let generator = Arc::new(RecordingGenerator::replying("use two pointers"));
        let pipeline = QueryPipeline::new(index, embedder, generator.clone(), &retrieval(2, 0.5));

        let answer = pipeline.ask("aaa").await.unwrap();
        assert_eq!(answer.answer, "use two pointers");
        let passages: Vec<&str> = answer.sources.iter().map(|s| s.record.passage.as_str()).collect();
        assert_eq!(passages, vec!["aaaa", "aabb"]);

        let calls = generator.calls();
        let messages = &calls[0];
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, Prompts::default().rag.system);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("aaa"));
        assert!(messages[1].content.contains("aaaa\n\naabb"));
        assert!(!messages[1].content.contains("zzzz"));
    }

    #[tokio::test]
    async fn test_passage_placeholders_reach_model_verbatim() {
        let index = Arc::new(MemoryVectorIndex::new());
        let passage = "template literal {{query}} appears in the book";
        let record = VectorRecord::new(
            LetterEmbedder::vector("abc"),
            passage.to_string(),
            SourceMetadata::new("guide.pdf", Some(3)),
            0,
        );
        index.insert(&[record]).await.unwrap();

        let generator = Arc::new(RecordingGenerator::replying("ok"));
        let pipeline = QueryPipeline::new(
            index,
            Arc::new(LetterEmbedder::new()),
            generator.clone(),
            &retrieval(5, 0.0),
        );

        for _ in 0..16 {
            pipeline.ask("abc").await.unwrap();
        }
        for call in generator.calls() {
            assert!(call[1].content.contains(passage));
        }
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces_message() {
        let generator = Arc::new(RecordingGenerator::failing("model overloaded"));
        let pipeline = QueryPipeline::new(
            Arc::new(MemoryVectorIndex::new()),
            Arc::new(LetterEmbedder::new()),
            generator,
            &retrieval(3, 0.0),
        );

        match pipeline.ask("what is a fenwick tree").await {
            Err(RagbookError::Generation(message)) => assert_eq!(message, "model overloaded"),
            other => panic!("unexpected result: {:?}", other.map(|a| a.answer)),
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let generator = Arc::new(RecordingGenerator::replying("unused"));
        let pipeline = QueryPipeline::new(
            Arc::new(MemoryVectorIndex::new()),
            Arc::new(LetterEmbedder::failing()),
            generator.clone(),
            &retrieval(3, 0.0),
        );

        let err = pipeline.ask("heaps").await.unwrap_err();
        assert!(matches!(err, RagbookError::Embedding(_)));
        assert!(generator.calls().is_empty());
    }
}
