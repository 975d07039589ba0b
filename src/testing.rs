//! Fake collaborators shared by unit tests.

use crate::document::{Document, DocumentSource, SourceMetadata};
use crate::embedding::Embedder;
use crate::error::{RagbookError, Result};
use crate::generation::{ChatMessage, Generator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Embeds text as its a–z letter histogram.
#[derive(Default)]
pub struct LetterEmbedder {
    calls: AtomicUsize,
    fail: bool,
}

impl LetterEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; 26];
        for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
            v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagbookError::Embedding("quota exceeded".to_string()));
        }
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagbookError::Embedding("quota exceeded".to_string()));
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        26
    }
}

/// Records every conversation it is sent and answers from a fixed reply function.
pub struct RecordingGenerator {
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    reply: Box<dyn Fn(&[ChatMessage]) -> Result<String> + Send + Sync>,
}

impl RecordingGenerator {
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::with(move |_| Ok(text.clone()))
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::with(move |_| Err(RagbookError::Generation(message.clone())))
    }

    pub fn with<F>(reply: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        (self.reply)(messages)
    }
}

/// Serves fixed documents and counts loads.
pub struct StaticSource {
    documents: Vec<Document>,
    loads: AtomicUsize,
}

impl StaticSource {
    pub fn new(pages: &[&str]) -> Self {
        let documents = pages
            .iter()
            .enumerate()
            .map(|(i, text)| Document::new(*text, SourceMetadata::new("book.pdf", Some(i as u32 + 1))))
            .collect();
        Self {
            documents,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn load(&self) -> Result<Vec<Document>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.documents.clone())
    }
}
