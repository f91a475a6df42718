//! Mock search source for testing purposes.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::Paper;
use crate::upstream::{ScholarError, SearchSource};

/// A mock source that plays back scripted page responses in order.
///
/// Once the script runs out it keeps returning empty pages. Every call is
/// recorded so tests can assert on the query and offset used.
#[derive(Debug, Default)]
pub struct MockSource {
    pages: Mutex<VecDeque<Result<Vec<Paper>, ScholarError>>>,
    calls: Mutex<Vec<(String, usize, usize)>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page of papers.
    pub fn push_page(&self, papers: Vec<Paper>) {
        self.pages.lock().unwrap().push_back(Ok(papers));
    }

    /// Queue an error response.
    pub fn push_error(&self, err: ScholarError) {
        self.pages.lock().unwrap().push_back(Err(err));
    }

    /// The `(query, limit, offset)` of every search call so far.
    pub fn calls(&self) -> Vec<(String, usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchSource for MockSource {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Paper>, ScholarError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), limit, offset));
        match self.pages.lock().unwrap().pop_front() {
            Some(page) => page,
            None => Ok(Vec::new()),
        }
    }
}

/// Helper to create a paper with an id and title for tests.
pub fn make_paper(paper_id: &str, title: &str) -> Paper {
    let mut paper = Paper::new(paper_id);
    paper
        .fields
        .insert("title".to_string(), serde_json::Value::from(title));
    paper
}
