//! Fallback feed engine: lazily paginates the upstream search stream and
//! serves papers the caller has not seen before.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use crate::models::Paper;
use crate::upstream::{ScholarError, SearchSource};

/// Seed topics used to pick the startup default query
pub const SEED_QUERIES: [&str; 10] = [
    "Asymptomatic infection of COVID-19",
    "Single-cell RNA sequencing",
    "Protein-protein interactions",
    "CRISPR gene editing",
    "Deep learning in healthcare",
    "Microbiome diversity and health",
    "Cancer immunotherapy targets",
    "Neuroscience of memory",
    "Antibiotic resistance mechanisms",
    "Climate change and species migration",
];

/// Tuning knobs for the fallback feed
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Papers fetched per upstream page
    pub page_size: usize,
    /// Upper bound on page fetches within one `next_paper` call, so an
    /// upstream returning endless all-duplicate pages cannot spin forever
    pub max_pages_per_call: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_pages_per_call: 50,
        }
    }
}

/// Stateful engine producing an ever-advancing stream of unseen papers.
///
/// Holds the pagination cursor (page number, fetched buffer, consume index)
/// and the seen-set of every identifier already handed out since the last
/// [`reset`](Self::reset). Callers are expected to serialize access; the
/// gateway wraps the engine in a `tokio::sync::Mutex` held across each full
/// fetch-check-insert step.
#[derive(Debug)]
pub struct FallbackFeed {
    source: Arc<dyn SearchSource>,
    default_query: String,
    options: FeedOptions,
    cache: Vec<Paper>,
    index: usize,
    page: usize,
    seen: HashSet<String>,
}

impl FallbackFeed {
    /// Create an engine with a default query picked uniformly at random from
    /// [`SEED_QUERIES`].
    pub fn new(source: Arc<dyn SearchSource>, options: FeedOptions) -> Self {
        let seed = SEED_QUERIES[rand::rng().random_range(0..SEED_QUERIES.len())];
        Self::with_default_query(source, options, seed)
    }

    /// Create an engine with an explicit default query.
    pub fn with_default_query(
        source: Arc<dyn SearchSource>,
        options: FeedOptions,
        default_query: impl Into<String>,
    ) -> Self {
        Self {
            source,
            default_query: default_query.into(),
            options,
            cache: Vec::new(),
            index: 0,
            page: 0,
            seen: HashSet::new(),
        }
    }

    /// Produce the next paper not yet seen by any caller.
    ///
    /// Refills the buffer from the next upstream page whenever it is
    /// exhausted, then scans forward past already-seen identifiers. The page
    /// number advances on every fetch regardless of outcome; a failed or
    /// empty fetch ends the call with `NoFallbackAvailable` rather than
    /// retrying.
    pub async fn next_paper(&mut self, query: Option<&str>) -> Result<Paper, ScholarError> {
        let effective_query = match query {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => self.default_query.clone(),
        };

        let mut fetches = 0;
        loop {
            if self.index >= self.cache.len() {
                if fetches >= self.options.max_pages_per_call {
                    warn!(
                        fetches,
                        "page fetch cap reached without an unseen paper, giving up"
                    );
                    return Err(ScholarError::NoFallbackAvailable);
                }

                let offset = self.page * self.options.page_size;
                debug!(page = self.page, offset, query = %effective_query, "fetching fallback page");
                let fetched = self
                    .source
                    .search(&effective_query, self.options.page_size, offset)
                    .await;

                // The page number advances regardless of outcome
                self.page += 1;
                self.index = 0;
                fetches += 1;

                match fetched {
                    Ok(papers) if !papers.is_empty() => self.cache = papers,
                    Ok(_) => {
                        self.cache = Vec::new();
                        return Err(ScholarError::NoFallbackAvailable);
                    }
                    Err(err) => {
                        warn!(%err, "fallback page fetch failed");
                        self.cache = Vec::new();
                        return Err(ScholarError::NoFallbackAvailable);
                    }
                }
            }

            while self.index < self.cache.len() {
                let paper = self.cache[self.index].clone();
                self.index += 1;

                if self.seen.insert(paper.paper_id.clone()) {
                    return Ok(paper);
                }
            }
            // Buffer exhausted mid-scan with only seen papers; fetch the next page
        }
    }

    /// Collect up to `limit` papers, stopping short on the first error.
    ///
    /// Partial (possibly empty) batches are acceptable and never retried
    /// within the same call.
    pub async fn next_batch(&mut self, limit: usize, query: Option<&str>) -> Vec<Paper> {
        let mut batch = Vec::new();
        while batch.len() < limit {
            match self.next_paper(query).await {
                Ok(paper) => batch.push(paper),
                Err(err) => {
                    warn!(%err, collected = batch.len(), "fallback batch cut short");
                    break;
                }
            }
        }
        batch
    }

    /// Clear the seen-set, buffer, index, and page number. Idempotent.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.index = 0;
        self.page = 0;
        self.seen.clear();
    }

    /// Current page number (number of fetches since the last reset)
    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of identifiers handed out since the last reset
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::mock::{make_paper, MockSource};

    fn engine(source: Arc<MockSource>) -> FallbackFeed {
        FallbackFeed::with_default_query(source, FeedOptions::default(), "CRISPR gene editing")
    }

    #[tokio::test]
    async fn test_empty_upstream_yields_no_fallback() {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![]);
        let mut feed = engine(source);

        let err = feed.next_paper(None).await.unwrap_err();
        assert!(matches!(err, ScholarError::NoFallbackAvailable));
        // The page number advances even when the fetch yields nothing
        assert_eq!(feed.page(), 1);
    }

    #[tokio::test]
    async fn test_partial_page_drains_in_order_then_fetches_next() {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![
            make_paper("p1", "one"),
            make_paper("p2", "two"),
            make_paper("p3", "three"),
        ]);
        let mut feed = engine(Arc::clone(&source));

        for expected in ["p1", "p2", "p3"] {
            let paper = feed.next_paper(None).await.unwrap();
            assert_eq!(paper.paper_id, expected);
        }
        assert_eq!(feed.page(), 1);

        // Fourth call exhausts the buffer and triggers a fetch of page 1
        let err = feed.next_paper(None).await.unwrap_err();
        assert!(matches!(err, ScholarError::NoFallbackAvailable));
        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], ("CRISPR gene editing".to_string(), 20, 20));
    }

    #[tokio::test]
    async fn test_no_duplicates_between_resets() {
        let source = Arc::new(MockSource::new());
        // Page 1 repeats p2 and p3; only p4 is novel
        source.push_page(vec![make_paper("p1", "one"), make_paper("p2", "two")]);
        source.push_page(vec![
            make_paper("p2", "two"),
            make_paper("p3", "three"),
            make_paper("p4", "four"),
        ]);
        let mut feed = engine(Arc::clone(&source));

        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(feed.next_paper(None).await.unwrap().paper_id);
        }
        assert_eq!(ids, ["p1", "p2", "p3", "p4"]);

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_all_duplicate_page_triggers_refetch_within_one_call() {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![make_paper("p1", "one")]);
        source.push_page(vec![make_paper("p1", "one")]);
        source.push_page(vec![make_paper("p2", "two")]);
        let mut feed = engine(Arc::clone(&source));

        assert_eq!(feed.next_paper(None).await.unwrap().paper_id, "p1");
        // Second call skips the duplicate-only page and keeps paginating
        assert_eq!(feed.next_paper(None).await.unwrap().paper_id, "p2");
        assert_eq!(source.calls().len(), 3);
        assert_eq!(feed.page(), 3);
    }

    #[tokio::test]
    async fn test_page_fetch_cap_bounds_duplicate_only_streams() {
        let source = Arc::new(MockSource::new());
        // Upstream pathologically repeats the same paper forever
        for _ in 0..10 {
            source.push_page(vec![make_paper("p1", "one")]);
        }
        let options = FeedOptions {
            page_size: 20,
            max_pages_per_call: 3,
        };
        let mut feed = FallbackFeed::with_default_query(
            Arc::clone(&source) as Arc<dyn SearchSource>,
            options,
            "Neuroscience of memory",
        );

        assert_eq!(feed.next_paper(None).await.unwrap().paper_id, "p1");
        let err = feed.next_paper(None).await.unwrap_err();
        assert!(matches!(err, ScholarError::NoFallbackAvailable));
        // One fetch for the first call, three (the cap) for the second
        assert_eq!(source.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_upstream_error_surfaces_as_no_fallback() {
        let source = Arc::new(MockSource::new());
        source.push_error(ScholarError::RateLimited);
        source.push_page(vec![make_paper("p1", "one")]);
        let mut feed = engine(Arc::clone(&source));

        let err = feed.next_paper(None).await.unwrap_err();
        assert!(matches!(err, ScholarError::NoFallbackAvailable));

        // A later call succeeds once the transient failure clears
        assert_eq!(feed.next_paper(None).await.unwrap().paper_id, "p1");
        assert_eq!(feed.page(), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_seen_set_and_cursor() {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![make_paper("p1", "one")]);
        source.push_page(vec![make_paper("p1", "one")]);
        let mut feed = engine(Arc::clone(&source));

        assert_eq!(feed.next_paper(None).await.unwrap().paper_id, "p1");
        feed.reset();
        assert_eq!(feed.page(), 0);
        assert_eq!(feed.seen_count(), 0);

        // p1 is returned again after the reset
        assert_eq!(feed.next_paper(None).await.unwrap().paper_id, "p1");
        // Both fetches requested page 0
        let calls = source.calls();
        assert_eq!(calls[0].2, 0);
        assert_eq!(calls[1].2, 0);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![make_paper("p1", "one"), make_paper("p2", "two")]);
        let mut feed = engine(source);

        feed.next_paper(None).await.unwrap();
        feed.reset();
        let (page, seen) = (feed.page(), feed.seen_count());
        feed.reset();
        assert_eq!((feed.page(), feed.seen_count()), (page, seen));
    }

    #[tokio::test]
    async fn test_caller_query_overrides_default() {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![make_paper("p1", "one")]);
        source.push_page(vec![make_paper("p2", "two")]);
        let mut feed = engine(Arc::clone(&source));

        feed.next_paper(Some("protein folding")).await.unwrap();
        // Empty caller query falls back to the startup default
        feed.next_paper(Some("")).await.unwrap();

        let calls = source.calls();
        assert_eq!(calls[0].0, "protein folding");
        assert_eq!(calls[1].0, "CRISPR gene editing");
    }

    #[tokio::test]
    async fn test_batch_is_cut_short_on_stream_exhaustion() {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![make_paper("p1", "one"), make_paper("p2", "two")]);
        source.push_page(vec![]);
        let mut feed = engine(source);

        let batch = feed.next_batch(5, None).await;
        assert_eq!(batch.len(), 2);
    }
}
