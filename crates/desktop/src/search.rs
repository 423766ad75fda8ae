//! Search and pagination over the backend's paged results.
//!
//! Display pages are slices of a buffer of backend fetch pages. The buffer
//! only grows, one backend page at a time and in order, until a new search
//! replaces it.

use std::ops::Range;
use std::sync::Arc;

use chess_core::GameRecord;
use tracing::{info, warn};

use crate::clients::{ChessqlApi, SearchMode, SearchPageRequest};
use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub mode: SearchMode,
}

impl SearchQuery {
    pub fn natural(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::Natural,
        }
    }

    pub fn cql(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::Cql,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    Paging,
    Error(String),
}

pub struct SearchController {
    api: Arc<dyn ChessqlApi>,
    page_size: usize,
    fetch_size: usize,
    reference_player: Option<String>,
    state: SearchState,
    query: Option<SearchQuery>,
    current_page: usize,
    total_count: usize,
    buffer: Vec<GameRecord>,
    fetched_pages: usize,
    exhausted: bool,
}

impl SearchController {
    pub fn new(api: Arc<dyn ChessqlApi>, config: &Config) -> Self {
        Self::with_sizes(
            api,
            config.page_size,
            config.fetch_size,
            config.reference_player.clone(),
        )
    }

    pub fn with_sizes(
        api: Arc<dyn ChessqlApi>,
        page_size: usize,
        fetch_size: usize,
        reference_player: Option<String>,
    ) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            fetch_size: fetch_size.max(1),
            reference_player,
            state: SearchState::Idle,
            query: None,
            current_page: 1,
            total_count: 0,
            buffer: Vec::new(),
            fetched_pages: 0,
            exhausted: false,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size)
    }

    pub fn loaded(&self) -> &[GameRecord] {
        &self.buffer
    }

    /// Backend pages fetched for the active query.
    pub fn fetched_pages(&self) -> usize {
        self.fetched_pages
    }

    /// The displayed page: always `buffer[(p-1)*size .. p*size]`.
    pub fn current_items(&self) -> &[GameRecord] {
        &self.buffer[self.slice_range(self.current_page)]
    }

    /// Item `index` (0-based) of the displayed page.
    pub fn item(&self, index: usize) -> Option<&GameRecord> {
        self.current_items().get(index)
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    fn slice_range(&self, page: usize) -> Range<usize> {
        let start = (page.saturating_sub(1) * self.page_size).min(self.buffer.len());
        let end = (page * self.page_size).min(self.buffer.len());
        start..end
    }

    /// Buffered rows needed before display page `page` can be sliced.
    pub fn required_items(&self, page: usize) -> usize {
        (page * self.page_size).min(self.total_count)
    }

    /// Start a new search. Blank queries are ignored.
    pub async fn search(&mut self, query: SearchQuery) -> Result<(), AppError> {
        if query.text.trim().is_empty() {
            return Ok(());
        }

        self.reset();
        self.state = SearchState::Searching;
        info!(mode = ?query.mode, query = %query.text, "New search");
        self.query = Some(query);

        let result = match self.fetch_next().await {
            Ok(()) => self.load_through(1).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.state = SearchState::Idle;
                info!(
                    total = self.total_count,
                    pages = self.total_pages(),
                    "Search complete"
                );
                Ok(())
            }
            Err(e) => {
                warn!("Search failed: {e}");
                self.reset();
                self.state = SearchState::Error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn go_to_page(&mut self, page: usize) -> Result<(), AppError> {
        if self.query.is_none() {
            return Err(AppError::NoActiveSearch);
        }
        let total = self.total_pages();
        if page == 0 || page > total {
            return Err(AppError::PageOutOfRange { page, total });
        }

        self.state = SearchState::Paging;
        match self.load_through(page).await {
            Ok(()) => {
                self.current_page = page;
                self.state = SearchState::Idle;
                Ok(())
            }
            Err(e) => {
                warn!(page, "Page fetch failed: {e}");
                self.state = SearchState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// No-op on the last page.
    pub async fn next_page(&mut self) -> Result<(), AppError> {
        if !self.has_next_page() {
            return Ok(());
        }
        self.go_to_page(self.current_page + 1).await
    }

    /// No-op on the first page.
    pub async fn previous_page(&mut self) -> Result<(), AppError> {
        if !self.has_previous_page() {
            return Ok(());
        }
        self.go_to_page(self.current_page - 1).await
    }

    /// Drop the active query and all results.
    pub fn clear(&mut self) {
        self.reset();
        self.state = SearchState::Idle;
    }

    fn reset(&mut self) {
        self.query = None;
        self.current_page = 1;
        self.total_count = 0;
        self.buffer.clear();
        self.fetched_pages = 0;
        self.exhausted = false;
    }

    /// Fetch missing backend pages, lowest first, until `page` is covered or
    /// the backend has nothing more.
    async fn load_through(&mut self, page: usize) -> Result<(), AppError> {
        let needed = self.required_items(page);
        while self.buffer.len() < needed && !self.exhausted {
            self.fetch_next().await?;
        }
        Ok(())
    }

    async fn fetch_next(&mut self) -> Result<(), AppError> {
        let Some(query) = &self.query else {
            return Err(AppError::NoActiveSearch);
        };
        let request = SearchPageRequest {
            mode: query.mode,
            text: query.text.clone(),
            limit: self.fetch_size,
            page_no: self.fetched_pages + 1,
            offset: self.buffer.len(),
            reference_player: self.reference_player.clone(),
        };

        let response = self.api.search(&request).await?;
        let received = response.results.len();

        self.buffer.extend(response.results.into_iter().map(|mut g| {
            g.fill_from_pgn_headers();
            g
        }));
        self.fetched_pages += 1;
        self.total_count = response.total_count.max(self.buffer.len());
        self.exhausted = received == 0
            || match response.has_next {
                Some(has_next) => !has_next,
                None => self.buffer.len() >= self.total_count,
            };

        tracing::debug!(
            page_no = request.page_no,
            received,
            buffered = self.buffer.len(),
            "Fetched backend page"
        );
        Ok(())
    }
}
