#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use board_view::{BoardGeometry, Frame, Slide, Stage};
use chess_core::GameRecord;
use desktop::clients::{
    Account, AuthStart, ChessqlApi, SearchPageRequest, SearchResponse, SyncState, SyncStatus,
};
use desktop::error::AppError;
use serde_json::{json, Value};

/// In-memory backend. Search slices `games` by offset/limit; sync status
/// replies are popped from a script, defaulting to `completed` once it runs dry.
#[derive(Default)]
pub struct FakeApi {
    pub games: Vec<GameRecord>,
    /// Most rows returned per call regardless of the requested limit.
    pub page_cap: Option<usize>,
    /// Backend page numbers that answer with an error.
    pub failing_pages: Mutex<Vec<usize>>,
    pub search_calls: Mutex<Vec<SearchPageRequest>>,
    pub status_script: Mutex<VecDeque<Result<SyncState, String>>>,
    pub status_calls: AtomicUsize,
    pub auth_calls: AtomicUsize,
    pub sync_starts: Mutex<Vec<(String, bool)>>,
    pub accounts: Mutex<Vec<Account>>,
}

impl FakeApi {
    pub fn with_games(count: usize) -> Self {
        Self {
            games: (0..count).map(game).collect(),
            ..Default::default()
        }
    }

    pub fn fail_page(&self, page_no: usize) {
        self.failing_pages.lock().unwrap().push(page_no);
    }

    pub fn heal(&self) {
        self.failing_pages.lock().unwrap().clear();
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.lock().unwrap().len()
    }

    pub fn script_statuses(&self, script: Vec<Result<SyncState, String>>) {
        *self.status_script.lock().unwrap() = script.into();
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChessqlApi for FakeApi {
    async fn search(&self, request: &SearchPageRequest) -> Result<SearchResponse, AppError> {
        self.search_calls.lock().unwrap().push(request.clone());
        if self.failing_pages.lock().unwrap().contains(&request.page_no) {
            return Err(AppError::Api {
                status: 500,
                detail: "query failed".into(),
            });
        }

        let start = request.offset.min(self.games.len());
        let limit = self.page_cap.map_or(request.limit, |cap| cap.min(request.limit));
        let end = (start + limit).min(self.games.len());
        Ok(SearchResponse {
            results: self.games[start..end].to_vec(),
            total_count: self.games.len(),
            has_next: Some(end < self.games.len()),
        })
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn start_lichess_auth(&self) -> Result<AuthStart, AppError> {
        Ok(AuthStart {
            auth_url: "https://lichess.org/oauth?state=s1".into(),
            code_verifier: "verifier".into(),
            state: "s1".into(),
        })
    }

    async fn complete_lichess_auth(
        &self,
        code: &str,
        state: &str,
        code_verifier: &str,
    ) -> Result<Value, AppError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "username": "lecorvus",
            "code": code,
            "state": state,
            "code_verifier": code_verifier,
        }))
    }

    async fn unlink_account(&self, username: &str) -> Result<(), AppError> {
        self.accounts.lock().unwrap().retain(|a| a.username != username);
        Ok(())
    }

    async fn verify_account(&self, _username: &str) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn start_sync(&self, username: &str, full_sync: bool) -> Result<(), AppError> {
        self.sync_starts
            .lock()
            .unwrap()
            .push((username.to_string(), full_sync));
        Ok(())
    }

    async fn sync_status(&self, _username: &str) -> Result<SyncStatus, AppError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SyncState::Completed));
        match next {
            Ok(state) => Ok(SyncStatus {
                status: state,
                synced_games: 5,
                new_games: 2,
                total_games: Some(10),
                error_message: None,
            }),
            Err(detail) => Err(AppError::Api {
                status: 503,
                detail,
            }),
        }
    }
}

pub fn game(i: usize) -> GameRecord {
    GameRecord {
        white_player: Some(format!("white{i}")),
        black_player: Some(format!("black{i}")),
        result: Some("1-0".into()),
        ..Default::default()
    }
}

pub fn tokens(moves: &[&str]) -> Vec<String> {
    moves.iter().map(|s| s.to_string()).collect()
}

/// Stage that records everything instead of drawing it.
#[derive(Default)]
pub struct RecordingStage {
    pub frames: Vec<Frame>,
    pub slides: Vec<Slide>,
}

impl Stage for RecordingStage {
    fn geometry(&self) -> BoardGeometry {
        BoardGeometry::new(400.0, 400.0)
    }

    fn render(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }

    async fn animate(&mut self, slide: &Slide) {
        self.slides.push(slide.clone());
    }
}
