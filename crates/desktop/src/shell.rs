//! Line-oriented front end: search, game detail view and accounts panel.

use std::sync::Arc;

use board_view::{
    thumbnail, BoardGeometry, Frame, Key, MoveNavigator, MoveRow, NavigatorOptions, Slide, Stage,
};
use chess_core::{GameRecord, ShakmatyEngine};
use chrono::{DateTime, NaiveDateTime};
use tokio::sync::mpsc;

use crate::accounts::AccountsPanel;
use crate::clients::{Account, ChessqlApi, SyncState};
use crate::config::Config;
use crate::error::AppError;
use crate::oauth::OAuthSession;
use crate::search::{SearchController, SearchQuery};
use crate::sync::SyncUpdate;

/// (label, command line) pairs offered on the welcome screen.
pub const EXAMPLE_QUERIES: &[(&str, &str)] = &[
    ("lecorvus won", "ask lecorvus won"),
    ("queen sacrificed", "ask queen sacrificed"),
    ("pawn promoted to queen", "ask pawn promoted to queen"),
    (
        "SQL: lecorvus as white",
        "cql SELECT * FROM games WHERE white_player = 'lecorvus'",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Cql(String),
    Page(usize),
    NextPage,
    PrevPage,
    Clear,
    /// 1-based index into the displayed page.
    Open(usize),
    Thumb(usize),
    Key(Key),
    Goto(usize),
    Close,
    Accounts,
    Link,
    /// A URL the browser landed on during a link flow.
    Callback(String),
    Cancel,
    Unlink(String),
    Verify(String),
    Sync { username: String, full: bool },
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let text = |name: &str| {
            if rest.is_empty() {
                Err(format!("usage: {name} <text>"))
            } else {
                Ok(rest.to_string())
            }
        };
        let number = |name: &str| {
            rest.parse::<usize>()
                .map_err(|_| format!("usage: {name} <number>"))
        };

        match word.to_ascii_lowercase().as_str() {
            "ask" => text("ask").map(Command::Ask),
            "cql" => text("cql").map(Command::Cql),
            "page" => number("page").map(Command::Page),
            "next" | "n" => Ok(Command::NextPage),
            "prev" | "p" => Ok(Command::PrevPage),
            "clear" => Ok(Command::Clear),
            "open" | "o" => number("open").map(Command::Open),
            "thumb" => number("thumb").map(Command::Thumb),
            "left" | "h" => Ok(Command::Key(Key::Left)),
            "right" | "l" => Ok(Command::Key(Key::Right)),
            "up" | "k" | "home" => Ok(Command::Key(Key::Up)),
            "down" | "j" | "end" => Ok(Command::Key(Key::Down)),
            "flip" | "f" => Ok(Command::Key(Key::Char('f'))),
            "goto" => number("goto").map(Command::Goto),
            "close" => Ok(Command::Close),
            "accounts" => Ok(Command::Accounts),
            "link" => Ok(Command::Link),
            "callback" => text("callback").map(Command::Callback),
            "cancel" => Ok(Command::Cancel),
            "unlink" => text("unlink").map(Command::Unlink),
            "verify" => text("verify").map(Command::Verify),
            "sync" => {
                let mut parts = rest.split_whitespace();
                let username = parts.next().ok_or("usage: sync <username> [full]")?;
                let full = match parts.next() {
                    None => false,
                    Some("full") => true,
                    Some(other) => return Err(format!("unknown sync option '{other}'")),
                };
                Ok(Command::Sync {
                    username: username.to_string(),
                    full,
                })
            }
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Prints frames to stdout and paces slides in real time.
pub struct TerminalStage {
    geometry: BoardGeometry,
}

impl TerminalStage {
    pub fn new() -> Self {
        Self {
            geometry: BoardGeometry::new(400.0, 400.0),
        }
    }
}

impl Default for TerminalStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TerminalStage {
    fn geometry(&self) -> BoardGeometry {
        self.geometry
    }

    fn render(&mut self, frame: &Frame) {
        println!("{}", format_frame(frame));
    }

    async fn animate(&mut self, slide: &Slide) {
        println!("  {} {} → {}", slide.glyph, slide.from, slide.to);
        tokio::time::sleep(slide.duration).await;
    }
}

struct GameDetail {
    record: GameRecord,
    navigator: MoveNavigator<ShakmatyEngine>,
}

pub struct Shell<S: Stage = TerminalStage> {
    api: Arc<dyn ChessqlApi>,
    options: NavigatorOptions,
    search: SearchController,
    accounts: AccountsPanel,
    detail: Option<GameDetail>,
    pending_link: Option<OAuthSession>,
    stage: S,
}

impl Shell<TerminalStage> {
    pub fn new(
        api: Arc<dyn ChessqlApi>,
        config: &Config,
    ) -> (Self, mpsc::UnboundedReceiver<SyncUpdate>) {
        Self::with_stage(api, config, TerminalStage::new())
    }
}

impl<S: Stage> Shell<S> {
    pub fn with_stage(
        api: Arc<dyn ChessqlApi>,
        config: &Config,
        stage: S,
    ) -> (Self, mpsc::UnboundedReceiver<SyncUpdate>) {
        let (accounts, updates) = AccountsPanel::new(api.clone(), config);
        let shell = Self {
            search: SearchController::new(api.clone(), config),
            api,
            options: NavigatorOptions {
                animate_backward: config.animate_backward,
                slide_duration: config.animation_duration,
            },
            accounts,
            detail: None,
            pending_link: None,
            stage,
        };
        (shell, updates)
    }

    pub async fn handle_line(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        match Command::parse(line) {
            Ok(Command::Quit) => {
                self.accounts.close();
                Flow::Quit
            }
            Ok(command) => {
                if let Err(e) = self.run(command).await {
                    println!("Error: {e}");
                }
                Flow::Continue
            }
            Err(message) => {
                println!("{message}");
                Flow::Continue
            }
        }
    }

    async fn run(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Ask(text) => self.run_search(SearchQuery::natural(text)).await?,
            Command::Cql(text) => self.run_search(SearchQuery::cql(text)).await?,
            Command::Page(page) => {
                self.search.go_to_page(page).await?;
                println!("{}", format_results(&self.search));
            }
            Command::NextPage => {
                self.search.next_page().await?;
                println!("{}", format_results(&self.search));
            }
            Command::PrevPage => {
                self.search.previous_page().await?;
                println!("{}", format_results(&self.search));
            }
            Command::Clear => {
                self.search.clear();
                println!("{}", welcome_text());
            }
            Command::Open(index) => self.open_game(index),
            Command::Thumb(index) => match self.displayed(index) {
                Some(record) => println!("{}\n{}", record.title(), thumbnail(record).to_text()),
                None => println!("No game {index} on this page"),
            },
            Command::Key(key) => match self.detail.as_mut() {
                Some(detail) => {
                    let nav = &mut detail.navigator;
                    nav.handle_key(key, &mut self.stage).await;
                    println!("{}", format_move_list(&nav.move_rows(), nav.highlighted_ply()));
                }
                None => println!("No game open"),
            },
            Command::Goto(ply) => match self.detail.as_mut() {
                Some(detail) => {
                    let nav = &mut detail.navigator;
                    nav.go_to_move_direct(ply, &mut self.stage);
                    println!("{}", format_move_list(&nav.move_rows(), nav.highlighted_ply()));
                }
                None => println!("No game open"),
            },
            Command::Close => {
                if self.detail.take().is_some() {
                    println!("{}", format_results(&self.search));
                }
            }
            Command::Accounts => {
                let accounts = self.accounts.refresh().await?;
                println!("{}", format_accounts(accounts));
            }
            Command::Link => {
                let session = self.accounts.begin_link().await?;
                println!("Open this URL to authorize with Lichess:\n  {}", session.auth_url());
                println!("Then paste the address you are redirected to: callback <url>");
                self.pending_link = Some(session);
            }
            Command::Callback(url) => self.complete_link(&url).await?,
            Command::Cancel => match self.pending_link.take() {
                Some(session) => {
                    session.close();
                    println!("Link cancelled");
                }
                None => println!("No link in progress"),
            },
            Command::Unlink(username) => {
                self.accounts.unlink(&username).await?;
                println!("Unlinked {username}");
            }
            Command::Verify(username) => {
                let valid = self.accounts.verify(&username).await?;
                let label = if valid { "valid" } else { "invalid, relink the account" };
                println!("{username}: token {label}");
            }
            Command::Sync { username, full } => {
                self.accounts.sync(&username, full).await?;
                let kind = if full { "full sync" } else { "sync" };
                println!("Started {kind} for {username}");
            }
            Command::Help => println!("{}", help_text()),
            Command::Quit => {}
        }
        Ok(())
    }

    async fn run_search(&mut self, query: SearchQuery) -> Result<(), AppError> {
        self.detail = None;
        self.search.search(query).await?;
        println!("{}", format_results(&self.search));
        Ok(())
    }

    fn displayed(&self, index: usize) -> Option<&GameRecord> {
        index.checked_sub(1).and_then(|i| self.search.item(i))
    }

    fn open_game(&mut self, index: usize) {
        let Some(record) = self.displayed(index).cloned() else {
            println!("No game {index} on this page");
            return;
        };

        let mut navigator = MoveNavigator::open(ShakmatyEngine::new(), &record, self.options);
        println!("{}", format_game_header(&record));
        navigator.go_to_first_move(&mut self.stage);
        println!("{}", format_move_list(&navigator.move_rows(), navigator.highlighted_ply()));
        self.detail = Some(GameDetail { record, navigator });
    }

    async fn complete_link(&mut self, url: &str) -> Result<(), AppError> {
        let Some(session) = self.pending_link.as_ref() else {
            println!("No link in progress, run 'link' first");
            return Ok(());
        };
        let Some(outcome) = session.handle_navigation(self.api.as_ref(), url).await else {
            println!("Not a Lichess callback URL, still waiting");
            return Ok(());
        };

        self.pending_link = None;
        let outcome = outcome?;
        match outcome.username() {
            Some(username) => println!("Linked {username}"),
            None => println!("Account linked"),
        }
        let accounts = self.accounts.refresh().await?;
        println!("{}", format_accounts(accounts));
        Ok(())
    }

    /// Title of the open game, if any.
    pub fn open_title(&self) -> Option<String> {
        self.detail.as_ref().map(|d| d.record.title())
    }

    /// Cursor of the open game, if any.
    pub fn open_cursor(&self) -> Option<usize> {
        self.detail.as_ref().map(|d| d.navigator.cursor())
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }
}

pub fn welcome_text() -> String {
    let mut out = String::from(
        "Welcome to ChessQL Desktop\n\
         Search for chess games using natural language or ChessQL queries.\n\
         Try these examples:\n",
    );
    for (label, line) in EXAMPLE_QUERIES {
        out.push_str(&format!("  {label:<24} {line}\n"));
    }
    out
}

pub fn help_text() -> String {
    format!(
        "{}\n\
         Search:   ask <question> | cql <query> | page <n> | next | prev | clear\n\
         Games:    open <i> | thumb <i>\n\
         Board:    left | right | up | down | flip | goto <ply> | close\n\
         Accounts: accounts | link | callback <url> | cancel | unlink <user> | verify <user> | sync <user> [full]\n\
         Other:    help | quit",
        welcome_text()
    )
}

pub fn format_results(search: &SearchController) -> String {
    let items = search.current_items();
    if items.is_empty() {
        return "No games found".to_string();
    }

    let mut out = format!(
        "Found {} games (page {} of {})\n",
        search.total_count(),
        search.current_page(),
        search.total_pages()
    );
    for (i, game) in items.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", i + 1, format_result_line(game)));
    }
    out.push_str(&format!(
        "[prev {}] [next {}]",
        if search.has_previous_page() { "on" } else { "off" },
        if search.has_next_page() { "on" } else { "off" },
    ));
    out
}

fn format_result_line(game: &GameRecord) -> String {
    let mut line = format!(
        "{}{} vs {}{} | {} | {}",
        game.white_name(),
        spaced(GameRecord::elo_label(game.white_elo)),
        game.black_name(),
        spaced(GameRecord::elo_label(game.black_elo)),
        game.result_label(),
        game.date_label(),
    );
    if let Some(opening) = game.opening.as_deref().filter(|o| !o.is_empty()) {
        line.push_str(&format!(" | {opening}"));
    }
    line
}

fn spaced(label: String) -> String {
    if label.is_empty() {
        label
    } else {
        format!(" {label}")
    }
}

pub fn format_game_header(game: &GameRecord) -> String {
    let mut out = format!(
        "{}{} vs {}{}\nResult: {}  Date: {}",
        game.white_name(),
        spaced(GameRecord::elo_label(game.white_elo)),
        game.black_name(),
        spaced(GameRecord::elo_label(game.black_elo)),
        game.result_label(),
        game.date_label(),
    );
    if let Some(tc) = game.time_control.as_deref() {
        out.push_str(&format!("  Time control: {tc}"));
    }
    if let Some(opening) = game.opening.as_deref().filter(|o| !o.is_empty()) {
        out.push_str(&format!("\nOpening: {opening}"));
    }
    out
}

/// The highlighted ply is wrapped in brackets.
pub fn format_move_list(rows: &[MoveRow], highlighted: Option<usize>) -> String {
    if rows.is_empty() {
        return "(no moves)".to_string();
    }
    let mark = |ply: usize, san: &str| {
        if highlighted == Some(ply) {
            format!("[{san}]")
        } else {
            san.to_string()
        }
    };

    rows.iter()
        .map(|row| {
            let white_ply = (row.number - 1) * 2;
            let mut line = format!("{}. {}", row.number, mark(white_ply, &row.white));
            if let Some(black) = &row.black {
                line.push(' ');
                line.push_str(&mark(white_ply + 1, black));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn format_frame(frame: &Frame) -> String {
    let c = frame.controls;
    let button = |label: &str, enabled: bool| {
        if enabled {
            format!("[{label}]")
        } else {
            format!(" {label} ")
        }
    };
    format!(
        "{}\nMove {}/{}  {}{}{}{}",
        frame.view.to_text(),
        frame.cursor,
        frame.total,
        button("|<", c.first),
        button("<", c.previous),
        button(">", c.next),
        button(">|", c.last),
    )
}

pub fn format_accounts(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "No linked accounts. Run 'link' to connect a Lichess account.".to_string();
    }
    accounts
        .iter()
        .map(|a| {
            let games = a
                .game_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string());
            format!(
                "{}  games: {}  last sync: {}  token: {}",
                a.username,
                games,
                format_last_sync(a.last_sync.as_deref()),
                if a.token_valid { "valid" } else { "expired" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a backend timestamp as "YYYY-MM-DD HH:MM"; unparseable values pass through.
pub fn format_last_sync(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return "never".to_string();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

pub fn format_sync_update(update: &SyncUpdate) -> String {
    let s = &update.status;
    let user = &update.username;
    match s.status {
        SyncState::Starting => format!("{user}: starting sync"),
        SyncState::Syncing => match s.total_games {
            Some(total) => format!("{user}: syncing {}/{} games", s.synced_games, total),
            None => format!("{user}: syncing, {} games so far", s.synced_games),
        },
        SyncState::Completed => format!(
            "{user}: sync complete, {} new games ({} synced)",
            s.new_games, s.synced_games
        ),
        SyncState::Cancelled => format!("{user}: sync cancelled"),
        SyncState::Error => format!(
            "{user}: sync failed: {}",
            s.error_message.as_deref().unwrap_or("unknown error")
        ),
        SyncState::Unknown => format!("{user}: sync status unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::SyncStatus;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("ask  queen sacrificed "),
            Ok(Command::Ask("queen sacrificed".into()))
        );
        assert_eq!(Command::parse("page 3"), Ok(Command::Page(3)));
        assert_eq!(Command::parse("RIGHT"), Ok(Command::Key(Key::Right)));
        assert_eq!(
            Command::parse("sync lecorvus full"),
            Ok(Command::Sync {
                username: "lecorvus".into(),
                full: true
            })
        );
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse("page two").is_err());
        assert!(Command::parse("ask").is_err());
        assert!(Command::parse("sync a partial").is_err());
        assert!(Command::parse("dance").is_err());
    }

    #[test]
    fn test_move_list_highlight() {
        let rows = vec![
            MoveRow {
                number: 1,
                white: "e4".into(),
                black: Some("e5".into()),
            },
            MoveRow {
                number: 2,
                white: "Nf3".into(),
                black: None,
            },
        ];
        assert_eq!(format_move_list(&rows, Some(1)), "1. e4 [e5]  2. Nf3");
        assert_eq!(format_move_list(&rows, Some(2)), "1. e4 e5  2. [Nf3]");
        assert_eq!(format_move_list(&rows, None), "1. e4 e5  2. Nf3");
    }

    #[test]
    fn test_last_sync_formats() {
        assert_eq!(format_last_sync(None), "never");
        assert_eq!(
            format_last_sync(Some("2024-03-01T12:30:00+00:00")),
            "2024-03-01 12:30"
        );
        assert_eq!(
            format_last_sync(Some("2024-03-01T12:30:45.123456")),
            "2024-03-01 12:30"
        );
        assert_eq!(format_last_sync(Some("yesterday")), "yesterday");
    }

    #[test]
    fn test_sync_update_messages() {
        let update = |status: SyncState| SyncUpdate {
            username: "lecorvus".into(),
            status: SyncStatus {
                status,
                synced_games: 40,
                new_games: 12,
                total_games: Some(100),
                error_message: None,
            },
        };
        assert_eq!(
            format_sync_update(&update(SyncState::Syncing)),
            "lecorvus: syncing 40/100 games"
        );
        assert_eq!(
            format_sync_update(&update(SyncState::Completed)),
            "lecorvus: sync complete, 12 new games (40 synced)"
        );
        assert_eq!(
            format_sync_update(&update(SyncState::Error)),
            "lecorvus: sync failed: unknown error"
        );
    }

    #[test]
    fn test_welcome_lists_examples() {
        let text = welcome_text();
        for (_, line) in EXAMPLE_QUERIES {
            assert!(text.contains(line));
        }
    }
}
