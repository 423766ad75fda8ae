pub mod chessql;

pub use chessql::{
    Account, AuthStart, ChessqlApi, ChessqlClient, SearchMode, SearchPageRequest, SearchResponse,
    SyncState, SyncStatus,
};
