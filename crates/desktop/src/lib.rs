pub mod accounts;
pub mod clients;
pub mod config;
pub mod error;
pub mod oauth;
pub mod search;
pub mod shell;
pub mod sync;
