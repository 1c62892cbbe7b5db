pub mod config;
pub mod eval;
pub mod export;
pub mod history;
pub mod repl;
pub mod tokens;
