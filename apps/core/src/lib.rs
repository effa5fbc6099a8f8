pub mod browser_history;
pub mod config;
pub mod config_state;
pub mod contract;
pub mod core_service;
pub mod default_paths;
pub mod editor_history;
pub mod error;
pub mod guid;
pub mod ide_history;
pub mod logging;
pub mod model;
pub mod notes;
pub mod pipeline;
pub mod runtime;
pub mod search;
pub mod search_index;
pub mod settings;
pub mod source;
pub mod sqlite_cli;
pub mod tabular;
pub mod transport;
