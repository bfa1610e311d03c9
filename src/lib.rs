pub mod agent;
pub mod approaches;
pub mod claude_cli;
pub mod data;
pub mod dispatcher;
pub mod errors;
pub mod logging;
pub mod models;
pub mod observability;
pub mod prompt_template;
pub mod providers;
