pub mod config_file;
pub mod github;
pub mod notifier;
