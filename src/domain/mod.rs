pub mod revision;
pub mod tracking;
pub mod version;
