pub mod dedup;
pub mod export_service;
pub mod import_service;
pub mod normalizer;
pub mod parser;

pub use dedup::DedupMode;
