// Utility functions
pub mod error;
pub mod thread_pool;
