/// Pool dedicado para parsing de planilhas (CPU-bound)
///
/// Mantém a descompressão de .xlsx e a leitura de CSV fora dos workers do
/// actix, que continuam livres para atender requisições.

use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::runtime::Runtime;

lazy_static! {
    /// Pool para operações blocking de parsing
    ///
    /// Configurado com:
    /// - 4 worker threads
    /// - Thread names para debug
    pub static ref PARSE_POOL: Arc<Runtime> = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .thread_name("parse-worker")
            .enable_all()
            .build()
            .expect("Failed to create parse thread pool")
    );
}

/// Executa uma operação blocking no pool de parsing
///
/// # Example
/// ```rust,ignore
/// let rows = spawn_parse_blocking(move || parser::parse_rows(kind, &bytes)).await??;
/// ```
pub async fn spawn_parse_blocking<F, R>(f: F) -> Result<R, tokio::task::JoinError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    PARSE_POOL.spawn_blocking(f).await
}
