/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// The async SPIMEX SDK instance. Dispatches blocking downloads and
    /// DuckDB queries to a thread pool internally.
    pub sdk: spimex_sdk::AsyncSpimexSdk,
}
