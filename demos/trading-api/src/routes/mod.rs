pub mod ingest;
pub mod results;
