pub mod ingest;
pub mod vehicles;
