// Catalog pipeline: file storage and processing

pub mod processing;
pub mod storage;
