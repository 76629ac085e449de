pub mod embedding_identity_resolver;
pub mod gallery_scan;
pub mod histogram_identity_resolver;
