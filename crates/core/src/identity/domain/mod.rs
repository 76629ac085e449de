pub mod face_gallery;
pub mod identity;
pub mod identity_resolver;
pub mod identity_store;
