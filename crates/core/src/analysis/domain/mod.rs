pub mod emotion;
pub mod face_analyzer;
pub mod observation;
