pub mod confidence_gate;
pub mod replay_face_analyzer;
