pub mod frame_tracker;
pub mod pipeline_logger;
pub mod track_faces_use_case;
