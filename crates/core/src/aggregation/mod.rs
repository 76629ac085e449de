pub mod aggregate;
pub mod emotion_tally;
