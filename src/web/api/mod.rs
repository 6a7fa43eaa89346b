pub mod error;
pub mod track;
