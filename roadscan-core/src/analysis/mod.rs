pub mod bbox;
pub mod detection;
pub mod severity;
