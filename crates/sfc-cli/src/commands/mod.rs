pub mod analyze;
pub mod sensitivity;
