pub mod input;
pub mod notes;
pub mod overlay;
