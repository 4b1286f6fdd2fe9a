pub mod input;
pub mod overlay;
pub mod store;
