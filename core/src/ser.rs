pub mod json;
pub mod walker;
