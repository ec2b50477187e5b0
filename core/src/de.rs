pub mod json;
pub mod rehydrator;
pub mod seed;
