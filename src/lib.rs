pub mod config;
pub mod engine;
pub mod font;
pub mod render;
