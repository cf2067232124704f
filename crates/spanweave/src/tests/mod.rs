mod property_engine;
mod property_scanners;
pub mod utils;
