pub mod adapters;
pub mod params;
