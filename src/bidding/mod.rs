pub mod adapter;
pub mod distribution;
pub mod exchange_client;
pub mod imp;
pub mod schain;
pub mod xandr;

pub use adapter::JwPlayerAdapter;
