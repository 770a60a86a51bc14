pub mod api;
pub mod bidding;
pub mod config;
pub mod errors;
pub mod logging;
pub mod mock_exchange;
pub mod model;
pub mod openrtb;
pub mod targeting;
