pub mod api_router;
pub mod config;
pub mod goals;
pub mod shared;
pub mod storage;
