pub mod app;
pub mod appointments;
pub mod auth;
pub mod beds;
pub mod config;
pub mod dates;
pub mod db;
pub mod doctors;
pub mod error;
pub mod limits;
pub mod prescriptions;
pub mod provision;
pub mod qr;
pub mod referrals;
pub mod serde_ext;
pub mod state;
pub mod storage;
