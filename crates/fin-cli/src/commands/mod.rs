pub mod analysis;
pub mod auth;
pub mod connect;
pub mod dispatch;
pub mod profile;
pub mod register;
pub mod sync;
