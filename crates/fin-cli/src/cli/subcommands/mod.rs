mod auth;

pub use auth::{AuthCommands, AuthLoginArgs};
