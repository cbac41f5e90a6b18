pub mod auth;
pub mod gate;

pub use auth::AuthSession;
