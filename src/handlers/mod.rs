pub mod auth;
pub mod donation;
pub mod health;
pub mod invitation;
pub mod user;
