pub mod auth;
pub mod crypto;
pub mod donation;
pub mod invitation;
pub mod ledger;
pub mod log;
pub mod notify;
pub mod payment;
pub mod templates;
pub mod user;
