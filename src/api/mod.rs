mod client;
mod account;

pub use client::HttpBackend;
pub use account::AccountActions;
