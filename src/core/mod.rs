pub mod claims;
pub mod credential;
pub mod key;
