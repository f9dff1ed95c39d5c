pub mod error;
pub mod wallet;
