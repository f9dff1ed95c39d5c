pub mod health;
pub mod wallet;
