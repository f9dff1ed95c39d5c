pub mod wallet_validator;
