pub mod wallet_service;
