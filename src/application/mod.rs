pub mod checkout_service;
pub mod dto;
pub mod wallet_service;

#[cfg(test)]
pub mod mocks;

pub use checkout_service::CheckoutService;
pub use dto::{CheckoutInitiated, ErrorResponse, TopupInitiated, TopupRequest};
pub use wallet_service::WalletService;
