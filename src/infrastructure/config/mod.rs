pub mod bkash_config;

pub use bkash_config::BkashConfig;
