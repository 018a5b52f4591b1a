#![doc = include_str!("RUSTDOC.md")]

pub mod config;
pub mod gateway;
pub mod logger;

#[cfg(test)]
pub mod test_support;
