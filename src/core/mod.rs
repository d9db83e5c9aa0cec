//! Foundational types: currencies, market inputs, hedge terms and errors.

pub mod currency;
pub mod error;
pub mod market;
