//! Domain types and the ports the checkout flow depends on.

pub mod card;
pub mod flow;
pub mod money;
pub mod payment;
pub mod ports;
pub mod provider;
