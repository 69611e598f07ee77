//! Price-aware scheduling strategies.

pub mod greedy_price;
pub mod intelligent_bidding;
pub mod uniform_progression;
