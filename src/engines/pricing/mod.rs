// Pricing (C3/C4/C5): static catalog, live adapters, and the resolving
// factory that sits in front of both.

pub mod catalog;
pub mod factory;
pub mod live;
pub mod types;

pub use factory::PricingFactory;
pub use types::{Confidence, PriceRecord, PriceSource, PriceUnit, PricingError};
