pub mod risk_factors;
pub mod counterparty;
pub mod contract;
pub mod scenario;
pub mod universe;
pub mod errors;

pub use risk_factors::*;
pub use counterparty::*;
pub use contract::*;
pub use scenario::*;
pub use universe::*;
pub use errors::*;
