pub mod rate_governor;

pub use rate_governor::{GovernorError, RateGovernor, RateGovernorActor, RateGovernorArguments};
