mod condition;
mod results;
mod sample;

pub use condition::{Condition, ConditionKey, FactorAxis, GridRow, Outcome};
pub use results::{AggregateSummary, Estimate, EstimationResult};
pub use sample::{SyntheticSample, Unit};
