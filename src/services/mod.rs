//! Registry service seam and the workflow that drives it

mod traits;
mod workflow;

pub use traits::{ApiError, ApiResult, NameRequestApi};
pub use workflow::{parse_nr_number, Workflow};

#[cfg(test)]
pub use traits::MockNameRequestApi;
