//! Fallback for platforms without a supported priority API.

use crate::PriorityLevel;
use crate::error::{PriorityError, PriorityResult};

pub(crate) fn set_process_priority(_level: PriorityLevel) -> PriorityResult {
    Err(PriorityError::Unsupported)
}
