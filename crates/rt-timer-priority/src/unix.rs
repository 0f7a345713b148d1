//! Unix implementation using the process nice value.

use crate::PriorityLevel;
use crate::error::{PriorityError, PriorityResult};
use std::io;

/// Nice value requested for each level. Negative values need
/// `CAP_SYS_NICE` (or root) on Linux.
pub(crate) fn nice_value(level: PriorityLevel) -> libc::c_int {
    match level {
        PriorityLevel::Normal => 0,
        PriorityLevel::High => -10,
        PriorityLevel::Realtime => -20,
    }
}

#[expect(unsafe_code, reason = "setpriority has no safe wrapper")]
pub(crate) fn set_process_priority(level: PriorityLevel) -> PriorityResult {
    // SAFETY: setpriority takes plain integers and touches no caller memory;
    // who = 0 selects the calling process.
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, nice_value(level)) };
    if rc == 0 {
        Ok(())
    } else {
        Err(PriorityError::Os(io::Error::last_os_error()))
    }
}
