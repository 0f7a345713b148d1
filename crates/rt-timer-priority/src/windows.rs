//! Windows implementation using process priority classes.

use crate::PriorityLevel;
use crate::error::{PriorityError, PriorityResult};
use windows::Win32::System::Threading::{
    GetCurrentProcess, HIGH_PRIORITY_CLASS, NORMAL_PRIORITY_CLASS, PROCESS_CREATION_FLAGS,
    REALTIME_PRIORITY_CLASS, SetPriorityClass,
};

fn priority_class(level: PriorityLevel) -> PROCESS_CREATION_FLAGS {
    match level {
        PriorityLevel::Normal => NORMAL_PRIORITY_CLASS,
        PriorityLevel::High => HIGH_PRIORITY_CLASS,
        // Downgraded to HIGH by the OS without SeIncreaseBasePriorityPrivilege.
        PriorityLevel::Realtime => REALTIME_PRIORITY_CLASS,
    }
}

#[expect(unsafe_code, reason = "Win32 process APIs are unsafe")]
pub(crate) fn set_process_priority(level: PriorityLevel) -> PriorityResult {
    // SAFETY: GetCurrentProcess returns a pseudo-handle that is always valid
    // for the calling process and needs no closing.
    let process = unsafe { GetCurrentProcess() };
    // SAFETY: `process` is the current-process pseudo-handle and the class
    // is one of the documented priority class constants.
    unsafe { SetPriorityClass(process, priority_class(level)) }
        .map_err(|e| PriorityError::Os(std::io::Error::other(e)))
}
