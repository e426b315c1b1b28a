//! FFI safety wrappers. Converts between entry-point status codes and Rust
//! results, and contains panics.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::RegistrationError;
use crate::registrar::PluginRegistrar;

use super::abi::{
    STATUS_LOGIC_ERROR, STATUS_NULL_REGISTRAR, STATUS_OK, STATUS_PANICKED, STATUS_RUNTIME_ERROR,
};

/// Runs a plugin's Rust registration function on the plugin side of the
/// ABI, turning errors and panics into status codes.
///
/// # Safety
/// `registrar` must be null or point to a live `PluginRegistrar` that is not
/// aliased for the duration of the call.
pub unsafe fn invoke_register(
    registrar: *mut PluginRegistrar,
    register: fn(&mut PluginRegistrar) -> Result<(), RegistrationError>,
) -> i32 {
    // SAFETY: upheld by the caller.
    let Some(registrar) = (unsafe { registrar.as_mut() }) else {
        return STATUS_NULL_REGISTRAR;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| register(registrar))) {
        Ok(Ok(())) => STATUS_OK,
        Ok(Err(error)) => {
            let status = error_status(&error);
            registrar.reject(error);
            status
        }
        Err(payload) => {
            registrar.reject(RegistrationError::Panicked(panic_message(payload.as_ref())));
            STATUS_PANICKED
        }
    }
}

/// Converts an entry-point status back into a result on the host side.
///
/// The error recorded on the registrar takes precedence over the bare code.
pub fn status_to_result(
    status: i32,
    registrar: &mut PluginRegistrar,
) -> Result<(), RegistrationError> {
    if status == STATUS_OK {
        return Ok(());
    }
    if let Some(error) = registrar.take_rejection() {
        return Err(error);
    }
    Err(match status {
        STATUS_RUNTIME_ERROR => RegistrationError::Runtime("no reason given".to_string()),
        STATUS_LOGIC_ERROR => RegistrationError::Logic("no reason given".to_string()),
        STATUS_PANICKED => RegistrationError::Panicked("no reason given".to_string()),
        other => RegistrationError::Unknown(other),
    })
}

/// Extracts the message from a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn error_status(error: &RegistrationError) -> i32 {
    match error {
        RegistrationError::Runtime(_) => STATUS_RUNTIME_ERROR,
        RegistrationError::Logic(_) => STATUS_LOGIC_ERROR,
        RegistrationError::Panicked(_) => STATUS_PANICKED,
        RegistrationError::Unknown(code) => *code,
    }
}
