//! Convenience macros for plugin development.

/// Exports a plugin's registration function as the native entry point.
///
/// The function must have the signature
/// `fn(&mut PluginRegistrar) -> Result<(), RegistrationError>`. Errors and
/// panics are converted into status codes before they reach the host.
///
/// # Example
/// ```rust,ignore
/// use zonewatch_plugin::prelude::*;
///
/// fn register(registrar: &mut PluginRegistrar) -> Result<(), RegistrationError> {
///     registrar.declare_option("threshold", "40", "Mean luminance that raises an alarm")?;
///     registrar.add_detector(Box::new(MyDetector::default()))
/// }
///
/// zonewatch_plugin::declare_plugin!(register);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($register:path) => {
        /// Registration entry point resolved by the Zonewatch host.
        ///
        /// # Safety
        /// `registrar` must be null or a valid, exclusive registrar pointer.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn zonewatch_plugin_register(
            registrar: *mut $crate::registrar::PluginRegistrar,
        ) -> i32 {
            // SAFETY: forwarded from this function's contract.
            unsafe { $crate::ffi::safety::invoke_register(registrar, $register) }
        }
    };
}
