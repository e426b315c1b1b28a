//! ABI definitions for dynamic plugins.
//!
//! A plugin module exports exactly one symbol, [`REGISTER_SYMBOL`], with the
//! [`RegisterPluginFn`] signature. The registrar is passed as an opaque
//! pointer and accessed through this crate's Rust API, so a plugin must be
//! built against the same `zonewatch-plugin` version and toolchain as the
//! host. Use [`declare_plugin!`](crate::declare_plugin) rather than writing
//! the export by hand.

use crate::registrar::PluginRegistrar;

/// Name of the registration entry point every plugin exports.
pub const REGISTER_SYMBOL: &str = "zonewatch_plugin_register";

/// Signature of the registration entry point.
///
/// ```c
/// int32_t zonewatch_plugin_register(PluginRegistrar *registrar);
/// ```
pub type RegisterPluginFn = unsafe extern "C" fn(registrar: *mut PluginRegistrar) -> i32;

/// Registration succeeded.
pub const STATUS_OK: i32 = 0;
/// The plugin raised a runtime error.
pub const STATUS_RUNTIME_ERROR: i32 = 1;
/// The plugin raised a logic error.
pub const STATUS_LOGIC_ERROR: i32 = 2;
/// The plugin panicked; the panic was caught inside the module.
pub const STATUS_PANICKED: i32 = 3;
/// The host passed a null registrar.
pub const STATUS_NULL_REGISTRAR: i32 = 4;
