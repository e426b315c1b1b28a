//! Plugin loader: binds a module file into the process.
//!
//! The rest of the host only sees [`ModuleLoader`] and [`PluginModule`];
//! `libloading` stays behind the `dynamic` feature.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{LoadError, RegistrationError};
use crate::registrar::PluginRegistrar;

/// A loaded unit exposing the single registration operation.
pub trait PluginModule: Send {
    /// Installs the module's detectors and option schema through `registrar`.
    ///
    /// Called exactly once per module by the plugin manager.
    fn register(&mut self, registrar: &mut PluginRegistrar) -> Result<(), RegistrationError>;
}

impl<F> PluginModule for F
where
    F: FnMut(&mut PluginRegistrar) -> Result<(), RegistrationError> + Send,
{
    fn register(&mut self, registrar: &mut PluginRegistrar) -> Result<(), RegistrationError> {
        self(registrar)
    }
}

/// Opens module files.
pub trait ModuleLoader: Send + Sync {
    /// Binds the module at `path`; does not call its entry point.
    fn open(&self, path: &Path) -> Result<Box<dyn PluginModule>, LoadError>;
}

type ModuleFactory = Box<dyn Fn() -> Box<dyn PluginModule> + Send + Sync>;

/// Loader for modules compiled into the host, keyed by file name.
///
/// A discovered file whose name has no factory is reported as an invalid
/// module.
#[derive(Default)]
pub struct StaticLoader {
    factories: HashMap<String, ModuleFactory>,
}

impl StaticLoader {
    /// Creates an empty static loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module served for files named `file_name`.
    pub fn with_module<F>(mut self, file_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PluginModule> + Send + Sync + 'static,
    {
        self.insert(file_name, factory);
        self
    }

    /// Adds a module served for files named `file_name`.
    pub fn insert<F>(&mut self, file_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn PluginModule> + Send + Sync + 'static,
    {
        self.factories.insert(file_name.into(), Box::new(factory));
    }
}

impl fmt::Debug for StaticLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticLoader")
            .field("modules", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModuleLoader for StaticLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn PluginModule>, LoadError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        self.factories
            .get(file_name)
            .map(|factory| factory())
            .ok_or_else(|| LoadError::InvalidModule {
                path: path.to_path_buf(),
                reason: format!("no compiled-in module named '{file_name}'"),
            })
    }
}

/// Dynamic loader using `libloading` (feature-gated).
#[cfg(feature = "dynamic")]
pub mod dynamic_loader {
    use std::mem::ManuallyDrop;
    use std::path::{Path, PathBuf};

    use tracing::{debug, info};

    use super::{ModuleLoader, PluginModule};
    use crate::error::{LoadError, RegistrationError};
    use crate::ffi::abi::{REGISTER_SYMBOL, RegisterPluginFn};
    use crate::ffi::safety::status_to_result;
    use crate::registrar::PluginRegistrar;

    /// Loads plugin modules from shared libraries (.so / .dll / .dylib).
    #[derive(Debug, Default)]
    pub struct DynamicLoader;

    impl DynamicLoader {
        /// Creates a new dynamic loader.
        pub fn new() -> Self {
            Self
        }
    }

    /// A shared library bound into the process with its entry point resolved.
    struct DynamicModule {
        path: PathBuf,
        entry: RegisterPluginFn,
        // Never closed: detectors installed by the module point into its code.
        _library: ManuallyDrop<libloading::Library>,
    }

    impl ModuleLoader for DynamicLoader {
        fn open(&self, path: &Path) -> Result<Box<dyn PluginModule>, LoadError> {
            // SAFETY: loading runs the library's initialisers. Only trusted
            // plugin directories should be configured.
            let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
                LoadError::InvalidModule {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
            // Stays mapped even if the entry point is missing.
            let library = ManuallyDrop::new(library);

            // SAFETY: the symbol type matches the documented plugin ABI.
            let entry: RegisterPluginFn =
                match unsafe { library.get::<RegisterPluginFn>(REGISTER_SYMBOL.as_bytes()) } {
                    Ok(symbol) => *symbol,
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "Entry point lookup failed");
                        return Err(LoadError::MissingEntryPoint {
                            path: path.to_path_buf(),
                            symbol: REGISTER_SYMBOL.to_string(),
                        });
                    }
                };

            info!(path = %path.display(), "Plugin library bound");

            Ok(Box::new(DynamicModule {
                path: path.to_path_buf(),
                entry,
                _library: library,
            }))
        }
    }

    impl PluginModule for DynamicModule {
        fn register(&mut self, registrar: &mut PluginRegistrar) -> Result<(), RegistrationError> {
            debug!(path = %self.path.display(), "Invoking plugin entry point");
            // SAFETY: `registrar` is a unique live reference for the whole call.
            let raw: *mut PluginRegistrar = &mut *registrar;
            let status = unsafe { (self.entry)(raw) };
            status_to_result(status, registrar)
        }
    }
}

/// Stub loader when the `dynamic` feature is not enabled.
#[cfg(not(feature = "dynamic"))]
pub mod dynamic_loader {
    use std::path::Path;

    use super::{ModuleLoader, PluginModule};
    use crate::error::LoadError;

    /// Stub dynamic loader; every file is reported as not loadable.
    #[derive(Debug, Default)]
    pub struct DynamicLoader;

    impl DynamicLoader {
        /// Creates a stub loader.
        pub fn new() -> Self {
            Self
        }
    }

    impl ModuleLoader for DynamicLoader {
        fn open(&self, path: &Path) -> Result<Box<dyn PluginModule>, LoadError> {
            Err(LoadError::InvalidModule {
                path: path.to_path_buf(),
                reason: "built without the `dynamic` feature".to_string(),
            })
        }
    }
}

pub use dynamic_loader::DynamicLoader;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::identity::PluginIdentity;

    #[test]
    fn test_static_loader_serves_by_file_name() {
        let loader = StaticLoader::new().with_module("motion.so", || {
            Box::new(|r: &mut PluginRegistrar| -> Result<(), RegistrationError> {
                r.set_description("motion");
                Ok(())
            })
        });

        let mut module = loader
            .open(&PathBuf::from("/plugins/motion.so"))
            .expect("module");
        let mut registrar = PluginRegistrar::new(PluginIdentity::new("motion"));
        assert!(module.register(&mut registrar).is_ok());
    }

    #[test]
    fn test_static_loader_unknown_file_is_invalid() {
        let loader = StaticLoader::new();
        let err = loader.open(&PathBuf::from("/plugins/other.so")).err().unwrap();
        assert!(matches!(err, LoadError::InvalidModule { .. }));
    }

    #[cfg(feature = "dynamic")]
    #[test]
    fn test_dynamic_loader_rejects_non_library() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(format!("fake{}", std::env::consts::DLL_SUFFIX));
        std::fs::write(&path, b"definitely not an object file").expect("write");

        let err = DynamicLoader::new().open(&path).err().unwrap();
        assert_eq!(err.failure(), crate::error::LoadFailure::InvalidModule);
    }

    /// A shared library every glibc system ships, without our entry symbol.
    #[cfg(all(feature = "dynamic", target_os = "linux"))]
    fn system_libm() -> Option<PathBuf> {
        [
            "/lib/x86_64-linux-gnu/libm.so.6",
            "/usr/lib/x86_64-linux-gnu/libm.so.6",
            "/lib/aarch64-linux-gnu/libm.so.6",
            "/usr/lib/aarch64-linux-gnu/libm.so.6",
            "/lib64/libm.so.6",
            "/usr/lib64/libm.so.6",
            "/usr/lib/libm.so.6",
            "/lib/libm.so.6",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
    }

    #[cfg(all(feature = "dynamic", target_os = "linux"))]
    #[test]
    fn test_dynamic_loader_library_without_entry_point() {
        let Some(libm) = system_libm() else {
            eprintln!("libm.so.6 not found, skipping");
            return;
        };
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("m.so");
        std::fs::copy(&libm, &path).expect("copy libm");

        let err = DynamicLoader::new().open(&path).err().unwrap();
        assert_eq!(err.failure(), crate::error::LoadFailure::MissingEntryPoint);
        assert!(matches!(err, LoadError::MissingEntryPoint { ref symbol, .. } if symbol == "zonewatch_plugin_register"));
    }
}
