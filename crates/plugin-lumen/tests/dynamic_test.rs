//! Loads the built lumen shared library through the dynamic loader.

#![cfg(target_os = "linux")]

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fs;
use std::path::PathBuf;

use zonewatch_plugin::{Frame, LoadFailure, ManagerSettings, PluginManager, PluginState};

/// The cdylib cargo builds next to this test binary.
fn built_plugin() -> PathBuf {
    let name = format!("{DLL_PREFIX}plugin_lumen{DLL_SUFFIX}");
    let exe = std::env::current_exe().expect("test binary path");
    let deps = exe.parent().expect("deps dir");
    [deps.join(&name), deps.join("..").join(&name)]
        .into_iter()
        .find(|p| p.is_file())
        .unwrap_or_else(|| panic!("{name} not built next to {}", deps.display()))
}

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

fn manager() -> PluginManager {
    PluginManager::new(
        ManagerSettings {
            load_plugins: true,
            extension: DLL_SUFFIX.to_string(),
        },
        zonewatch_plugin::DynamicLoader::new(),
    )
}

#[test]
fn test_shared_library_registers_through_entry_point() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::copy(built_plugin(), dir.path().join(format!("lumen{DLL_SUFFIX}"))).expect("copy plugin");
    let settings = dir.path().join("plugins.toml");
    fs::write(&settings, "[plugins.lumen.options]\nthreshold = \"100\"\n").expect("write settings");

    let mut manager = manager();
    let report = manager.find_plugins(dir.path(), false);

    assert_eq!((report.discovered, report.loaded), (1, 1));
    assert!(report.failures.is_empty());
    assert_eq!(manager.registry().state("lumen"), Some(PluginState::Registered));
    assert!(manager.registry().has_module("lumen"));
    assert_eq!(
        manager.general_config_of("lumen").unwrap().options["direction"],
        "above"
    );

    assert_eq!(manager.configure_plugins(&settings, false).unwrap(), 1);
    let bright = vec![200u8; 4];
    let frame = Frame::new(2, 2, &bright).unwrap();
    let hits = manager.analyse(&frame, "hall", false);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].plugin, "lumen");

    let again = manager.find_plugins(dir.path(), true);
    assert_eq!(again.loaded, 1);
    assert!(again.failures.is_empty());
}

#[test]
fn test_library_without_entry_point_fails_beside_good_plugin() {
    let Some(libm) = system_libm() else {
        eprintln!("libm.so.6 not found, skipping");
        return;
    };
    let dir = tempfile::tempdir().expect("temp dir");
    fs::copy(built_plugin(), dir.path().join(format!("lumen{DLL_SUFFIX}"))).expect("copy plugin");
    fs::copy(&libm, dir.path().join(format!("m{DLL_SUFFIX}"))).expect("copy libm");

    let mut manager = manager();
    let report = manager.find_plugins(dir.path(), false);

    assert_eq!((report.discovered, report.loaded), (2, 1));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].identity.as_str(), "m");
    assert_eq!(report.failures[0].error.failure(), LoadFailure::MissingEntryPoint);
    assert!(manager.is_registered("lumen"));
    assert_eq!(
        manager.registry().state("m"),
        Some(PluginState::Failed(LoadFailure::MissingEntryPoint))
    );

    let names: Vec<String> = manager
        .general_config()
        .into_iter()
        .map(|(identity, _)| identity.to_string())
        .collect();
    assert_eq!(names, vec!["lumen", "m"]);
}
