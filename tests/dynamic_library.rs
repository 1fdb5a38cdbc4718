//! 通过动态库绑定 `fnord` 工作区成员
//!
//! 先把 `fnord` 构建到独立的目标目录，再用空注册表绑定，确保实现来自动态库。

use native_fixtures::bridge::{Binder, DynamicLoader, ProviderRegistry, ProviderSource};
use native_fixtures::config::BridgeConfig;
use native_fixtures::{FixtureError, NativeMethods};
use std::path::PathBuf;
use std::process::Command;

fn build_fnord() -> PathBuf {
    let target_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("fnord-target");
    let status = Command::new(env!("CARGO"))
        .args(["build", "--quiet", "-p", "fnord", "--manifest-path"])
        .arg(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))
        .arg("--target-dir")
        .arg(&target_dir)
        .status()
        .expect("failed to spawn cargo");
    assert!(status.success(), "building fnord failed");

    let dir = target_dir.join("debug");
    assert!(dir.join(DynamicLoader::file_name("fnord")).is_file());
    dir
}

fn config(search_path: PathBuf) -> BridgeConfig {
    BridgeConfig {
        search_paths: vec![search_path],
        ..BridgeConfig::default()
    }
}

#[test]
fn test_bind_fnord_cdylib() {
    let dir = build_fnord();

    let binder = Binder::with_registry(ProviderRegistry::new());
    let bound = binder.bind(&config(dir.clone())).unwrap();
    assert_eq!(bound.library(), "fnord");
    match bound.source() {
        ProviderSource::DynamicLibrary(path) => {
            assert_eq!(path, &dir.join(DynamicLoader::file_name("fnord")))
        }
        other => panic!("expected a dynamic library, got {:?}", other),
    }

    let methods = bound.methods();
    methods.fnord().unwrap();
    methods.fnord_int(1).unwrap();
    methods.fnord_int_text(2, "hello").unwrap();
    assert_eq!(methods.fnord2().unwrap(), "fnord2()");
    assert_eq!(methods.fnord2_int(5).unwrap(), "fnord2(5)");
    assert_eq!(methods.fnord2_int(-7).unwrap(), "fnord2(-7)");

    let err = methods.fnord_int_text(3, "nul\0inside").unwrap_err();
    assert!(matches!(err, FixtureError::Native { .. }));

    // 默认注册表中的内置提供者不会遮蔽默认库名
    let with_builtins = Binder::new();
    let bound = with_builtins.bind(&config(dir)).unwrap();
    assert!(matches!(bound.source(), ProviderSource::DynamicLibrary(_)));
}

#[test]
fn test_class_name_mismatch_reports_missing_symbol() {
    let dir = build_fnord();

    let binder = Binder::with_registry(ProviderRegistry::new());
    let cfg = BridgeConfig {
        class_name: "Other".to_string(),
        ..config(dir)
    };
    let err = binder.bind(&cfg).unwrap_err();
    assert!(matches!(err, FixtureError::SymbolMissing { .. }));
    assert!(err.is_fatal());
    assert!(!binder.is_bound());
}
