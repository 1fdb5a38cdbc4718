//! 进程级绑定的完整生命周期
//!
//! 全局绑定只能发生一次，因此整个流程放在单个测试中。

use native_fixtures::bridge::{self, ECHO_LIBRARY};
use native_fixtures::config::{BridgeConfig, FixtureConfig};
use native_fixtures::runner::{Scenario, ScenarioRunner};
use native_fixtures::workload::TraceMode;
use native_fixtures::{FixtureError, NativeFixture, NativeMethods, NativeStub};

#[test]
fn test_global_binding_lifecycle() {
    let stub = NativeStub::new(bridge::global());
    assert!(!bridge::is_bound());
    assert!(matches!(stub.fnord(), Err(FixtureError::NotBound { .. })));
    assert!(matches!(
        NativeFixture::new(&bridge::global()),
        Err(FixtureError::NotBound { .. })
    ));

    let config = BridgeConfig {
        library_name: ECHO_LIBRARY.to_string(),
        ..BridgeConfig::default()
    };
    let bound = bridge::bind(&config).unwrap();
    assert_eq!(bound.library(), ECHO_LIBRARY);
    assert!(bridge::is_bound());
    assert_eq!(bridge::bound_library().as_deref(), Some(ECHO_LIBRARY));

    // 同名重复绑定返回同一结果
    let again = bridge::bind(&config).unwrap();
    assert!(std::sync::Arc::ptr_eq(&bound, &again));

    assert!(matches!(
        bridge::bind(&BridgeConfig::default()),
        Err(FixtureError::AlreadyBound { .. })
    ));

    assert_eq!(stub.fnord2_int(3).unwrap(), "fnord2(3)");

    let mut fixture_config = FixtureConfig::default();
    fixture_config.workload.trace = TraceMode::Silent;
    fixture_config.workload.bound = 10;
    let mut runner = ScenarioRunner::new(fixture_config);
    let report = runner.run().unwrap();
    assert!(report.all_succeeded());
    assert_eq!(report.results.len(), Scenario::ALL.len());
    assert_eq!(report.bound_library.as_deref(), Some(ECHO_LIBRARY));
}
