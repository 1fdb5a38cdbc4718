//! 配置驱动的场景运行器
//!
//! 按配置依次构建并运行各个夹具场景

use crate::bridge::{self, Binder};
use crate::config::FixtureConfig;
use crate::fixtures::{CounterFixture, NarrowFixture, NativeFixture, WideFixture};
use crate::types::Pair;
use crate::workload::CounterTrace;
use crate::{FixtureError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// 打印问候并运行带字段的夹具
    Hello,
    /// 二元组渲染与求和
    Template,
    /// 32 位试除法
    Narrow,
    /// 64 位试除法
    Wide,
    /// 调用全部本地方法
    Native,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Hello,
        Scenario::Template,
        Scenario::Narrow,
        Scenario::Wide,
        Scenario::Native,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Hello => "hello",
            Scenario::Template => "template",
            Scenario::Narrow => "narrow",
            Scenario::Wide => "wide",
            Scenario::Native => "native",
        }
    }

    /// 是否依赖本地库绑定
    pub fn requires_binding(self) -> bool {
        matches!(self, Scenario::Native)
    }
}

impl Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        Scenario::ALL
            .iter()
            .copied()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FixtureError::config(&format!("Unknown scenario: {}", s)))
    }
}

/// 场景运行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub success: bool,
    /// 场景产生的输出行
    pub output: Vec<String>,
    /// 负载类场景的累加结果
    pub value: Option<i64>,
    pub execution_time: Duration,
    pub error: Option<String>,
}

/// 一次运行的报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub bound_library: Option<String>,
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 场景运行器
pub struct ScenarioRunner {
    config: FixtureConfig,
    binder: Arc<Binder>,
    trace: Box<dyn CounterTrace>,
}

impl ScenarioRunner {
    /// 使用进程级绑定器
    pub fn new(config: FixtureConfig) -> Self {
        Self::with_binder(config, bridge::global())
    }

    pub fn with_binder(config: FixtureConfig, binder: Arc<Binder>) -> Self {
        let trace = config.workload.trace.sink();
        Self {
            config,
            binder,
            trace,
        }
    }

    /// 替换计数器追踪接收端
    pub fn with_trace(mut self, trace: Box<dyn CounterTrace>) -> Self {
        self.trace = trace;
        self
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// 运行配置中的全部场景
    ///
    /// 单个场景失败不会中断后续场景，失败记录在结果中。
    pub fn run(&mut self) -> Result<RunReport> {
        let scenarios = self
            .config
            .workload
            .scenarios
            .iter()
            .map(|name| Scenario::from_str(name))
            .collect::<Result<Vec<_>>>()?;
        if scenarios.is_empty() {
            return Err(FixtureError::scenario("No scenarios configured"));
        }

        let started_at = Utc::now();
        let results = scenarios
            .into_iter()
            .map(|scenario| self.run_scenario(scenario))
            .collect();

        Ok(RunReport {
            run_id: Uuid::new_v4(),
            started_at,
            bound_library: self.binder.bound_library(),
            results,
        })
    }

    /// 运行单个场景
    pub fn run_scenario(&mut self, scenario: Scenario) -> ScenarioResult {
        tracing::info!("▶️  Running scenario: {}", scenario);
        let start = Instant::now();
        let mut output = Vec::new();

        let outcome = match scenario {
            Scenario::Hello => self.hello(&mut output),
            Scenario::Template => self.template(&mut output),
            Scenario::Narrow => {
                let fixture = NarrowFixture::new(self.config.workload.bound);
                Ok(Some(fixture.test(self.trace.as_mut()) as i64))
            }
            Scenario::Wide => {
                let fixture = WideFixture::new(self.config.workload.bound);
                Ok(Some(fixture.test(self.trace.as_mut())))
            }
            Scenario::Native => self.native(&mut output),
        };

        let execution_time = start.elapsed();
        match outcome {
            Ok(value) => {
                if let Some(value) = value {
                    output.push(value.to_string());
                }
                ScenarioResult {
                    scenario,
                    success: true,
                    output,
                    value,
                    execution_time,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Scenario {} failed: {}", scenario, e);
                ScenarioResult {
                    scenario,
                    success: false,
                    output,
                    value: None,
                    execution_time,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn hello(&mut self, output: &mut Vec<String>) -> Result<Option<i64>> {
        output.push("Hello, World".to_string());
        let fixture = CounterFixture::new(self.config.workload.bound);
        Ok(Some(fixture.test(self.trace.as_mut())))
    }

    fn template(&self, output: &mut Vec<String>) -> Result<Option<i64>> {
        let s = Pair::new("foo".to_string(), "bar".to_string());
        let i = Pair::new(4i32, 2);

        output.push(format!("s: {}", s));
        output.push(format!("i: {}", i));
        output.push(format!("s.sum(): {}", s.sum()));
        output.push(format!("i.sum(): {}", i.sum()));
        Ok(Some(i.sum() as i64))
    }

    fn native(&mut self, output: &mut Vec<String>) -> Result<Option<i64>> {
        let fixture = NativeFixture::new(&self.binder)?;
        output.extend(fixture.exercise(1, "fnord")?);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ECHO_LIBRARY;
    use crate::config::BridgeConfig;
    use crate::workload::{CollectingTrace, TraceMode};

    fn config(bound: i64, scenarios: &[&str]) -> FixtureConfig {
        let mut config = FixtureConfig::default();
        config.workload.bound = bound;
        config.workload.trace = TraceMode::Silent;
        config.workload.scenarios = scenarios.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_scenario_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>().unwrap(), scenario);
        }
        assert_eq!(" Wide ".parse::<Scenario>().unwrap(), Scenario::Wide);
        assert!("jit".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_template_scenario() {
        let mut runner = ScenarioRunner::with_binder(config(0, &["template"]), Arc::new(Binder::new()));
        let report = runner.run().unwrap();
        let result = &report.results[0];
        assert!(result.success);
        assert_eq!(result.output[0], "s: foo, bar");
        assert_eq!(result.output[1], "i: 4, 2");
        assert_eq!(result.output[2], "s.sum(): foobar");
        assert_eq!(result.value, Some(6));
    }

    #[test]
    fn test_workload_scenarios() {
        let mut runner = ScenarioRunner::with_binder(
            config(10, &["hello", "narrow", "wide"]),
            Arc::new(Binder::new()),
        );
        let report = runner.run().unwrap();
        assert!(report.all_succeeded());
        assert_eq!(report.results[0].output[0], "Hello, World");
        for result in &report.results {
            assert_eq!(result.value, Some(26));
        }
    }

    #[test]
    fn test_run_single_scenario_with_custom_trace() {
        let binder = Arc::new(Binder::new());
        let mut runner = ScenarioRunner::with_binder(config(3, &["wide"]), binder)
            .with_trace(Box::new(CollectingTrace::default()));
        let result = runner.run_scenario(Scenario::Wide);
        assert!(result.success);
        assert_eq!(result.value, Some(-1));
    }

    #[test]
    fn test_native_scenario_fails_without_binding() {
        let mut runner = ScenarioRunner::with_binder(config(0, &["native", "template"]), Arc::new(Binder::new()));
        let report = runner.run().unwrap();
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.scenario, Scenario::Native);
        assert!(failure.error.as_ref().unwrap().contains("before the native library was bound"));
        assert!(report.results[1].success);
        assert_eq!(report.bound_library, None);
    }

    #[test]
    fn test_native_scenario_after_binding() {
        let binder = Arc::new(Binder::new());
        binder
            .bind(&BridgeConfig {
                library_name: ECHO_LIBRARY.to_string(),
                ..BridgeConfig::default()
            })
            .unwrap();
        let mut runner = ScenarioRunner::with_binder(config(0, &["native"]), binder);
        let report = runner.run().unwrap();
        assert!(report.all_succeeded());
        assert_eq!(report.bound_library.as_deref(), Some(ECHO_LIBRARY));
        assert_eq!(report.results[0].output.len(), 5);
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        let mut runner = ScenarioRunner::with_binder(config(0, &["bogus"]), Arc::new(Binder::new()));
        assert!(matches!(runner.run(), Err(FixtureError::Config { .. })));
    }

    #[test]
    fn test_empty_scenario_list_rejected() {
        let mut runner = ScenarioRunner::with_binder(config(0, &[]), Arc::new(Binder::new()));
        assert!(matches!(runner.run(), Err(FixtureError::Scenario { .. })));
    }

    #[test]
    fn test_report_to_json() {
        let mut runner = ScenarioRunner::with_binder(config(0, &["template"]), Arc::new(Binder::new()));
        let json = runner.run().unwrap().to_json().unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.results[0].scenario, Scenario::Template);
        assert!(json.contains("\"template\""));
    }
}
