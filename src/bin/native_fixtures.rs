//! native_fixtures 主程序 - 配置驱动运行
//!
//! 启动顺序：加载配置 → 初始化日志 → 绑定本地库 → 运行场景

use anyhow::Context;
use native_fixtures::{
    bridge::{self, Binder},
    config::{generate_default_config_file, ConfigManager},
    runner::{RunReport, ScenarioRunner},
};
use std::env;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "native_fixtures.yaml";

/// 程序入口点
#[tokio::main]
async fn main() {
    // 运行主逻辑并处理错误
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            tracing::error!("❌ 程序运行失败: {:#}", e);
            eprintln!("native_fixtures: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// 主要逻辑函数，返回全部场景是否成功
async fn run_main() -> anyhow::Result<bool> {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run(ConfigManager::new_default()),
        2 => match args[1].as_str() {
            "init" => {
                generate_config_file().await?;
                Ok(true)
            }
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(true)
            }
            path => {
                if !Path::new(path).exists() {
                    anyhow::bail!(
                        "配置文件不存在: {} (使用 'native_fixtures init' 生成默认配置文件)",
                        path
                    );
                }
                let config_manager = ConfigManager::load_from_file(path)
                    .await
                    .with_context(|| format!("加载配置文件失败: {}", path))?;
                run(config_manager)
            }
        },
        _ => {
            print_usage();
            Ok(true)
        }
    }
}

/// 使用给定配置和进程级绑定器运行
fn run(config_manager: ConfigManager) -> anyhow::Result<bool> {
    run_with_binder(config_manager, bridge::global())
}

/// 绑定失败且 `bridge.required` 时在构建运行器之前返回错误
fn run_with_binder(config_manager: ConfigManager, binder: Arc<Binder>) -> anyhow::Result<bool> {
    let config = config_manager.get_config().clone();
    native_fixtures::initialize(&config.logging)?;
    config_manager.validate()?;

    tracing::info!("🚀 启动 native_fixtures");
    tracing::info!(
        "🔗 本地库: {} (类 {}, 搜索路径 {:?})",
        config.bridge.library_name,
        config.bridge.class_name,
        config.bridge.search_paths
    );

    // 绑定必须先于任何依赖它的构造
    match binder.bind(&config.bridge) {
        Ok(bound) => {
            tracing::info!("✅ 本地库绑定成功: {:?}", bound.source());
        }
        Err(e) if config.bridge.required => {
            return Err(e).context("本地库绑定失败，中止启动");
        }
        Err(e) => {
            tracing::warn!("⚠️  本地库绑定失败，依赖它的场景将报错: {}", e);
        }
    }

    let mut runner = ScenarioRunner::with_binder(config, binder);
    let report = runner.run()?;
    display_report(&report);

    Ok(report.all_succeeded())
}

/// 生成默认配置文件
async fn generate_config_file() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("📝 生成默认配置文件: {}", DEFAULT_CONFIG_FILE);

    generate_default_config_file(DEFAULT_CONFIG_FILE).await?;

    tracing::info!("✅ 配置文件生成完成");
    tracing::info!("🔧 请编辑配置文件后运行: native_fixtures {}", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// 显示运行结果
fn display_report(report: &RunReport) {
    tracing::info!("📈 运行结果 ({}):", report.run_id);

    for result in &report.results {
        if result.success {
            tracing::info!("  ✅ {} ({:?})", result.scenario, result.execution_time);
        } else {
            tracing::warn!(
                "  ❌ {}: {}",
                result.scenario,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        for line in &result.output {
            println!("{}", line);
        }
    }

    let failed = report.failures().count();
    if failed == 0 {
        tracing::info!("🎉 全部 {} 个场景运行完成", report.results.len());
    } else {
        tracing::warn!("{} / {} 个场景失败", failed, report.results.len());
    }
}

/// 打印使用说明
fn print_usage() {
    println!("native_fixtures 运行时夹具");
    println!();
    println!("用法:");
    println!("  native_fixtures                    # 使用默认配置运行");
    println!("  native_fixtures init               # 生成默认配置文件");
    println!("  native_fixtures <config_file>      # 使用指定配置文件运行 (.yaml/.toml/.json)");
    println!();
    println!("示例:");
    println!("  native_fixtures init");
    println!("  native_fixtures native_fixtures.yaml");
}

#[cfg(test)]
mod tests {
    use super::*;
    use native_fixtures::bridge::{ProviderRegistry, ECHO_LIBRARY};
    use native_fixtures::config::FixtureConfig;
    use native_fixtures::workload::TraceMode;
    use native_fixtures::FixtureError;

    fn config(library: &str, required: bool, search_path: &Path) -> ConfigManager {
        let mut config = FixtureConfig::default();
        config.bridge.library_name = library.to_string();
        config.bridge.required = required;
        config.bridge.search_paths = vec![search_path.to_path_buf()];
        config.workload.trace = TraceMode::Silent;
        config.workload.bound = 10;
        ConfigManager::from_config(config)
    }

    #[test]
    fn test_required_bind_failure_aborts_startup() {
        let dir = tempfile::tempdir().unwrap();
        let binder = Arc::new(Binder::with_registry(ProviderRegistry::new()));

        let err = run_with_binder(config("absent", true, dir.path()), binder.clone()).unwrap_err();
        let cause = err.downcast_ref::<FixtureError>().unwrap();
        assert!(cause.is_fatal());
        assert!(!binder.is_bound());
    }

    #[test]
    fn test_optional_bind_failure_only_fails_native_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let binder = Arc::new(Binder::with_registry(ProviderRegistry::new()));

        let all_succeeded = run_with_binder(config("absent", false, dir.path()), binder).unwrap();
        assert!(!all_succeeded);
    }

    #[test]
    fn test_successful_bind_runs_all_scenarios() {
        let dir = tempfile::tempdir().unwrap();
        let binder = Arc::new(Binder::new());

        let all_succeeded = run_with_binder(config(ECHO_LIBRARY, true, dir.path()), binder.clone()).unwrap();
        assert!(all_succeeded);
        assert_eq!(binder.bound_library().as_deref(), Some(ECHO_LIBRARY));
    }
}
