// ==========================================
// Open Food Facts 导入工具 - 主入口
// ==========================================
// 流程: 日志 → 配置 → 打开数据库 → 导入 → 输出汇总
// 连接归导入器所有，run() 返回时随所有权释放（成功/失败均释放）
// ==========================================

use anyhow::Context;
use food_facts_import::config::ImportConfig;
use food_facts_import::{logging, FoodCsvImporter, ImportReport, SqliteCatalogRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", food_facts_import::APP_NAME);
    tracing::info!("系统版本: {}", food_facts_import::VERSION);
    tracing::info!("==================================================");

    let config = ImportConfig::from_env();
    tracing::info!(db_path = %config.db_path, csv_path = %config.csv_path.display(), "加载配置");

    match run(&config) {
        Ok(report) => {
            println!("导入成功: {}", report.file_path);
            println!("未导入行数: {}", report.problem_rows().count());
            match serde_json::to_string_pretty(&report.summary) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!(error = %e, "汇总序列化失败"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "导入失败");
            // {:?} 输出完整错误链（设置 RUST_BACKTRACE 时附带调用栈）
            eprintln!("读写错误: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ImportConfig) -> anyhow::Result<ImportReport> {
    let repo = SqliteCatalogRepository::open(&config.db_path)
        .with_context(|| format!("无法打开数据库: {}", config.db_path))?;

    let mut importer = FoodCsvImporter::with_layout(repo, config.layout.clone());
    let report = importer
        .import_to_database(&config.csv_path)
        .with_context(|| format!("CSV 导入失败: {}", config.csv_path.display()))?;

    Ok(report)
}
