// ==========================================
// Open Food Facts 导入工具 - 配置层
// ==========================================
// 职责: 入口程序配置（数据库路径、CSV 路径、列位置）
// ==========================================

pub mod import_config;

// 重导出核心配置
pub use import_config::{config_keys, default_db_path, CsvLayout, ImportConfig};
