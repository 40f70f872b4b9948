// ==========================================
// Open Food Facts 导入工具 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 把 `|` 分隔的食品 CSV 导入商品目录（商品/品牌/分类/配料/过敏原）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 入口程序配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::NutritionGrade;

// 领域实体
pub use domain::{
    Allergen, Brand, Category, ImportReport, ImportSummary, Ingredient, Product, RowOutcome,
    RowStatus, SkipReason,
};

// 导入器
pub use importer::{FoodCsvImporter, ImportError};

// 仓储
pub use repository::{CatalogRepository, RepositoryError, SqliteCatalogRepository};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Open Food Facts 导入工具";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
