// ==========================================
// Open Food Facts 导入工具 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、导入结果
// 红线: 不含数据访问逻辑,不含导入流程
// ==========================================

pub mod catalog;
pub mod import;
pub mod types;

// 重导出核心类型
pub use catalog::{
    validate_name, Allergen, Brand, Category, Ingredient, NamedEntity, NewProduct, Product,
    NAME_MAX_LEN,
};
pub use import::{ImportBatch, ImportReport, ImportSummary, RowOutcome, RowStatus, SkipReason};
pub use types::{InvalidNutritionGrade, NutritionGrade};
