// ==========================================
// Open Food Facts 导入工具 - 导入层
// ==========================================
// 职责: 外部 CSV 数据导入,生成商品目录数据
// 流程: 行解析 → 查找或创建 → 商品落库（单事务）
// ==========================================

// 模块声明
pub mod entity_resolver;
pub mod error;
pub mod food_importer;
pub mod row_parser;
pub mod text_splitter;

// 重导出核心类型
pub use entity_resolver::{find_or_create, find_or_create_all, Resolved};
pub use error::{ImportError, ImportResult};
pub use food_importer::{FoodCsvImporter, ROW_SAVEPOINT};
pub use row_parser::ProductRow;
pub use text_splitter::{split_allergens, split_ingredients, split_on_any};
