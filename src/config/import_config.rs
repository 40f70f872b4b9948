// ==========================================
// Open Food Facts 导入工具 - 导入配置
// ==========================================
// 来源: 环境变量 + 默认值（无配置文件、无命令行参数）
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 环境变量键
pub mod config_keys {
    /// SQLite 数据库文件路径
    pub const DB_PATH: &str = "FOOD_IMPORT_DB_PATH";
    /// 待导入的 CSV 文件路径
    pub const CSV_PATH: &str = "FOOD_IMPORT_CSV_PATH";
}

/// 默认 CSV 文件（当前目录）
pub const DEFAULT_CSV_PATH: &str = "./open-food-facts.csv";

/// 默认数据库文件名
pub const DEFAULT_DB_FILE: &str = "food_facts.db";

// ==========================================
// CsvLayout - 列位置约定
// ==========================================
// 红线: 列位置固定，不按表头映射；列顺序不同的文件会被错误映射
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvLayout {
    pub delimiter: u8,      // 字段分隔符
    pub min_columns: usize, // 最少列数，不足则跳过该行
    pub category: usize,    // 分类名
    pub brand: usize,       // 品牌名
    pub product: usize,     // 商品名
    pub nutrition_grade: usize, // 营养评分
    pub ingredients: usize, // 配料文本
    pub allergens: usize,   // 过敏原文本
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            delimiter: b'|',
            min_columns: 30,
            category: 0,
            brand: 1,
            product: 2,
            nutrition_grade: 3,
            ingredients: 4,
            allergens: 28,
        }
    }
}

// ==========================================
// ImportConfig - 入口程序配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub db_path: String,
    pub csv_path: PathBuf,
    pub layout: CsvLayout,
}

impl ImportConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（空白值视为未设置）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            db_path: read(config_keys::DB_PATH).unwrap_or_else(default_db_path),
            csv_path: read(config_keys::CSV_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH)),
            layout: CsvLayout::default(),
        }
    }
}

/// 默认数据库路径
///
/// 优先使用用户数据目录，获取不到时回退到当前目录。
pub fn default_db_path() -> String {
    let mut path = PathBuf::from(".").join(DEFAULT_DB_FILE);

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("food-facts-import");
        // 目录创建失败时沿用当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DEFAULT_DB_FILE);
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_layout_defaults_match_open_food_facts_export() {
        let layout = CsvLayout::default();
        assert_eq!(layout.delimiter, b'|');
        assert_eq!(layout.min_columns, 30);
        assert_eq!(layout.allergens, 28);
        assert!(layout.allergens < layout.min_columns);
    }

    #[test]
    fn test_from_lookup_uses_explicit_values() {
        let env: HashMap<&str, &str> = [
            (config_keys::DB_PATH, "/tmp/foods.db"),
            (config_keys::CSV_PATH, " /data/off.csv "),
        ]
        .into_iter()
        .collect();

        let config = ImportConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.db_path, "/tmp/foods.db");
        assert_eq!(config.csv_path, PathBuf::from("/data/off.csv"));
    }

    #[test]
    fn test_from_lookup_ignores_blank_values() {
        let config = ImportConfig::from_lookup(|k| {
            (k == config_keys::CSV_PATH).then(|| "   ".to_string())
        });
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert!(config.db_path.ends_with(DEFAULT_DB_FILE));
    }
}
