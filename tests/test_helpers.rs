// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、临时 CSV 文件、测试行生成
// ==========================================

#![allow(dead_code)]

use food_facts_import::SqliteCatalogRepository;
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

/// CSV 表头（30 列）
pub const HEADER: &str = "categorie|marque|nom|nutrition_grade|ingredients|c05|c06|c07|c08|c09|c10|c11|c12|c13|c14|c15|c16|c17|c18|c19|c20|c21|c22|c23|c24|c25|c26|c27|allergenes|c29";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    // 打开即建表
    SqliteCatalogRepository::open(&db_path)?;

    Ok((temp_file, db_path))
}

/// 生成一行 30 列的数据行
pub fn food_row(
    category: &str,
    brand: &str,
    product: &str,
    grade: &str,
    ingredients: &str,
    allergens: &str,
) -> String {
    let mut fields = vec![String::new(); 30];
    fields[0] = category.to_string();
    fields[1] = brand.to_string();
    fields[2] = product.to_string();
    fields[3] = grade.to_string();
    fields[4] = ingredients.to_string();
    fields[28] = allergens.to_string();
    fields.join("|")
}

/// 写入临时 CSV（自动加表头）
pub fn write_csv(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

/// 统计表行数
pub fn count_rows(db_path: &str, table: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}
