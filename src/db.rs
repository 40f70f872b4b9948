// ==========================================
// Open Food Facts 导入工具 - SQLite 连接与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键必须每个连接单独开启）
// - 统一 busy_timeout
// - 建表 DDL 集中在此处，仓储层只做 CRUD
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：不做自动迁移，旧库只告警。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句（幂等）
///
/// 名称约束与领域层保持一致：非空、唯一、最长 255 字符。
/// SQLite 的 length() 对 TEXT 按字符计数。
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 255)
);

CREATE TABLE IF NOT EXISTS brand (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 255)
);

CREATE TABLE IF NOT EXISTS ingredient (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 255)
);

CREATE TABLE IF NOT EXISTS allergen (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 255)
);

CREATE TABLE IF NOT EXISTS product (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 255),
    nutrition_grade TEXT NOT NULL CHECK (nutrition_grade IN ('A', 'B', 'C', 'D', 'E', 'F')),
    brand_id INTEGER NOT NULL REFERENCES brand(id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES category(id)
);

CREATE INDEX IF NOT EXISTS idx_product_brand ON product(brand_id);
CREATE INDEX IF NOT EXISTS idx_product_category ON product(category_id);

CREATE TABLE IF NOT EXISTS product_ingredient (
    product_id INTEGER NOT NULL REFERENCES product(id) ON DELETE CASCADE,
    ingredient_id INTEGER NOT NULL REFERENCES ingredient(id),
    PRIMARY KEY (product_id, ingredient_id)
);

CREATE TABLE IF NOT EXISTS product_allergen (
    product_id INTEGER NOT NULL REFERENCES product(id) ON DELETE CASCADE,
    allergen_id INTEGER NOT NULL REFERENCES allergen(id),
    PRIMARY KEY (product_id, allergen_id)
);

CREATE TABLE IF NOT EXISTS import_batch (
    batch_id TEXT PRIMARY KEY,
    file_path TEXT NOT NULL,
    total_rows INTEGER NOT NULL,
    imported_rows INTEGER NOT NULL,
    skipped_rows INTEGER NOT NULL,
    failed_rows INTEGER NOT NULL,
    imported_at TEXT NOT NULL,
    elapsed_ms INTEGER NOT NULL,
    summary_json TEXT
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 schema（若表已存在则跳过）
///
/// 旧版本库只记录告警，不做迁移。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    let existing = read_schema_version(conn)?;

    conn.execute_batch(SCHEMA_SQL)?;

    match existing {
        None => {
            conn.execute(
                "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
            info!(version = CURRENT_SCHEMA_VERSION, "数据库 schema 初始化完成");
        }
        Some(v) if v < CURRENT_SCHEMA_VERSION => {
            warn!(
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本过旧，可能缺少字段"
            );
        }
        Some(_) => {}
    }

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_schema_rejects_unknown_grade() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        conn.execute("INSERT INTO brand (name) VALUES ('Lu')", []).unwrap();
        conn.execute("INSERT INTO category (name) VALUES ('Biscuits')", []).unwrap();

        let result = conn.execute(
            "INSERT INTO product (name, nutrition_grade, brand_id, category_id) VALUES ('Prince', 'Z', 1, 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_rejects_empty_name() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute("INSERT INTO category (name) VALUES ('')", []);
        assert!(result.is_err());
    }
}
