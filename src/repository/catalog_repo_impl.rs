// ==========================================
// Open Food Facts 导入工具 - 商品目录 Repository 实现
// ==========================================
// 职责: 实现 CatalogRepository（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 所有值一律参数化；表名只来自 NamedEntity::TABLE 常量
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::catalog::{
    validate_name, Allergen, Brand, Category, Ingredient, NamedEntity, NewProduct, Product,
};
use crate::domain::import::ImportBatch;
use crate::domain::types::NutritionGrade;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use tracing::debug;

// ==========================================
// SqliteCatalogRepository
// ==========================================
// 独占一个连接：导入期间会话归导入器所有，不跨线程共享
pub struct SqliteCatalogRepository {
    conn: Connection,
}

impl SqliteCatalogRepository {
    /// 打开数据库文件并初始化 schema
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e))
        })?;
        Self::from_connection(conn)
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// 从已有连接创建
    ///
    /// 说明：会再次应用统一 PRAGMA 并建表（均幂等）。
    pub fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// 底层连接（只读查询用）
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn control(&self, sql: &str) -> RepositoryResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| RepositoryError::DatabaseTransactionError(format!("{}: {}", sql, e)))
    }

    /// 加载商品关联的查找实体（配料/过敏原），按关联写入顺序返回
    fn load_links<E: NamedEntity>(
        &self,
        link_table: &str,
        fk_column: &str,
        product_id: i64,
    ) -> RepositoryResult<Vec<E>> {
        let sql = format!(
            "SELECT e.id, e.name FROM {link} l JOIN {table} e ON e.id = l.{fk} \
             WHERE l.product_id = ?1 ORDER BY l.rowid",
            link = link_table,
            table = E::TABLE,
            fk = fk_column,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![product_id], |row| {
                Ok(E::from_parts(row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert_links<E: NamedEntity>(
        &self,
        link_table: &str,
        fk_column: &str,
        product_id: i64,
        entities: &[E],
    ) -> RepositoryResult<()> {
        let sql = format!(
            "INSERT OR IGNORE INTO {link} (product_id, {fk}) VALUES (?1, ?2)",
            link = link_table,
            fk = fk_column,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        for entity in entities {
            stmt.execute(params![product_id, entity.id()])?;
        }
        Ok(())
    }
}

fn check_savepoint_name(name: &str) -> RepositoryResult<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RepositoryError::InternalError(format!(
            "非法保存点名称: {}",
            name
        )));
    }
    Ok(())
}

fn check_name(field: &str, name: &str) -> RepositoryResult<()> {
    validate_name(name).map_err(|message| RepositoryError::FieldValueError {
        field: field.to_string(),
        message,
    })
}

/// 按 id 去重并保持首次出现顺序
fn dedup_by_id<E: NamedEntity + Clone>(entities: &[E]) -> Vec<E> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .filter(|e| seen.insert(e.id()))
        .cloned()
        .collect()
}

fn parse_timestamp(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InternalError(format!("时间格式错误 ({}): {}", raw, e)))
}

impl CatalogRepository for SqliteCatalogRepository {
    // ===== 事务控制 =====

    fn begin(&mut self) -> RepositoryResult<()> {
        if self.in_transaction() {
            return Err(RepositoryError::DatabaseTransactionError(
                "事务已开启".to_string(),
            ));
        }
        // IMMEDIATE: 开始即持有写锁，避免导入中途才遇到 busy
        self.control("BEGIN IMMEDIATE")
    }

    fn commit(&mut self) -> RepositoryResult<()> {
        if !self.in_transaction() {
            return Err(RepositoryError::DatabaseTransactionError(
                "没有进行中的事务".to_string(),
            ));
        }
        self.control("COMMIT")
    }

    fn rollback(&mut self) -> RepositoryResult<()> {
        if !self.in_transaction() {
            return Err(RepositoryError::DatabaseTransactionError(
                "没有进行中的事务".to_string(),
            ));
        }
        self.control("ROLLBACK")
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn savepoint(&mut self, name: &str) -> RepositoryResult<()> {
        check_savepoint_name(name)?;
        self.control(&format!("SAVEPOINT {}", name))
    }

    fn release_savepoint(&mut self, name: &str) -> RepositoryResult<()> {
        check_savepoint_name(name)?;
        self.control(&format!("RELEASE SAVEPOINT {}", name))
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> RepositoryResult<()> {
        check_savepoint_name(name)?;
        // ROLLBACK TO 不会移除保存点，需再 RELEASE
        self.control(&format!(
            "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name};",
            name = name
        ))
    }

    // ===== 查找实体 =====

    fn find_by_name<E: NamedEntity>(&self, name: &str) -> RepositoryResult<Option<E>> {
        let sql = format!("SELECT id, name FROM {} WHERE name = ?1", E::TABLE);
        let found = self
            .conn
            .query_row(&sql, params![name], |row| {
                Ok(E::from_parts(row.get(0)?, row.get(1)?))
            })
            .optional()?;
        Ok(found)
    }

    fn save_named<E: NamedEntity>(&mut self, name: &str) -> RepositoryResult<E> {
        check_name(E::TABLE, name)?;

        let sql = format!("INSERT INTO {} (name) VALUES (?1)", E::TABLE);
        self.conn.execute(&sql, params![name])?;
        let id = self.conn.last_insert_rowid();

        debug!(entity = E::LABEL, id, name, "新建实体");
        Ok(E::from_parts(id, name.to_string()))
    }

    fn count<E: NamedEntity>(&self) -> RepositoryResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        let count = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    // ===== 商品 =====

    fn save_product(&mut self, product: &NewProduct) -> RepositoryResult<Product> {
        check_name("product", &product.name)?;

        self.conn.execute(
            r#"
            INSERT INTO product (name, nutrition_grade, brand_id, category_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                product.name,
                product.nutrition_grade.as_str(),
                product.brand.id,
                product.category.id,
            ],
        )?;
        let product_id = self.conn.last_insert_rowid();

        let ingredients = dedup_by_id(&product.ingredients);
        let allergens = dedup_by_id(&product.allergens);
        self.insert_links("product_ingredient", "ingredient_id", product_id, &ingredients)?;
        self.insert_links("product_allergen", "allergen_id", product_id, &allergens)?;

        Ok(Product {
            id: product_id,
            name: product.name.clone(),
            nutrition_grade: product.nutrition_grade,
            brand: product.brand.clone(),
            category: product.category.clone(),
            ingredients,
            allergens,
        })
    }

    fn find_product_by_name(&self, name: &str) -> RepositoryResult<Option<Product>> {
        let head = self
            .conn
            .query_row(
                r#"
                SELECT p.id, p.name, p.nutrition_grade, b.id, b.name, c.id, c.name
                FROM product p
                JOIN brand b ON b.id = p.brand_id
                JOIN category c ON c.id = p.category_id
                WHERE p.name = ?1
                "#,
                params![name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        Brand::from_parts(row.get(3)?, row.get(4)?),
                        Category::from_parts(row.get(5)?, row.get(6)?),
                    ))
                },
            )
            .optional()?;

        let Some((id, name, grade_raw, brand, category)) = head else {
            return Ok(None);
        };

        let nutrition_grade: NutritionGrade = grade_raw
            .parse()
            .map_err(|e| RepositoryError::InternalError(format!("product {}: {}", id, e)))?;

        Ok(Some(Product {
            id,
            name,
            nutrition_grade,
            brand,
            category,
            ingredients: self.load_links::<Ingredient>("product_ingredient", "ingredient_id", id)?,
            allergens: self.load_links::<Allergen>("product_allergen", "allergen_id", id)?,
        }))
    }

    fn count_products(&self) -> RepositoryResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count)
    }

    fn delete_brand_with_products(&mut self, brand_id: i64) -> RepositoryResult<usize> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM brand WHERE id = ?1", params![brand_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(RepositoryError::NotFound {
                entity: Brand::LABEL.to_string(),
                id: brand_id.to_string(),
            });
        }

        // 保存点可嵌套在外层事务内，也可单独使用
        let sp = self.conn.savepoint()?;
        sp.execute(
            "DELETE FROM product_ingredient WHERE product_id IN (SELECT id FROM product WHERE brand_id = ?1)",
            params![brand_id],
        )?;
        sp.execute(
            "DELETE FROM product_allergen WHERE product_id IN (SELECT id FROM product WHERE brand_id = ?1)",
            params![brand_id],
        )?;
        let removed = sp.execute("DELETE FROM product WHERE brand_id = ?1", params![brand_id])?;
        sp.execute("DELETE FROM brand WHERE id = ?1", params![brand_id])?;
        sp.commit()?;

        debug!(brand_id, removed, "品牌及其商品已删除");
        Ok(removed)
    }

    // ===== 批次管理 =====

    fn insert_batch(&mut self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_path, total_rows, imported_rows, skipped_rows,
                failed_rows, imported_at, elapsed_ms, summary_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                batch.batch_id,
                batch.file_path,
                batch.total_rows,
                batch.imported_rows,
                batch.skipped_rows,
                batch.failed_rows,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
                batch.summary_json,
            ],
        )?;
        Ok(())
    }

    fn recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT batch_id, file_path, total_rows, imported_rows, skipped_rows,
                   failed_rows, imported_at, elapsed_ms, summary_json
            FROM import_batch
            ORDER BY imported_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let raw_rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows
            .into_iter()
            .map(
                |(batch_id, file_path, total, imported, skipped, failed, at, elapsed_ms, summary_json)| {
                    Ok(ImportBatch {
                        batch_id,
                        file_path,
                        total_rows: total,
                        imported_rows: imported,
                        skipped_rows: skipped,
                        failed_rows: failed,
                        imported_at: parse_timestamp(&at)?,
                        elapsed_ms,
                        summary_json,
                    })
                },
            )
            .collect()
    }
}
