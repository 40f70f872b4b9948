// ==========================================
// Open Food Facts 导入工具 - 商品目录 Repository Trait
// ==========================================
// 职责: 定义导入所需的持久化边界（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD + 事务控制
// ==========================================

use crate::domain::catalog::{NamedEntity, NewProduct, Product};
use crate::domain::import::ImportBatch;
use crate::repository::error::RepositoryResult;

// ==========================================
// CatalogRepository Trait
// ==========================================
// 用途: 导入器依赖的唯一持久化接口
// 实现者: SqliteCatalogRepository（使用 rusqlite）
pub trait CatalogRepository {
    // ===== 事务控制 =====

    /// 开启事务（整个导入共用一个事务）
    fn begin(&mut self) -> RepositoryResult<()>;

    /// 提交事务
    fn commit(&mut self) -> RepositoryResult<()>;

    /// 回滚事务
    fn rollback(&mut self) -> RepositoryResult<()>;

    /// 是否处于事务中
    fn in_transaction(&self) -> bool;

    /// 创建保存点（用于单行原子性）
    fn savepoint(&mut self, name: &str) -> RepositoryResult<()>;

    /// 释放保存点（保留其中的写入）
    fn release_savepoint(&mut self, name: &str) -> RepositoryResult<()>;

    /// 回滚到保存点并释放
    fn rollback_to_savepoint(&mut self, name: &str) -> RepositoryResult<()>;

    // ===== 查找实体（按名称）=====

    /// 按名称精确匹配查找
    ///
    /// # 返回
    /// - Ok(Some(entity)): 找到
    /// - Ok(None): 不存在
    fn find_by_name<E: NamedEntity>(&self, name: &str) -> RepositoryResult<Option<E>>;

    /// 插入新实体（插入前校验名称约束）
    ///
    /// # 返回
    /// - Ok(entity): 带数据库分配 id 的实体
    /// - Err(UniqueConstraintViolation): 同名已存在
    /// - Err(FieldValueError): 名称为空或超长
    fn save_named<E: NamedEntity>(&mut self, name: &str) -> RepositoryResult<E>;

    /// 统计实体数量
    fn count<E: NamedEntity>(&self) -> RepositoryResult<i64>;

    // ===== 商品 =====

    /// 插入商品及其配料/过敏原关联
    fn save_product(&mut self, product: &NewProduct) -> RepositoryResult<Product>;

    /// 按名称查找商品（含品牌、分类、配料、过敏原）
    fn find_product_by_name(&self, name: &str) -> RepositoryResult<Option<Product>>;

    /// 统计商品数量
    fn count_products(&self) -> RepositoryResult<i64>;

    /// 删除品牌及其全部商品（含关联表记录）
    ///
    /// # 返回
    /// - Ok(usize): 被删除的商品数
    /// - Err(NotFound): 品牌不存在
    fn delete_brand_with_products(&mut self, brand_id: i64) -> RepositoryResult<usize>;

    // ===== 批次管理 =====

    /// 插入导入批次记录
    fn insert_batch(&mut self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 查询最近的导入批次（按导入时间倒序）
    fn recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
