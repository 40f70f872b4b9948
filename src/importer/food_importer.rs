// ==========================================
// Open Food Facts 导入工具 - CSV 导入器
// ==========================================
// 流程: 打开文件 → 开启事务 → 逐行(解析 → 查重 → 分类/品牌 → 配料/过敏原 → 商品) → 批次记录 → 提交
// 事务策略:
// - 整个文件一个事务，结束时一次提交；致命错误整体回滚
// - 每行一个保存点；行级失败回滚到保存点，不留半行数据
// ==========================================

use crate::config::CsvLayout;
use crate::domain::catalog::{Allergen, Brand, Category, Ingredient, NewProduct, Product};
use crate::domain::import::{
    ImportBatch, ImportReport, ImportSummary, RowOutcome, RowStatus, SkipReason,
};
use crate::importer::entity_resolver::{find_or_create, find_or_create_all};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_parser::ProductRow;
use crate::repository::{CatalogRepository, RepositoryError, RepositoryResult};
use chrono::Utc;
use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 单行保存点名称
pub const ROW_SAVEPOINT: &str = "food_row";

/// 单行新建实体计数（只在该行提交后计入汇总）
#[derive(Debug, Default, Clone, Copy)]
struct RowCreations {
    categories: usize,
    brands: usize,
    ingredients: usize,
    allergens: usize,
}

impl ImportSummary {
    fn absorb(&mut self, created: RowCreations) {
        self.categories_created += created.categories;
        self.brands_created += created.brands;
        self.ingredients_created += created.ingredients;
        self.allergens_created += created.allergens;
    }
}

// ==========================================
// FoodCsvImporter - 食品 CSV 导入器
// ==========================================
// 导入期间独占持久化会话
pub struct FoodCsvImporter<R>
where
    R: CatalogRepository,
{
    repo: R,
    layout: CsvLayout,
}

impl<R> FoodCsvImporter<R>
where
    R: CatalogRepository,
{
    /// 使用默认列布局创建导入器
    pub fn new(repo: R) -> Self {
        Self::with_layout(repo, CsvLayout::default())
    }

    /// 使用指定列布局创建导入器
    pub fn with_layout(repo: R, layout: CsvLayout) -> Self {
        Self { repo, layout }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// 取回持久化会话
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// 导入 CSV 文件到数据库
    ///
    /// # 参数
    /// - file_path: `|` 分隔的 CSV 文件，第一行为表头
    ///
    /// # 返回
    /// - Ok(ImportReport): 已提交；包含逐行结果与汇总
    /// - Err(ImportError): 文件不可读/为空，或出现不可恢复的数据库错误（已回滚）
    #[instrument(skip(self, file_path), fields(batch_id = tracing::field::Empty))]
    pub fn import_to_database<P: AsRef<Path>>(&mut self, file_path: P) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        let file_path_str = path.display().to_string();
        let start_time = Instant::now();
        let started_at = Utc::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(file_path = %file_path_str, "开始导入 CSV");

        let mut reader = self.open_reader(path)?;

        self.repo.begin().map_err(ImportError::Transaction)?;

        let (rows, summary) = match self.import_rows(&mut reader) {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "导入中止");
                self.rollback_after_failure();
                return Err(e);
            }
        };

        let report = ImportReport {
            batch_id,
            file_path: file_path_str,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: start_time.elapsed().as_millis() as i64,
            summary,
            rows,
        };

        if let Err(e) = self.record_batch(&report) {
            error!(error = %e, "批次记录写入失败");
            self.rollback_after_failure();
            return Err(e);
        }

        if let Err(e) = self.repo.commit() {
            error!(error = %e, "事务提交失败");
            self.rollback_after_failure();
            return Err(ImportError::Transaction(e));
        }

        info!(
            total = report.summary.total_rows,
            imported = report.summary.imported,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            elapsed_ms = report.elapsed_ms,
            "导入完成"
        );

        Ok(report)
    }

    /// 打开 CSV 并读取表头
    fn open_reader(&self, path: &Path) -> ImportResult<Reader<File>> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ImportError::FileNotFound(path.display().to_string()),
            _ => ImportError::FileReadError(format!("{}: {}", path.display(), e)),
        })?;

        if file.metadata()?.len() == 0 {
            return Err(ImportError::EmptyFile(path.display().to_string()));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.layout.delimiter)
            .has_headers(true)
            .flexible(true) // 允许行长度不一致，列数不足的行逐行跳过
            .from_reader(file);

        // 只有空行的文件没有表头
        if reader.headers()?.is_empty() {
            return Err(ImportError::EmptyFile(path.display().to_string()));
        }

        Ok(reader)
    }

    /// 逐行处理；只有致命错误返回 Err
    fn import_rows(
        &mut self,
        reader: &mut Reader<File>,
    ) -> ImportResult<(Vec<RowOutcome>, ImportSummary)> {
        let mut rows = Vec::new();
        let mut summary = ImportSummary::default();
        let mut last_line = 1usize;

        for result in reader.records() {
            let (line_number, status, created) = match result {
                Ok(record) => {
                    let line_number = record
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(last_line + 1);
                    let (status, created) = self.process_row(&record, line_number)?;
                    (line_number, status, created)
                }
                Err(e) if e.is_io_error() => return Err(ImportError::from(e)),
                Err(e) => {
                    // 非法 UTF-8 等记录级错误：跳过该行，读取器可继续
                    let line_number = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(last_line + 1);
                    let status = RowStatus::Failed {
                        message: e.to_string(),
                    };
                    (line_number, status, RowCreations::default())
                }
            };
            last_line = line_number;

            match &status {
                RowStatus::Imported {
                    product_id,
                    product_name,
                } => {
                    debug!(line = line_number, product_id, product = %product_name, "行导入成功");
                    summary.absorb(created);
                }
                RowStatus::Skipped { reason } => {
                    warn!(line = line_number, reason = %reason, "行已跳过");
                }
                RowStatus::Failed { message } => {
                    warn!(line = line_number, error = %message, "行处理失败");
                }
            }

            summary.record(&status);
            rows.push(RowOutcome {
                line_number,
                status,
            });
        }

        Ok((rows, summary))
    }

    /// 处理一行
    ///
    /// # 返回
    /// - Ok((RowStatus, RowCreations)): 导入/跳过/失败（行级问题不上抛）
    /// - Err: 分类/品牌解析或保存点失败，需整体回滚
    fn process_row(
        &mut self,
        record: &StringRecord,
        line_number: usize,
    ) -> ImportResult<(RowStatus, RowCreations)> {
        let row = match ProductRow::parse(record, &self.layout) {
            Ok(row) => row,
            Err(reason) => return Ok((RowStatus::Skipped { reason }, RowCreations::default())),
        };

        match self.repo.find_product_by_name(&row.product_name) {
            Ok(Some(_)) => {
                let reason = SkipReason::DuplicateProduct {
                    name: row.product_name,
                };
                return Ok((RowStatus::Skipped { reason }, RowCreations::default()));
            }
            Ok(None) => {}
            Err(e) => {
                let status = RowStatus::Failed {
                    message: e.to_string(),
                };
                return Ok((status, RowCreations::default()));
            }
        }

        let abort = |e: RepositoryError| ImportError::aborted(line_number, e);

        self.repo.savepoint(ROW_SAVEPOINT).map_err(abort)?;

        let mut created = RowCreations::default();

        let category = find_or_create::<Category, R>(&mut self.repo, &row.category_name).map_err(abort)?;
        if category.created {
            created.categories += 1;
        }

        let brand = find_or_create::<Brand, R>(&mut self.repo, &row.brand_name).map_err(abort)?;
        if brand.created {
            created.brands += 1;
        }

        match self.persist_product(&row, category.entity, brand.entity, &mut created) {
            Ok(product) => {
                self.repo.release_savepoint(ROW_SAVEPOINT).map_err(abort)?;
                let status = RowStatus::Imported {
                    product_id: product.id,
                    product_name: product.name,
                };
                Ok((status, created))
            }
            Err(e) => {
                self.repo.rollback_to_savepoint(ROW_SAVEPOINT).map_err(abort)?;
                let status = RowStatus::Failed {
                    message: e.to_string(),
                };
                Ok((status, RowCreations::default()))
            }
        }
    }

    /// 解析配料/过敏原并写入商品
    fn persist_product(
        &mut self,
        row: &ProductRow,
        category: Category,
        brand: Brand,
        created: &mut RowCreations,
    ) -> RepositoryResult<Product> {
        let (ingredients, new_ingredients) =
            find_or_create_all::<Ingredient, R>(&mut self.repo, &row.ingredients)?;
        created.ingredients += new_ingredients;

        let (allergens, new_allergens) =
            find_or_create_all::<Allergen, R>(&mut self.repo, &row.allergens)?;
        created.allergens += new_allergens;

        let product = self.repo.save_product(&NewProduct {
            name: row.product_name.clone(),
            nutrition_grade: row.nutrition_grade,
            brand,
            category,
            ingredients,
            allergens,
        })?;
        debug!(product = %product, "商品已写入");
        Ok(product)
    }

    /// 写入批次记录（与导入同一事务）
    fn record_batch(&mut self, report: &ImportReport) -> ImportResult<()> {
        let summary_json = serde_json::to_string(&report.summary).map_err(RepositoryError::from)?;

        let batch = ImportBatch {
            batch_id: report.batch_id.clone(),
            file_path: report.file_path.clone(),
            total_rows: report.summary.total_rows as i64,
            imported_rows: report.summary.imported as i64,
            skipped_rows: report.summary.skipped as i64,
            failed_rows: report.summary.failed as i64,
            imported_at: report.finished_at,
            elapsed_ms: report.elapsed_ms,
            summary_json: Some(summary_json),
        };

        self.repo.insert_batch(&batch)?;
        Ok(())
    }

    fn rollback_after_failure(&mut self) {
        if !self.repo.in_transaction() {
            return;
        }
        match self.repo.rollback() {
            Ok(()) => warn!("事务已回滚"),
            Err(e) => error!(error = %e, "事务回滚失败"),
        }
    }
}
