// ==========================================
// Open Food Facts 导入工具 - 导入结果模型
// ==========================================
// 用途: 导入接口返回值（逐行结果 + 汇总），替代控制台打印
// 对齐: import_batch 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// SkipReason - 行被跳过的原因
// ==========================================
// 均为可恢复的行级问题，不中断整体导入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// 列数不足
    TooFewColumns { found: usize, required: usize },
    /// 营养评分为空或不在 A-F 内
    InvalidNutritionGrade { raw: String },
    /// 必填字段为空
    MissingField { field: String },
    /// 名称超长
    NameTooLong { field: String, len: usize },
    /// 同名商品已存在
    DuplicateProduct { name: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewColumns { found, required } => {
                write!(f, "列数不足: {} < {}", found, required)
            }
            SkipReason::InvalidNutritionGrade { raw } => {
                write!(f, "营养评分无效 ({})", raw)
            }
            SkipReason::MissingField { field } => write!(f, "字段为空: {}", field),
            SkipReason::NameTooLong { field, len } => {
                write!(f, "字段超长: {} ({} 字符)", field, len)
            }
            SkipReason::DuplicateProduct { name } => write!(f, "商品已存在: {}", name),
        }
    }
}

// ==========================================
// RowStatus - 单行处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Imported { product_id: i64, product_name: String },
    Skipped { reason: SkipReason },
    Failed { message: String },
}

// ==========================================
// RowOutcome - 行号 + 处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub line_number: usize, // 文件物理行号（表头为第 1 行）
    pub status: RowStatus,
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize, // 数据行数（不含表头）
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,

    // ===== 新建实体计数（已提交的行）=====
    pub categories_created: usize,
    pub brands_created: usize,
    pub ingredients_created: usize,
    pub allergens_created: usize,
}

impl ImportSummary {
    pub fn record(&mut self, status: &RowStatus) {
        self.total_rows += 1;
        match status {
            RowStatus::Imported { .. } => self.imported += 1,
            RowStatus::Skipped { .. } => self.skipped += 1,
            RowStatus::Failed { .. } => self.failed += 1,
        }
    }
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub file_path: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub summary: ImportSummary,
    pub rows: Vec<RowOutcome>,
}

impl ImportReport {
    /// 被跳过或失败的行
    pub fn problem_rows(&self) -> impl Iterator<Item = &RowOutcome> {
        self.rows
            .iter()
            .filter(|r| !matches!(r.status, RowStatus::Imported { .. }))
    }
}

// ==========================================
// ImportBatch - 导入批次记录
// ==========================================
// 与导入在同一事务中写入：只有提交成功的导入才会留下批次记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                  // 批次 ID（UUID）
    pub file_path: String,                 // 源文件路径
    pub total_rows: i64,
    pub imported_rows: i64,
    pub skipped_rows: i64,
    pub failed_rows: i64,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub summary_json: Option<String>,      // ImportSummary JSON
}
