// ==========================================
// Open Food Facts 导入工具 - 行解析
// ==========================================
// 职责: 按固定列位置把 CSV 记录转换为 ProductRow
// 红线: 只做格式/枚举校验，不访问数据库
// ==========================================

use crate::config::CsvLayout;
use crate::domain::catalog::NAME_MAX_LEN;
use crate::domain::import::SkipReason;
use crate::domain::types::NutritionGrade;
use crate::importer::text_splitter::{split_allergens, split_ingredients};
use csv::StringRecord;

// ==========================================
// ProductRow - 校验后的行
// ==========================================
// 生命周期: 仅在单行处理内
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub category_name: String,
    pub brand_name: String,
    pub product_name: String,
    pub nutrition_grade: NutritionGrade,
    pub ingredients: Vec<String>,
    pub allergens: Vec<String>,
}

impl ProductRow {
    /// 解析一条记录
    ///
    /// # 返回
    /// - Ok(ProductRow): 可入库
    /// - Err(SkipReason): 该行应跳过
    pub fn parse(record: &StringRecord, layout: &CsvLayout) -> Result<Self, SkipReason> {
        if record.len() < layout.min_columns {
            return Err(SkipReason::TooFewColumns {
                found: record.len(),
                required: layout.min_columns,
            });
        }

        let raw_grade = field(record, layout.nutrition_grade);
        let nutrition_grade = raw_grade
            .parse::<NutritionGrade>()
            .map_err(|e| SkipReason::InvalidNutritionGrade { raw: e.raw })?;

        Ok(Self {
            category_name: required_name(field(record, layout.category), "category")?,
            brand_name: required_name(field(record, layout.brand), "brand")?,
            product_name: required_name(field(record, layout.product), "product")?,
            nutrition_grade,
            ingredients: split_ingredients(field(record, layout.ingredients)),
            allergens: split_allergens(field(record, layout.allergens)),
        })
    }
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn required_name(raw: &str, field: &str) -> Result<String, SkipReason> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(SkipReason::MissingField {
            field: field.to_string(),
        });
    }
    let len = value.chars().count();
    if len > NAME_MAX_LEN {
        return Err(SkipReason::NameTooLong {
            field: field.to_string(),
            len,
        });
    }
    Ok(value.to_string())
}
