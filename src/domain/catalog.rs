// ==========================================
// Open Food Facts 导入工具 - 商品目录领域模型
// ==========================================
// 实体: Category / Brand / Ingredient / Allergen / Product
// 主键: 数据库自增 i64
// 红线: 不含数据访问逻辑
// ==========================================

use crate::domain::types::NutritionGrade;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 名称字段最大长度（字符数）
pub const NAME_MAX_LEN: usize = 255;

// ==========================================
// NamedEntity - 以名称为自然键的查找实体
// ==========================================
// 用途: 让仓储层与查找-或-创建逻辑对四类查找实体通用
pub trait NamedEntity: Sized {
    /// 表名
    const TABLE: &'static str;

    /// 日志/错误中使用的实体名
    const LABEL: &'static str;

    fn from_parts(id: i64, name: String) -> Self;

    fn id(&self) -> i64;

    fn name(&self) -> &str;
}

// ==========================================
// Category - 商品分类
// ==========================================
// 一个分类对应多个商品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl NamedEntity for Category {
    const TABLE: &'static str = "category";
    const LABEL: &'static str = "Category";

    fn from_parts(id: i64, name: String) -> Self {
        Self { id, name }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ==========================================
// Brand - 品牌
// ==========================================
// 删除品牌时级联删除其商品（见 CatalogRepository::delete_brand_with_products）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

impl NamedEntity for Brand {
    const TABLE: &'static str = "brand";
    const LABEL: &'static str = "Brand";

    fn from_parts(id: i64, name: String) -> Self {
        Self { id, name }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ==========================================
// Ingredient - 配料
// ==========================================
// 与 Product 多对多（关联表 product_ingredient）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
}

impl NamedEntity for Ingredient {
    const TABLE: &'static str = "ingredient";
    const LABEL: &'static str = "Ingredient";

    fn from_parts(id: i64, name: String) -> Self {
        Self { id, name }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ==========================================
// Allergen - 过敏原
// ==========================================
// 与 Product 多对多（关联表 product_allergen）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allergen {
    pub id: i64,
    pub name: String,
}

impl NamedEntity for Allergen {
    const TABLE: &'static str = "allergen";
    const LABEL: &'static str = "Allergen";

    fn from_parts(id: i64, name: String) -> Self {
        Self { id, name }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ==========================================
// Product - 食品
// ==========================================
// 红线: 创建时必须恰好关联一个 Brand 和一个 Category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub nutrition_grade: NutritionGrade,
    pub brand: Brand,
    pub category: Category,
    pub ingredients: Vec<Ingredient>,
    pub allergens: Vec<Allergen>,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product{{id={}, name='{}', grade={}, brand='{}', category='{}', ingredients={}, allergens={}}}",
            self.id,
            self.name,
            self.nutrition_grade,
            self.brand.name,
            self.category.name,
            self.ingredients.len(),
            self.allergens.len()
        )
    }
}

// ==========================================
// NewProduct - 待插入的商品
// ==========================================
// 关联实体均已落库（带 id），仓储层只负责写 product 及关联表
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub nutrition_grade: NutritionGrade,
    pub brand: Brand,
    pub category: Category,
    pub ingredients: Vec<Ingredient>,
    pub allergens: Vec<Allergen>,
}

/// 校验名称约束（非空、不超过 NAME_MAX_LEN 字符）
///
/// # 返回
/// - Ok(()): 校验通过
/// - Err(String): 违规描述
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("名称不能为空".to_string());
    }
    let len = name.chars().count();
    if len > NAME_MAX_LEN {
        return Err(format!("名称长度 {} 超过上限 {}", len, NAME_MAX_LEN));
    }
    Ok(())
}
