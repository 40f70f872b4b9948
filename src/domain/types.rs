// ==========================================
// Open Food Facts 导入工具 - 领域类型定义
// ==========================================
// 营养评分 (Nutri-Score) 封闭枚举及其解析
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 营养评分 (Nutrition Grade)
// ==========================================
// 红线: 封闭集合 A-F，解析失败返回错误值，不抛异常
// 序列化格式: 大写单字母 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NutritionGrade {
    A, // 营养质量优秀
    B, // 良好
    C, // 一般
    D, // 不足
    E, // 很差
    F, // 未定义（缺少计算或数据错误）
}

impl NutritionGrade {
    /// 全部评分（按优到差排序）
    pub const ALL: [NutritionGrade; 6] = [
        NutritionGrade::A,
        NutritionGrade::B,
        NutritionGrade::C,
        NutritionGrade::D,
        NutritionGrade::E,
        NutritionGrade::F,
    ];

    /// 数据库存储格式
    pub fn as_str(&self) -> &'static str {
        match self {
            NutritionGrade::A => "A",
            NutritionGrade::B => "B",
            NutritionGrade::C => "C",
            NutritionGrade::D => "D",
            NutritionGrade::E => "E",
            NutritionGrade::F => "F",
        }
    }
}

impl fmt::Display for NutritionGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 营养评分解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的营养评分: '{raw}'（期望 A-F）")]
pub struct InvalidNutritionGrade {
    pub raw: String,
}

impl FromStr for NutritionGrade {
    type Err = InvalidNutritionGrade;

    /// 去除首尾空白后大小写不敏感匹配
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(NutritionGrade::A),
            "B" => Ok(NutritionGrade::B),
            "C" => Ok(NutritionGrade::C),
            "D" => Ok(NutritionGrade::D),
            "E" => Ok(NutritionGrade::E),
            "F" => Ok(NutritionGrade::F),
            _ => Err(InvalidNutritionGrade { raw: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive_and_trimmed() {
        assert_eq!("a".parse::<NutritionGrade>(), Ok(NutritionGrade::A));
        assert_eq!("A".parse::<NutritionGrade>(), Ok(NutritionGrade::A));
        assert_eq!(" A ".parse::<NutritionGrade>(), Ok(NutritionGrade::A));
        assert_eq!("\te\n".parse::<NutritionGrade>(), Ok(NutritionGrade::E));
    }

    #[test]
    fn test_parse_rejects_values_outside_closed_set() {
        for raw in ["", "   ", "G", "AB", "1", "unknown", "not-applicable"] {
            let err = raw.parse::<NutritionGrade>().unwrap_err();
            assert_eq!(err.raw, raw);
        }
    }

    #[test]
    fn test_grades_ordered_best_to_worst() {
        assert!(NutritionGrade::A < NutritionGrade::F);
        assert_eq!(NutritionGrade::ALL.first(), Some(&NutritionGrade::A));
        assert_eq!(NutritionGrade::D.to_string(), "D");
    }
}
