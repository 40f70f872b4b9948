// ==========================================
// Open Food Facts 导入工具 - 配料/过敏原文本切分
// ==========================================
// 规则: 按字符集合切分（连续分隔符视为一个），TRIM，丢弃空片段
// 说明: 单元格内文本不再有引号转义，不按 CSV 语义解析
// ==========================================

/// 配料列分隔符
pub const INGREDIENT_SEPARATORS: &[char] = &[',', ';', ':'];

/// 过敏原列分隔符
pub const ALLERGEN_SEPARATORS: &[char] = &[',', ';', '-'];

/// 按任意分隔符切分
pub fn split_on_any(text: &str, separators: &[char]) -> Vec<String> {
    text.split(|c: char| separators.contains(&c))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// 切分配料文本
pub fn split_ingredients(text: &str) -> Vec<String> {
    split_on_any(text, INGREDIENT_SEPARATORS)
}

/// 切分过敏原文本
pub fn split_allergens(text: &str) -> Vec<String> {
    split_on_any(text, ALLERGEN_SEPARATORS)
}
