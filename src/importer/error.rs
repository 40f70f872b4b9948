// ==========================================
// Open Food Facts 导入工具 - 导入模块错误类型
// ==========================================
// 只包含致命错误：出现即回滚整个导入
// 行级问题见 domain::import::RowStatus
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("CSV 文件为空: {0}")]
    EmptyFile(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据库错误 =====
    #[error("数据库事务失败: {0}")]
    Transaction(#[source] RepositoryError),

    #[error("导入中止 (行 {line}): {source}")]
    Aborted {
        line: usize,
        #[source]
        source: RepositoryError,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ImportError {
    /// 逐行处理中遇到的不可恢复错误
    pub fn aborted(line: usize, source: RepositoryError) -> Self {
        ImportError::Aborted { line, source }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            ImportError::FileReadError(err.to_string())
        } else {
            ImportError::CsvParseError(err.to_string())
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
