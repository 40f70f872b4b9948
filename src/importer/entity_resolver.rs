// ==========================================
// Open Food Facts 导入工具 - 查找或创建
// ==========================================
// 规则: 按名称精确匹配查找，不存在则插入
// 说明: 无并发保护；并发导入的同名插入会触发唯一约束错误，不重试
// ==========================================

use crate::domain::catalog::NamedEntity;
use crate::repository::{CatalogRepository, RepositoryResult};
use tracing::debug;

/// 查找结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<E> {
    pub entity: E,
    pub created: bool, // 本次是否新建
}

/// 查找同名实体，不存在则创建
pub fn find_or_create<E, R>(repo: &mut R, name: &str) -> RepositoryResult<Resolved<E>>
where
    E: NamedEntity,
    R: CatalogRepository,
{
    if let Some(entity) = repo.find_by_name::<E>(name)? {
        return Ok(Resolved {
            entity,
            created: false,
        });
    }

    let entity = repo.save_named::<E>(name)?;
    debug!(entity = E::LABEL, id = entity.id(), name = entity.name(), "新建实体");
    Ok(Resolved {
        entity,
        created: true,
    })
}

/// 批量查找或创建，按 id 去重并保持首次出现顺序
///
/// # 返回
/// - (实体列表, 新建数量)
pub fn find_or_create_all<E, R>(repo: &mut R, names: &[String]) -> RepositoryResult<(Vec<E>, usize)>
where
    E: NamedEntity,
    R: CatalogRepository,
{
    let mut entities: Vec<E> = Vec::with_capacity(names.len());
    let mut created = 0;

    for name in names {
        let resolved = find_or_create::<E, R>(repo, name)?;
        if resolved.created {
            created += 1;
        }
        if !entities.iter().any(|e| e.id() == resolved.entity.id()) {
            entities.push(resolved.entity);
        }
    }

    Ok((entities, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Category, Ingredient};
    use crate::repository::SqliteCatalogRepository;

    #[test]
    fn test_find_or_create_reuses_existing() {
        let mut repo = SqliteCatalogRepository::open_in_memory().unwrap();

        let first = find_or_create::<Category, _>(&mut repo, "Biscuits").unwrap();
        let second = find_or_create::<Category, _>(&mut repo, "Biscuits").unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.entity, second.entity);
        assert_eq!(repo.count::<Category>().unwrap(), 1);
    }

    #[test]
    fn test_find_or_create_all_collapses_duplicates() {
        let mut repo = SqliteCatalogRepository::open_in_memory().unwrap();
        let names: Vec<String> = ["sel", "eau", "sel"].iter().map(|s| s.to_string()).collect();

        let (ingredients, created) =
            find_or_create_all::<Ingredient, _>(&mut repo, &names).unwrap();

        assert_eq!(created, 2);
        let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["sel", "eau"]);
    }
}
