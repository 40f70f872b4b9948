// ==========================================
// SqliteCatalogRepository 集成测试
// ==========================================
// 测试目标: 删除级联、批次查询、事务回滚、schema 版本
// ==========================================

mod test_helpers;

use chrono::{Duration, Utc};
use food_facts_import::db::{self, CURRENT_SCHEMA_VERSION};
use food_facts_import::domain::catalog::NewProduct;
use food_facts_import::domain::import::ImportBatch;
use food_facts_import::{
    Allergen, Brand, CatalogRepository, Category, Ingredient, NutritionGrade, RepositoryError,
    SqliteCatalogRepository,
};
use test_helpers::{count_rows, create_test_db};

fn seed_product(repo: &mut SqliteCatalogRepository, name: &str, brand: &Brand) {
    let category = match repo.find_by_name::<Category>("Biscuits").unwrap() {
        Some(c) => c,
        None => repo.save_named::<Category>("Biscuits").unwrap(),
    };
    let ingredient = match repo.find_by_name::<Ingredient>("farine").unwrap() {
        Some(i) => i,
        None => repo.save_named::<Ingredient>("farine").unwrap(),
    };
    let allergen = match repo.find_by_name::<Allergen>("gluten").unwrap() {
        Some(a) => a,
        None => repo.save_named::<Allergen>("gluten").unwrap(),
    };

    repo.save_product(&NewProduct {
        name: name.to_string(),
        nutrition_grade: NutritionGrade::C,
        brand: brand.clone(),
        category,
        ingredients: vec![ingredient],
        allergens: vec![allergen],
    })
    .unwrap();
}

fn batch(id: &str, minutes_ago: i64) -> ImportBatch {
    ImportBatch {
        batch_id: id.to_string(),
        file_path: "off.csv".to_string(),
        total_rows: 10,
        imported_rows: 8,
        skipped_rows: 2,
        failed_rows: 0,
        imported_at: Utc::now() - Duration::minutes(minutes_ago),
        elapsed_ms: 42,
        summary_json: None,
    }
}

#[test]
fn test_delete_brand_removes_products_and_links() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let mut repo = SqliteCatalogRepository::open(&db_path).unwrap();

    let lu = repo.save_named::<Brand>("LU").unwrap();
    let bn = repo.save_named::<Brand>("BN").unwrap();
    seed_product(&mut repo, "Prince", &lu);
    seed_product(&mut repo, "Petit Beurre", &lu);
    seed_product(&mut repo, "Goûter BN", &bn);

    let removed = repo.delete_brand_with_products(lu.id).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(repo.count_products().unwrap(), 1);
    assert!(repo.find_by_name::<Brand>("LU").unwrap().is_none());
    assert_eq!(count_rows(&db_path, "product_ingredient"), 1);
    assert_eq!(count_rows(&db_path, "product_allergen"), 1);
    // 共享实体保留
    assert_eq!(repo.count::<Ingredient>().unwrap(), 1);
    assert_eq!(repo.count::<Category>().unwrap(), 1);
}

#[test]
fn test_delete_unknown_brand_is_not_found() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let mut repo = SqliteCatalogRepository::open(&db_path).unwrap();

    let result = repo.delete_brand_with_products(999);

    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
}

#[test]
fn test_recent_batches_newest_first() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let mut repo = SqliteCatalogRepository::open(&db_path).unwrap();

    repo.insert_batch(&batch("old", 60)).unwrap();
    repo.insert_batch(&batch("new", 1)).unwrap();
    repo.insert_batch(&batch("mid", 30)).unwrap();

    let ids: Vec<String> = repo
        .recent_batches(2)
        .unwrap()
        .into_iter()
        .map(|b| b.batch_id)
        .collect();
    assert_eq!(ids, vec!["new".to_string(), "mid".to_string()]);
}

#[test]
fn test_rollback_discards_all_writes() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let mut repo = SqliteCatalogRepository::open(&db_path).unwrap();

    repo.begin().unwrap();
    let lu = repo.save_named::<Brand>("LU").unwrap();
    seed_product(&mut repo, "Prince", &lu);
    repo.rollback().unwrap();

    assert!(!repo.in_transaction());
    assert_eq!(repo.count_products().unwrap(), 0);
    assert_eq!(count_rows(&db_path, "brand"), 0);
    assert_eq!(count_rows(&db_path, "ingredient"), 0);
}

#[test]
fn test_reopen_keeps_schema_version() {
    let (_temp_db, db_path) = create_test_db().unwrap();

    // 再次打开不重复建表/写版本
    let repo = SqliteCatalogRepository::open(&db_path).unwrap();
    let version = db::read_schema_version(repo.connection()).unwrap();

    assert_eq!(version, Some(CURRENT_SCHEMA_VERSION));
    assert_eq!(count_rows(&db_path, "schema_version"), 1);
}
