use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::WorkflowError;
use crate::domain::order::CatalogProduct;
use crate::domain::ports::ProductCatalog;
use crate::schema::{categories, products};

use super::models::{CategoryRow, NewCategoryRow, NewProductRow, ProductChangeset, ProductRow};

/// Catalog access: the read-only port the order engines consume, plus the
/// admin-facing product and category operations.
pub struct DieselProductCatalog {
    pool: DbPool,
}

impl DieselProductCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn list_products(
        &self,
        active: Option<bool>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ProductRow>, i64), WorkflowError> {
        let mut conn = self.pool.get()?;
        let offset = (page - 1) * limit;

        let mut count_q = products::table.select(count_star()).into_boxed();
        let mut rows_q = products::table.select(ProductRow::as_select()).into_boxed();
        if let Some(active) = active {
            count_q = count_q.filter(products::active.eq(active));
            rows_q = rows_q.filter(products::active.eq(active));
        }

        let total: i64 = count_q.first(&mut conn)?;
        let rows = rows_q
            .order(products::name.asc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)?;
        Ok((rows, total))
    }

    pub fn get_product(&self, id: i32) -> Result<Option<ProductRow>, WorkflowError> {
        let mut conn = self.pool.get()?;
        Ok(products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?)
    }

    pub fn create_product(&self, product: NewProductRow) -> Result<ProductRow, WorkflowError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::insert_into(products::table)
            .values(&product)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?)
    }

    pub fn update_product(
        &self,
        id: i32,
        name: Option<String>,
        price: Option<BigDecimal>,
        description: Option<String>,
        image_url: Option<String>,
        category_id: Option<i32>,
        active: Option<bool>,
    ) -> Result<Option<ProductRow>, WorkflowError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::update(products::table.filter(products::id.eq(id)))
            .set(&ProductChangeset {
                name,
                price,
                description,
                image_url,
                category_id,
                active,
                updated_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?)
    }

    pub fn delete_product(&self, id: i32) -> Result<bool, WorkflowError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.filter(products::id.eq(id)))
            .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>, WorkflowError> {
        let mut conn = self.pool.get()?;
        Ok(categories::table
            .order(categories::name.asc())
            .select(CategoryRow::as_select())
            .load(&mut conn)?)
    }

    pub fn create_category(&self, category: NewCategoryRow) -> Result<CategoryRow, WorkflowError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::insert_into(categories::table)
            .values(&category)
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)?)
    }

    pub fn update_category(
        &self,
        id: i32,
        name: Option<String>,
        image_url: Option<String>,
    ) -> Result<Option<CategoryRow>, WorkflowError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::update(categories::table.filter(categories::id.eq(id)))
            .set((
                name.map(|n| categories::name.eq(n)),
                image_url.map(|u| categories::image_url.eq(u)),
                categories::updated_at.eq(Utc::now()),
            ))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .optional()?)
    }

    pub fn delete_category(&self, id: i32) -> Result<bool, WorkflowError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(categories::table.filter(categories::id.eq(id)))
            .execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

impl ProductCatalog for DieselProductCatalog {
    fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<CatalogProduct>, WorkflowError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .select((products::id, products::name, products::price, products::active))
            .load::<(i32, String, BigDecimal, bool)>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(id, name, price, active)| CatalogProduct {
                id,
                name,
                price,
                active,
            })
            .collect())
    }
}
