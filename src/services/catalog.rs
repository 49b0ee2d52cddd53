use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{location, stock, stock_variant, supplier};
use crate::errors::ServiceError;

/// Stock Variant Registry: stocks, variants, locations, suppliers.
/// Stocks and variants are immutable once referenced by the ledger, so
/// this service only creates and reads.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_stock(
        &self,
        name: String,
        category: String,
        description: Option<String>,
    ) -> Result<stock::Model, ServiceError> {
        let model = stock::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            category: Set(category),
            description: Set(description),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    pub async fn get_stock(&self, id: Uuid) -> Result<stock::Model, ServiceError> {
        stock::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stock {} not found", id)))
    }

    pub async fn list_stocks(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock::Model>, u64), ServiceError> {
        let paginator = stock::Entity::find()
            .order_by_asc(stock::Column::Name)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn create_variant(
        &self,
        stock_id: Uuid,
        name: String,
        unit: String,
    ) -> Result<stock_variant::Model, ServiceError> {
        // The parent stock must exist before a variant can reference it.
        self.get_stock(stock_id).await?;

        let model = stock_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            stock_id: Set(stock_id),
            name: Set(name),
            unit: Set(unit),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    pub async fn get_variant(&self, id: Uuid) -> Result<stock_variant::Model, ServiceError> {
        stock_variant::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stock variant {} not found", id)))
    }

    pub async fn list_variants(
        &self,
        stock_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_variant::Model>, u64), ServiceError> {
        let mut query = stock_variant::Entity::find();
        if let Some(stock_id) = stock_id {
            query = query.filter(stock_variant::Column::StockId.eq(stock_id));
        }
        let paginator = query
            .order_by_asc(stock_variant::Column::Name)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        name: String,
        kind: location::LocationKind,
    ) -> Result<location::Model, ServiceError> {
        let model = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            kind: Set(kind.to_string()),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    pub async fn get_location(&self, id: Uuid) -> Result<location::Model, ServiceError> {
        location::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("location {} not found", id)))
    }

    pub async fn list_locations(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<location::Model>, u64), ServiceError> {
        let paginator = location::Entity::find()
            .order_by_asc(location::Column::Name)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn create_supplier(
        &self,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<supplier::Model, ServiceError> {
        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {} not found", id)))
    }

    pub async fn list_suppliers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let paginator = supplier::Entity::find()
            .order_by_asc(supplier::Column::Name)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
