use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use super::{NewPlant, PlantChanges, PlantStore, StoreError};
use crate::entity::plant;

/// [`PlantStore`] over the shared sea-orm connection pool.
///
/// Name uniqueness is enforced by the unique index on `plant.name`.
#[derive(Clone)]
pub struct SeaOrmPlantStore {
    db: DatabaseConnection,
}

impl SeaOrmPlantStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn backend(operation: &'static str, key: impl ToString) -> impl FnOnce(DbErr) -> StoreError {
    move |err| StoreError::Backend {
        operation,
        key: key.to_string(),
        message: err.to_string(),
    }
}

fn apply_changes(active: &mut plant::ActiveModel, changes: PlantChanges) {
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(v) = changes.scientific_name {
        active.scientific_name = Set(Some(v));
    }
    if let Some(v) = changes.plant_type {
        active.plant_type = Set(Some(v));
    }
    if let Some(v) = changes.sunlight {
        active.sunlight = Set(Some(v));
    }
    if let Some(v) = changes.watering {
        active.watering = Set(Some(v));
    }
    if let Some(v) = changes.soil {
        active.soil = Set(Some(v));
    }
    if let Some(v) = changes.fertilizer {
        active.fertilizer = Set(Some(v));
    }
    if let Some(v) = changes.seasonality {
        active.seasonality = Set(Some(v));
    }
    if let Some(months) = changes.seasonal_months {
        active.seasonal_months = Set(serde_json::json!(months));
    }
    if let Some(v) = changes.uses_notes {
        active.uses_notes = Set(Some(v));
    }
    if let Some(v) = changes.image_url {
        active.image_url = Set(Some(v));
    }
    if let Some(v) = changes.qr_code {
        active.qr_code = Set(Some(v));
    }
    active.updated_at = Set(Utc::now());
}

#[async_trait]
impl PlantStore for SeaOrmPlantStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<plant::Model>, StoreError> {
        plant::Entity::find()
            .filter(plant::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(backend("find_by_name", name))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<plant::Model>, StoreError> {
        plant::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend("find_by_id", id))
    }

    async fn list(&self) -> Result<Vec<plant::Model>, StoreError> {
        plant::Entity::find()
            .order_by_desc(plant::Column::CreatedAt)
            .order_by_desc(plant::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend("list", "*"))
    }

    async fn insert(&self, plant: NewPlant) -> Result<plant::Model, StoreError> {
        let now = Utc::now();
        let name = plant.name.clone();
        let details = plant.details;

        let model = plant::ActiveModel {
            name: Set(plant.name),
            scientific_name: Set(details.scientific_name),
            plant_type: Set(details.plant_type),
            sunlight: Set(details.sunlight),
            watering: Set(details.watering),
            soil: Set(details.soil),
            fertilizer: Set(details.fertilizer),
            seasonality: Set(details.seasonality),
            seasonal_months: Set(serde_json::json!(details.seasonal_months)),
            uses_notes: Set(details.uses_notes),
            image_url: Set(plant.image_url),
            qr_code: Set(plant.qr_code),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(inserted),
            Err(e) if is_unique_violation(&e) => {
                debug!(%name, "insert rejected by unique name index");
                Err(StoreError::DuplicateName(name))
            }
            Err(e) => Err(backend("insert", name)(e)),
        }
    }

    async fn fill_image_url(&self, id: i32, image_url: &str) -> Result<bool, StoreError> {
        let result = plant::Entity::update_many()
            .col_expr(plant::Column::ImageUrl, Expr::value(image_url))
            .col_expr(plant::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(plant::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(plant::Column::ImageUrl.is_null())
                    .add(plant::Column::ImageUrl.eq("")),
            )
            .exec(&self.db)
            .await
            .map_err(backend("fill_image_url", id))?;
        Ok(result.rows_affected == 1)
    }

    async fn update(&self, id: i32, changes: PlantChanges) -> Result<plant::Model, StoreError> {
        let new_name = changes.name.clone();
        let txn = self.db.begin().await.map_err(backend("update", id))?;

        let existing = plant::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(backend("update", id))?
            .ok_or(StoreError::NotFound(id))?;

        let mut active: plant::ActiveModel = existing.into();
        apply_changes(&mut active, changes);

        let updated = match active.update(&txn).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::DuplicateName(new_name.unwrap_or_default()));
            }
            Err(e) => return Err(backend("update", id)(e)),
        };
        txn.commit().await.map_err(backend("update", id))?;

        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = plant::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(backend("delete", id))?;
        Ok(result.rows_affected > 0)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.db.clone().close().await.map_err(backend("close", "pool"))
    }
}
