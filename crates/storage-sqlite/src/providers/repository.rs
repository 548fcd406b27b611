use std::sync::Arc;

use async_trait::async_trait;
use billpay_core::errors::{Error, Result};
use billpay_core::health::HealthSnapshot;
use billpay_core::providers::{Provider, ProviderRepositoryTrait, SelectionChange};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;

use super::model::{ProviderChangesetDB, ProviderDB, SelectionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{provider_selection, providers};

const SELECTION_ROW: i32 = 1;

pub struct ProviderRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ProviderRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ProviderRepository { pool, writer }
    }
}

fn load_selection(conn: &mut SqliteConnection) -> Result<SelectionDB> {
    let selection = provider_selection::table
        .find(SELECTION_ROW)
        .select(SelectionDB::as_select())
        .first(conn)
        .optional()
        .map_err(StorageError::from)?;
    Ok(selection.unwrap_or_default())
}

fn load_provider(conn: &mut SqliteConnection, provider_id: &str) -> Result<Provider> {
    let row = providers::table
        .find(provider_id)
        .select(ProviderDB::as_select())
        .first(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| Error::not_found(format!("provider {}", provider_id)))?;
    let selection = load_selection(conn)?;
    Ok(row.into_domain(&selection)?)
}

fn load_live(conn: &mut SqliteConnection, provider_id: &str) -> Result<Provider> {
    let provider = load_provider(conn, provider_id)?;
    if provider.is_removed() {
        return Err(Error::not_found(format!("provider {}", provider_id)));
    }
    Ok(provider)
}

fn set_active_pointer(conn: &mut SqliteConnection, provider_id: Option<&str>) -> Result<()> {
    diesel::update(provider_selection::table.find(SELECTION_ROW))
        .set(provider_selection::active_provider_id.eq(provider_id))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

fn set_default_pointer(conn: &mut SqliteConnection, provider_id: Option<&str>) -> Result<()> {
    diesel::update(provider_selection::table.find(SELECTION_ROW))
        .set(provider_selection::default_provider_id.eq(provider_id))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

/// Move the pointers for one provider inside the current transaction.
fn apply_selection(
    conn: &mut SqliteConnection,
    provider_id: &str,
    change: SelectionChange,
) -> Result<()> {
    let current = load_selection(conn)?;
    match change.active {
        Some(true) => set_active_pointer(conn, Some(provider_id))?,
        Some(false) if current.active_provider_id.as_deref() == Some(provider_id) => {
            set_active_pointer(conn, None)?
        }
        _ => {}
    }
    match change.default {
        Some(true) => set_default_pointer(conn, Some(provider_id))?,
        Some(false) if current.default_provider_id.as_deref() == Some(provider_id) => {
            set_default_pointer(conn, None)?
        }
        _ => {}
    }
    Ok(())
}

#[async_trait]
impl ProviderRepositoryTrait for ProviderRepository {
    fn get_by_id(&self, provider_id: &str) -> Result<Provider> {
        let mut conn = get_connection(&self.pool)?;
        load_provider(&mut conn, provider_id)
    }

    fn get_by_name(&self, provider_name: &str) -> Result<Option<Provider>> {
        let mut conn = get_connection(&self.pool)?;
        let row = providers::table
            .filter(providers::name.eq(provider_name))
            .select(ProviderDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        match row {
            Some(row) => {
                let selection = load_selection(&mut conn)?;
                Ok(Some(row.into_domain(&selection)?))
            }
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<Provider>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = providers::table
            .order((providers::created_at.asc(), providers::name.asc()))
            .select(ProviderDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        let selection = load_selection(&mut conn)?;
        rows.into_iter()
            .map(|row| row.into_domain(&selection).map_err(Error::from))
            .collect()
    }

    async fn create(&self, provider: Provider) -> Result<Provider> {
        let row = ProviderDB::from_domain(&provider)?;
        let change = SelectionChange {
            active: Some(provider.is_active),
            default: Some(provider.is_default),
        };
        self.writer
            .exec(move |conn| {
                let taken = providers::table
                    .filter(providers::name.eq(row.name.as_str()))
                    .count()
                    .get_result::<i64>(conn)
                    .map_err(StorageError::from)?;
                if taken > 0 {
                    return Err(Error::Conflict(format!(
                        "provider name '{}' already exists",
                        row.name
                    )));
                }
                diesel::insert_into(providers::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                apply_selection(conn, &row.id, change)?;
                load_provider(conn, &row.id)
            })
            .await
    }

    async fn update(&self, provider: Provider, selection: SelectionChange) -> Result<Provider> {
        let changes = ProviderChangesetDB::from_domain(&provider)?;
        let provider_id = provider.id;
        self.writer
            .exec(move |conn| {
                load_live(conn, &provider_id)?;
                diesel::update(providers::table.find(provider_id.as_str()))
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                apply_selection(conn, &provider_id, selection)?;
                load_provider(conn, &provider_id)
            })
            .await
    }

    async fn set_active(&self, provider_id: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                if let Some(id) = provider_id.as_deref() {
                    load_live(conn, id)?;
                }
                set_active_pointer(conn, provider_id.as_deref())
            })
            .await
    }

    async fn set_default(&self, provider_id: Option<String>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                if let Some(id) = provider_id.as_deref() {
                    load_live(conn, id)?;
                }
                set_default_pointer(conn, provider_id.as_deref())
            })
            .await
    }

    async fn soft_delete(
        &self,
        provider_id: &str,
        removed_at: NaiveDateTime,
    ) -> Result<Provider> {
        let provider_id = provider_id.to_string();
        self.writer
            .exec(move |conn| {
                load_live(conn, &provider_id)?;
                apply_selection(
                    conn,
                    &provider_id,
                    SelectionChange {
                        active: Some(false),
                        default: Some(false),
                    },
                )?;
                diesel::update(providers::table.find(provider_id.as_str()))
                    .set((
                        providers::removed_at.eq(Some(removed_at)),
                        providers::updated_at.eq(removed_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_provider(conn, &provider_id)
            })
            .await
    }

    async fn update_health(&self, provider_id: &str, snapshot: HealthSnapshot) -> Result<()> {
        let provider_id = provider_id.to_string();
        let health = serde_json::to_string(&snapshot).map_err(StorageError::from)?;
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(providers::table.find(provider_id.as_str()))
                    .set(providers::health.eq(health))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::not_found(format!("provider {}", provider_id)));
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_db;
    use billpay_core::providers::{
        NewProvider, ProviderService, ProviderServiceTrait, ProviderUpdate,
    };
    use billpay_vendors::{
        HealthStatus, ServiceCategory, VendorCredentials, VendorKind, VendorOperation,
    };
    use chrono::Utc;

    fn vtpass(name: &str) -> NewProvider {
        NewProvider {
            name: name.to_string(),
            display_name: "VTPass".to_string(),
            credentials: VendorCredentials {
                api_key: Some("api".to_string()),
                secret_key: Some("sk".to_string()),
                public_key: Some("pk".to_string()),
                ..Default::default()
            },
            supported_services: vec![ServiceCategory::Data, ServiceCategory::Electricity],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_round_trips_provider_record() {
        let (_dir, pool, writer) = test_db();
        let repository = Arc::new(ProviderRepository::new(pool, writer));
        let service = ProviderService::new(repository.clone());

        let created = service
            .register(NewProvider {
                is_default: true,
                ..vtpass("vtpass")
            })
            .await
            .unwrap();
        let loaded = repository.get_by_id(&created.id).unwrap();

        assert_eq!(loaded, created);
        assert_eq!(loaded.vendor_kind, VendorKind::VtPass);
        assert!(loaded.is_default);
        assert_eq!(loaded.credentials.secret_key.as_deref(), Some("sk"));
        assert!(loaded.endpoints.contains_key(&VendorOperation::QueryTransaction));
        assert_eq!(repository.get_by_name("vtpass").unwrap().unwrap().id, created.id);
        assert!(repository.get_by_name("missing").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let (_dir, pool, writer) = test_db();
        let repository = ProviderRepository::new(pool, writer);
        let service = ProviderService::new(Arc::new(repository));

        service.register(vtpass("vtpass")).await.unwrap();
        let err = service.register(vtpass("vtpass")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_activation_is_exclusive_and_cleared_on_removal() {
        let (_dir, pool, writer) = test_db();
        let repository = Arc::new(ProviderRepository::new(pool, writer));
        let service = ProviderService::new(repository.clone());

        let a = service.register(vtpass("vtpass-a")).await.unwrap();
        let b = service.register(vtpass("vtpass-b")).await.unwrap();
        service.set_active(&a.id).await.unwrap();
        service
            .update(
                &b.id,
                ProviderUpdate {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let active: Vec<_> = repository
            .list()
            .unwrap()
            .into_iter()
            .filter(|p| p.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);

        let removed = service.remove(&b.id).await.unwrap();
        assert!(removed.removed_at.is_some());
        assert!(!removed.is_active);
        assert!(repository.list().unwrap().iter().all(|p| !p.is_active));

        let err = service.set_active(&b.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_health_snapshot() {
        let (_dir, pool, writer) = test_db();
        let repository = Arc::new(ProviderRepository::new(pool, writer));
        let service = ProviderService::new(repository.clone());
        let created = service.register(vtpass("vtpass")).await.unwrap();

        let snapshot = HealthSnapshot {
            status: HealthStatus::Degraded,
            total_requests: 42,
            last_checked_at: Some(Utc::now().naive_utc()),
            ..Default::default()
        };
        repository
            .update_health(&created.id, snapshot.clone())
            .await
            .unwrap();

        let updated = service
            .update(
                &created.id,
                ProviderUpdate {
                    display_name: Some("VTPass Live".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "VTPass Live");
        assert_eq!(updated.health.status, HealthStatus::Degraded);
        assert_eq!(updated.health.total_requests, 42);

        let err = repository
            .update_health("missing", snapshot)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
