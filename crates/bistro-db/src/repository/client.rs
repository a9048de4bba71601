//! # Client Repository
//!
//! Database operations for clients.
//!
//! ## Key Operations
//! - Insert (id assigned by SQLite) or update by id
//! - Lookup by id
//! - Listing ordered by name

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::{Client, ClientId, ClientRecord};

/// Raw `clients` row.
#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: i64,
    name: String,
    phone: String,
    discount: Option<f64>,
}

impl TryFrom<ClientRow> for Client {
    type Error = DbError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let client = Client::try_from(ClientRecord {
            id: Some(ClientId::new(row.id)),
            name: row.name,
            phone: row.phone,
            discount: row.discount,
        })?;
        Ok(client)
    }
}

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn fetch<'e, E>(executor: E, id: ClientId) -> DbResult<Option<Client>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, ClientRow>(
        "SELECT id, name, phone, discount FROM clients WHERE id = ?1",
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await?;

    row.map(Client::try_from).transpose()
}

/// Inserts a client without an id, or updates the row matching its id.
///
/// ## Returns
/// * `Ok(ClientId)` - The generated id (insert) or the existing id (update)
/// * `Err(DbError::NotFound)` - The client carries an id with no row behind it
pub(crate) async fn save<'e, E>(executor: E, client: &Client) -> DbResult<ClientId>
where
    E: Executor<'e, Database = Sqlite>,
{
    match client.id() {
        None => {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO clients (name, phone, discount)
                VALUES (?1, ?2, ?3)
                RETURNING id
                "#,
            )
            .bind(client.name())
            .bind(client.phone())
            .bind(client.discount_pct())
            .fetch_one(executor)
            .await?;

            debug!(client_id = id, "Inserted client");
            Ok(ClientId::new(id))
        }
        Some(id) => {
            let result = sqlx::query(
                r#"
                UPDATE clients
                SET name = ?2, phone = ?3, discount = ?4
                WHERE id = ?1
                "#,
            )
            .bind(id.get())
            .bind(client.name())
            .bind(client.phone())
            .bind(client.discount_pct())
            .execute(executor)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Client", id.to_string()));
            }

            debug!(client_id = %id, "Updated client");
            Ok(id)
        }
    }
}

pub(crate) async fn list<'e, E>(executor: E) -> DbResult<Vec<Client>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ClientRow>(
        "SELECT id, name, phone, discount FROM clients ORDER BY name, id",
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(Client::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Pool-bound client operations.
///
/// ## Usage
/// ```rust,ignore
/// let id = db.clients().save(&Client::regular("Ana", "11999999999")?).await?;
/// let ana = db.clients().get_by_id(id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Gets a client by id.
    pub async fn get_by_id(&self, id: ClientId) -> DbResult<Option<Client>> {
        fetch(&self.pool, id).await
    }

    /// Inserts or updates a client. See [`save`].
    pub async fn save(&self, client: &Client) -> DbResult<ClientId> {
        save(&self.pool, client).await
    }

    /// All clients ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        list(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use bistro_core::{Client, ClientId};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_roundtrips() {
        let db = db().await;
        let repo = db.clients();

        let vip = Client::vip("Carla Mendes", "31977776666", 15.0).unwrap();
        let id = repo.save(&vip).await.unwrap();

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.id(), Some(id));
        assert_eq!(stored.name(), "Carla Mendes");
        assert_eq!(stored.discount_pct(), Some(15.0));
    }

    #[tokio::test]
    async fn test_update_existing_client() {
        let db = db().await;
        let repo = db.clients();

        let id = repo
            .save(&Client::regular("Ana", "11999999999").unwrap())
            .await
            .unwrap();

        let mut ana = repo.get_by_id(id).await.unwrap().unwrap();
        ana.set_phone("11888888888").unwrap();
        ana.set_discount(Some(5.0)).unwrap();
        assert_eq!(repo.save(&ana).await.unwrap(), id);

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.phone(), "11888888888");
        assert!(stored.is_vip());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let db = db().await;
        let ghost = Client::regular("Ghost", "11999999999")
            .unwrap()
            .with_id(ClientId::new(404));

        let result = db.clients().save(&ghost).await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_by_name() {
        let db = db().await;
        let repo = db.clients();
        for name in ["Zelia", "Ana", "Marcos"] {
            repo.save(&Client::regular(name, "11999999999").unwrap())
                .await
                .unwrap();
        }

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, ["Ana", "Marcos", "Zelia"]);
    }
}
