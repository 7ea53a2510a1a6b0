//! SQLite implementation of the repository ports.
//!
//! Maps the relational schema onto the domain models with runtime
//! queries. Uuids and timestamps live as TEXT; the email column carries
//! `COLLATE NOCASE` so uniqueness is case-insensitive at the storage
//! layer too. Cascades (owner -> pets, pet -> pedigree/reviews) are
//! declared on the foreign keys rather than implied.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, Transaction};
use uuid::Uuid;

use domains::{
    DomainError, Identity, Page, PageResult, PedigreeEntry, ParentKind, Pet, PetFilter, PetRepo,
    Result, Review, ReviewRepo, Role, Species, UserRepo,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL,
        is_active     INTEGER NOT NULL DEFAULT 1,
        phone         TEXT,
        telegram      TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pets (
        id           TEXT PRIMARY KEY,
        name         TEXT NOT NULL,
        species      TEXT NOT NULL,
        age          INTEGER NOT NULL,
        birth_date   TEXT,
        description  TEXT NOT NULL,
        owner_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        is_active    INTEGER NOT NULL DEFAULT 1,
        moderated_by TEXT REFERENCES users(id),
        view_count   INTEGER NOT NULL DEFAULT 0,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pedigree_entries (
        id          TEXT PRIMARY KEY,
        pet_id      TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
        kind        TEXT NOT NULL,
        name        TEXT NOT NULL,
        breed       TEXT,
        birth_date  TEXT,
        description TEXT
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        id         TEXT PRIMARY KEY,
        pet_id     TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
        author_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        body       TEXT NOT NULL,
        rating     INTEGER NOT NULL,
        slug       TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_pets_owner ON pets(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_pets_active_created ON pets(is_active, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_pet ON reviews(pet_id)",
];

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and ensures the
    /// schema exists. Foreign keys are enabled per connection so the
    /// declared cascades actually fire.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// A private in-memory database on a single pooled connection.
    /// More connections would each see their own empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(db_err)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }
}

fn db_err(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::Conflict(db.message().to_string());
        }
    }
    DomainError::internal(err)
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DomainError::Internal(format!("corrupt uuid: {raw}")))
}

fn row_to_pet(row: &SqliteRow) -> Result<Pet> {
    let species: String = row.get("species");
    Ok(Pet {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        name: row.get("name"),
        species: Species::parse(&species)
            .ok_or_else(|| DomainError::Internal(format!("corrupt species: {species}")))?,
        age: row.get::<i64, _>("age") as u32,
        birth_date: row.get("birth_date"),
        description: row.get("description"),
        owner_id: parse_uuid(&row.get::<String, _>("owner_id"))?,
        is_active: row.get("is_active"),
        moderated_by: row
            .get::<Option<String>, _>("moderated_by")
            .map(|raw| parse_uuid(&raw))
            .transpose()?,
        view_count: row.get::<i64, _>("view_count") as u64,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_identity(row: &SqliteRow) -> Result<Identity> {
    let role: String = row.get("role");
    Ok(Identity {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: Role::parse(&role)
            .ok_or_else(|| DomainError::Internal(format!("corrupt role: {role}")))?,
        is_active: row.get("is_active"),
        phone: row.get("phone"),
        telegram: row.get("telegram"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_review(row: &SqliteRow) -> Result<Review> {
    Ok(Review {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        pet_id: parse_uuid(&row.get::<String, _>("pet_id"))?,
        author_id: parse_uuid(&row.get::<String, _>("author_id"))?,
        body: row.get("body"),
        rating: row.get::<i64, _>("rating") as u8,
        slug: row.get("slug"),
        created_at: row.get("created_at"),
    })
}

fn row_to_pedigree(row: &SqliteRow) -> Result<PedigreeEntry> {
    let kind: String = row.get("kind");
    Ok(PedigreeEntry {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        pet_id: parse_uuid(&row.get::<String, _>("pet_id"))?,
        kind: ParentKind::parse(&kind)
            .ok_or_else(|| DomainError::Internal(format!("corrupt parent kind: {kind}")))?,
        name: row.get("name"),
        breed: row.get("breed"),
        birth_date: row.get("birth_date"),
        description: row.get("description"),
    })
}

async fn insert_pedigree(
    tx: &mut Transaction<'_, Sqlite>,
    pet_id: Uuid,
    entries: &[PedigreeEntry],
) -> Result<()> {
    for entry in entries {
        sqlx::query(
            "INSERT INTO pedigree_entries (id, pet_id, kind, name, breed, birth_date, description)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(pet_id.to_string())
        .bind(entry.kind.as_str())
        .bind(&entry.name)
        .bind(&entry.breed)
        .bind(entry.birth_date)
        .bind(&entry.description)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

/// Appends the shared WHERE clause; both the COUNT and the page SELECT
/// must see identical predicates.
fn push_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    active: bool,
    filter: &PetFilter,
    now: DateTime<Utc>,
) {
    qb.push(" WHERE p.is_active = ").push_bind(active);
    if let Some(name) = &filter.name {
        qb.push(" AND lower(p.name) LIKE ")
            .push_bind(format!("%{}%", name.to_lowercase()));
    }
    if let Some(species) = filter.species {
        qb.push(" AND p.species = ").push_bind(species.as_str());
    }
    if let Some(min) = filter.age_min {
        qb.push(" AND p.age >= ").push_bind(min as i64);
    }
    if let Some(max) = filter.age_max {
        qb.push(" AND p.age <= ").push_bind(max as i64);
    }
    if let Some(owner) = &filter.owner_email {
        qb.push(" AND lower(u.email) LIKE ")
            .push_bind(format!("%{}%", owner.to_lowercase()));
    }
    if let Some(window) = filter.window {
        qb.push(" AND p.created_at >= ").push_bind(window.cutoff(now));
    }
}

#[async_trait]
impl PetRepo for SqliteStore {
    /// Pet and pedigree go in together or not at all.
    async fn insert(&self, pet: &Pet, pedigree: &[PedigreeEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            "INSERT INTO pets (id, name, species, age, birth_date, description, owner_id,
                               is_active, moderated_by, view_count, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(pet.id.to_string())
        .bind(&pet.name)
        .bind(pet.species.as_str())
        .bind(pet.age as i64)
        .bind(pet.birth_date)
        .bind(&pet.description)
        .bind(pet.owner_id.to_string())
        .bind(pet.is_active)
        .bind(pet.moderated_by.map(|id| id.to_string()))
        .bind(pet.view_count as i64)
        .bind(pet.created_at)
        .bind(pet.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        insert_pedigree(&mut tx, pet.id, pedigree).await?;
        tx.commit().await.map_err(db_err)
    }

    /// Rewrites the editable columns and replaces the pedigree set in
    /// one transaction.
    async fn update(&self, pet: &Pet, pedigree: &[PedigreeEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query(
            "UPDATE pets SET name = ?, species = ?, age = ?, birth_date = ?,
                             description = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&pet.name)
        .bind(pet.species.as_str())
        .bind(pet.age as i64)
        .bind(pet.birth_date)
        .bind(&pet.description)
        .bind(pet.updated_at)
        .bind(pet.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("pet", pet.id.to_string()));
        }

        sqlx::query("DELETE FROM pedigree_entries WHERE pet_id = ?")
            .bind(pet.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        insert_pedigree(&mut tx, pet.id, pedigree).await?;
        tx.commit().await.map_err(db_err)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM pets WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("pet", id.to_string()));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Pet>> {
        let row = sqlx::query("SELECT * FROM pets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_pet).transpose()
    }

    async fn pedigree_of(&self, pet_id: Uuid) -> Result<Vec<PedigreeEntry>> {
        let rows = sqlx::query("SELECT * FROM pedigree_entries WHERE pet_id = ? ORDER BY kind")
            .bind(pet_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_pedigree).collect()
    }

    async fn increment_views(&self, id: Uuid) -> Result<u64> {
        let row = sqlx::query(
            "UPDATE pets SET view_count = view_count + 1 WHERE id = ? RETURNING view_count",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        match row {
            Some(row) => Ok(row.get::<i64, _>("view_count") as u64),
            None => Err(DomainError::NotFound("pet", id.to_string())),
        }
    }

    async fn set_moderation(&self, id: Uuid, active: bool, moderated_by: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE pets SET is_active = ?, moderated_by = ? WHERE id = ?")
            .bind(active)
            .bind(moderated_by.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("pet", id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, active: bool, filter: &PetFilter, page: Page) -> Result<PageResult<Pet>> {
        let now = Utc::now();

        let mut count = QueryBuilder::new(
            "SELECT COUNT(*) FROM pets p JOIN users u ON u.id = p.owner_id",
        );
        push_filters(&mut count, active, filter, now);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let total = total.max(0) as u64;
        let pages = ((total.div_ceil(page.size as u64)) as u32).max(1);
        let current = page.number.min(pages);
        let offset = (current - 1) as i64 * page.size as i64;

        let mut select =
            QueryBuilder::new("SELECT p.* FROM pets p JOIN users u ON u.id = p.owner_id");
        push_filters(&mut select, active, filter, now);
        select
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(page.size as i64)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let items = rows.iter().map(row_to_pet).collect::<Result<Vec<_>>>()?;

        Ok(PageResult {
            items,
            page: current,
            pages,
            total,
            size: page.size,
        })
    }
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn insert(&self, user: &Identity) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, is_active, phone, telegram,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.phone)
        .bind(&user.telegram)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, user: &Identity) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, password_hash = ?, role = ?, is_active = ?,
                              phone = ?, telegram = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.phone)
        .bind(&user.telegram)
        .bind(user.updated_at)
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("identity", user.id.to_string()));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Identity>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_identity).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_identity).transpose()
    }

    async fn list(&self) -> Result<Vec<Identity>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY email")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_identity).collect()
    }
}

#[async_trait]
impl ReviewRepo for SqliteStore {
    async fn insert(&self, review: &Review) -> Result<()> {
        sqlx::query(
            "INSERT INTO reviews (id, pet_id, author_id, body, rating, slug, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.id.to_string())
        .bind(review.pet_id.to_string())
        .bind(review.author_id.to_string())
        .bind(&review.body)
        .bind(review.rating as i64)
        .bind(&review.slug)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_for_pet(&self, pet_id: Uuid) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT * FROM reviews WHERE pet_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(pet_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_review).collect()
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM reviews WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.is_some())
    }
}
