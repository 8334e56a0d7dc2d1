use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Executor, PgPool, Postgres, Row};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::core::categories::DEFAULT_CATEGORIES;
use crate::core::household::{self, MembershipError, RoleChange};
use crate::core::onboarding::{OnboardingAction, OnboardingState};
use crate::models::{
    Category, CreateCategoryRequest, House, HouseForm, HouseRating, Household, HouseholdUser,
    Rating, Role, UpdateCategoryRequest, Weight, WeightInput,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Membership(#[from] MembershipError),
}

/// Map a unique-constraint violation to a conflict with the given message
fn conflict_on_unique(message: &str) -> impl FnOnce(sqlx::Error) -> PostgresError + '_ {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PostgresError::Conflict(message.to_string())
        }
        _ => PostgresError::SqlxError(err),
    }
}

const HOUSEHOLD_COLUMNS: &str = "id, name, created_at, updated_at";

const MEMBER_COLUMNS: &str =
    "id, household_id, auth_user_id, name, email, role, created_at, updated_at";

const CATEGORY_COLUMNS: &str =
    "id, household_id, name, description, category_group, is_default, display_order, is_active";

const HOUSE_COLUMNS: &str = "id, household_id, nickname, address, city, state, zip, price, \
    bedrooms, bathrooms, square_feet, lot_size_sqft, year_built, property_type, listing_url, \
    notes, latitude, longitude, is_active, created_at, updated_at";

const RATING_COLUMNS: &str =
    "id, household_user_id, house_id, category_id, rating, notes, updated_at";

fn household_from_row(row: &PgRow) -> Result<Household, PostgresError> {
    Ok(Household {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn member_from_row(row: &PgRow) -> Result<HouseholdUser, PostgresError> {
    Ok(HouseholdUser {
        id: row.try_get("id")?,
        household_id: row.try_get("household_id")?,
        auth_user_id: row.try_get("auth_user_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, PostgresError> {
    Ok(Category {
        id: row.try_get("id")?,
        household_id: row.try_get("household_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        group: row.try_get("category_group")?,
        is_default: row.try_get("is_default")?,
        display_order: row.try_get("display_order")?,
        is_active: row.try_get("is_active")?,
    })
}

fn house_from_row(row: &PgRow) -> Result<House, PostgresError> {
    Ok(House {
        id: row.try_get("id")?,
        household_id: row.try_get("household_id")?,
        nickname: row.try_get("nickname")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip: row.try_get("zip")?,
        price: row.try_get("price")?,
        bedrooms: row.try_get("bedrooms")?,
        bathrooms: row.try_get("bathrooms")?,
        square_feet: row.try_get("square_feet")?,
        lot_size_sqft: row.try_get("lot_size_sqft")?,
        year_built: row.try_get("year_built")?,
        property_type: row.try_get("property_type")?,
        listing_url: row.try_get("listing_url")?,
        notes: row.try_get("notes")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn level<T: TryFrom<i16>>(value: i16, what: &str) -> Result<T, PostgresError> {
    T::try_from(value)
        .map_err(|_| PostgresError::InvalidData(format!("{} {} is outside 0-5", what, value)))
}

fn rating_from_row(row: &PgRow) -> Result<HouseRating, PostgresError> {
    let rating: Option<i16> = row.try_get("rating")?;
    Ok(HouseRating {
        id: row.try_get("id")?,
        household_user_id: row.try_get("household_user_id")?,
        house_id: row.try_get("house_id")?,
        category_id: row.try_get("category_id")?,
        rating: rating.map(|r| level(r, "rating")).transpose()?,
        notes: row.try_get("notes")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Escape LIKE wildcards in user input and wrap it for a substring match
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

async fn fetch_members<'e, E>(executor: E, household_id: Uuid) -> Result<Vec<HouseholdUser>, PostgresError>
where
    E: Executor<'e, Database = Postgres>,
{
    let query = format!(
        "SELECT {} FROM household_users WHERE household_id = $1 ORDER BY created_at, name",
        MEMBER_COLUMNS
    );
    let rows = sqlx::query(&query).bind(household_id).fetch_all(executor).await?;
    rows.iter().map(member_from_row).collect()
}

/// Lock the household row so membership checks and writes see a stable member list
async fn lock_household<'e, E>(executor: E, household_id: Uuid) -> Result<(), PostgresError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("SELECT id FROM households WHERE id = $1 FOR UPDATE")
        .bind(household_id)
        .fetch_optional(executor)
        .await?
        .map(|_| ())
        .ok_or_else(|| PostgresError::NotFound(format!("household {}", household_id)))
}

/// PostgreSQL store for households, categories, weights, houses and ratings
///
/// Every read and write that touches household data is scoped by household id;
/// callers resolve the household from the authenticated member first.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connect, then run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Build a pool that connects on first use. Runs no migrations.
    pub fn connect_lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---- households and members ----

    pub async fn get_household(&self, household_id: Uuid) -> Result<Household, PostgresError> {
        let query = format!("SELECT {} FROM households WHERE id = $1", HOUSEHOLD_COLUMNS);
        let row = sqlx::query(&query)
            .bind(household_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("household {}", household_id)))?;
        household_from_row(&row)
    }

    /// Create a household with the caller as its first owner and seed the default categories
    pub async fn create_household(
        &self,
        household_name: &str,
        auth_user_id: Uuid,
        user_name: &str,
        email: &str,
    ) -> Result<(Household, HouseholdUser), PostgresError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "INSERT INTO households (id, name) VALUES ($1, $2) RETURNING {}",
            HOUSEHOLD_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(household_name)
            .fetch_one(&mut *tx)
            .await?;
        let household = household_from_row(&row)?;

        let query = format!(
            "INSERT INTO household_users (id, household_id, auth_user_id, name, email, role) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            MEMBER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(household.id)
            .bind(auth_user_id)
            .bind(user_name)
            .bind(email)
            .bind(Role::Owner)
            .fetch_one(&mut *tx)
            .await
            .map_err(conflict_on_unique("You already belong to a household"))?;
        let owner = member_from_row(&row)?;

        let ids: Vec<Uuid> = DEFAULT_CATEGORIES.iter().map(|_| Uuid::new_v4()).collect();
        let names: Vec<&str> = DEFAULT_CATEGORIES.iter().map(|c| c.name).collect();
        let groups: Vec<&str> = DEFAULT_CATEGORIES.iter().map(|c| c.group.as_str()).collect();
        let seeded = sqlx::query(
            r#"
            INSERT INTO categories (id, household_id, name, category_group, is_default, display_order, is_active)
            SELECT d.id, $1, d.name, d.grp::category_group, TRUE, d.ord::INTEGER, TRUE
            FROM UNNEST($2::uuid[], $3::text[], $4::text[]) WITH ORDINALITY AS d(id, name, grp, ord)
            "#,
        )
        .bind(household.id)
        .bind(&ids)
        .bind(&names)
        .bind(&groups)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Created household {} with owner {} and {} default categories",
            household.id,
            owner.id,
            seeded.rows_affected()
        );

        Ok((household, owner))
    }

    pub async fn find_member_by_auth(&self, auth_user_id: Uuid) -> Result<Option<HouseholdUser>, PostgresError> {
        let query = format!(
            "SELECT {} FROM household_users WHERE auth_user_id = $1",
            MEMBER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(auth_user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(member_from_row).transpose()
    }

    /// Attach an identity to the oldest pending invitation for its email, if any
    pub async fn link_invitation(
        &self,
        auth_user_id: Uuid,
        email: &str,
    ) -> Result<Option<HouseholdUser>, PostgresError> {
        let query = format!(
            r#"
            UPDATE household_users
            SET auth_user_id = $1, updated_at = NOW()
            WHERE id = (
                SELECT id FROM household_users
                WHERE auth_user_id IS NULL AND email = $2
                ORDER BY created_at
                LIMIT 1
            )
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(auth_user_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_on_unique("This account is already linked to a household"))?;

        let member = row.as_ref().map(member_from_row).transpose()?;
        if let Some(member) = &member {
            tracing::info!("Linked identity {} to household member {}", auth_user_id, member.id);
        }
        Ok(member)
    }

    pub async fn list_members(&self, household_id: Uuid) -> Result<Vec<HouseholdUser>, PostgresError> {
        fetch_members(&self.pool, household_id).await
    }

    /// Add a pending member after checking the household limits
    pub async fn invite_member(
        &self,
        household_id: Uuid,
        actor_id: Uuid,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<HouseholdUser, PostgresError> {
        let mut tx = self.pool.begin().await?;
        lock_household(&mut *tx, household_id).await?;

        let members = fetch_members(&mut *tx, household_id).await?;
        household::check_invite(&members, actor_id, email, role)?;

        let query = format!(
            "INSERT INTO household_users (id, household_id, name, email, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            MEMBER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(household_id)
            .bind(name)
            .bind(email)
            .bind(role)
            .fetch_one(&mut *tx)
            .await
            .map_err(conflict_on_unique("This email is already a member of your household"))?;
        let member = member_from_row(&row)?;

        tx.commit().await?;
        Ok(member)
    }

    pub async fn remove_member(
        &self,
        household_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;
        lock_household(&mut *tx, household_id).await?;

        let members = fetch_members(&mut *tx, household_id).await?;
        household::check_removal(&members, actor_id, target_id)?;

        sqlx::query("DELETE FROM household_users WHERE id = $1 AND household_id = $2")
            .bind(target_id)
            .bind(household_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Member {} removed from household {} by {}", target_id, household_id, actor_id);
        Ok(())
    }

    pub async fn change_role(
        &self,
        household_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
        role: Role,
    ) -> Result<RoleChange, PostgresError> {
        let mut tx = self.pool.begin().await?;
        lock_household(&mut *tx, household_id).await?;

        let members = fetch_members(&mut *tx, household_id).await?;
        let change = household::check_role_change(&members, actor_id, target_id, role)?;

        if let RoleChange::Changed { .. } = change {
            sqlx::query(
                "UPDATE household_users SET role = $1, updated_at = NOW() WHERE id = $2 AND household_id = $3",
            )
            .bind(role)
            .bind(target_id)
            .bind(household_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(change)
    }

    // ---- categories ----

    pub async fn list_categories(&self, household_id: Uuid) -> Result<Vec<Category>, PostgresError> {
        let query = format!(
            "SELECT {} FROM categories WHERE household_id = $1 \
             ORDER BY display_order NULLS LAST, name",
            CATEGORY_COLUMNS
        );
        let rows = sqlx::query(&query).bind(household_id).fetch_all(&self.pool).await?;
        rows.iter().map(category_from_row).collect()
    }

    pub async fn get_category(&self, household_id: Uuid, category_id: Uuid) -> Result<Category, PostgresError> {
        let query = format!(
            "SELECT {} FROM categories WHERE id = $1 AND household_id = $2",
            CATEGORY_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(category_id)
            .bind(household_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("category {}", category_id)))?;
        category_from_row(&row)
    }

    pub async fn create_category(
        &self,
        household_id: Uuid,
        request: &CreateCategoryRequest,
    ) -> Result<Category, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO categories (id, household_id, name, description, category_group, is_default, display_order, is_active)
            SELECT $1, $2, $3, $4, $5, FALSE, COALESCE(MAX(display_order), 0) + 1, TRUE
            FROM categories WHERE household_id = $2
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(household_id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(request.group)
            .fetch_one(&self.pool)
            .await?;
        category_from_row(&row)
    }

    /// Apply the fields present in `request`
    pub async fn update_category(
        &self,
        household_id: Uuid,
        category_id: Uuid,
        request: &UpdateCategoryRequest,
    ) -> Result<Category, PostgresError> {
        let query = format!(
            r#"
            UPDATE categories
            SET name = COALESCE($3, name),
                description = CASE WHEN $6 THEN NULL ELSE COALESCE($4, description) END,
                is_active = COALESCE($5, is_active)
            WHERE id = $1 AND household_id = $2
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(category_id)
            .bind(household_id)
            .bind(&request.name)
            .bind(request.description.clone().flatten())
            .bind(request.is_active)
            .bind(request.clears_description())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("category {}", category_id)))?;
        category_from_row(&row)
    }

    /// Delete a category; its weights and ratings go with it
    pub async fn delete_category(&self, household_id: Uuid, category_id: Uuid) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND household_id = $2")
            .bind(category_id)
            .bind(household_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("category {}", category_id)));
        }
        Ok(())
    }

    // ---- weights ----

    pub async fn weights_for_member(&self, member_id: Uuid) -> Result<HashMap<Uuid, Weight>, PostgresError> {
        let rows = sqlx::query(
            "SELECT category_id, weight FROM category_weights WHERE household_user_id = $1",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(Uuid, Weight), PostgresError> {
                Ok((row.try_get("category_id")?, level(row.try_get("weight")?, "weight")?))
            })
            .collect()
    }

    /// Weights of every member of the household, keyed by member id
    pub async fn weights_for_household(
        &self,
        household_id: Uuid,
    ) -> Result<HashMap<Uuid, HashMap<Uuid, Weight>>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT w.household_user_id, w.category_id, w.weight
            FROM category_weights w
            JOIN household_users u ON u.id = w.household_user_id
            WHERE u.household_id = $1
            "#,
        )
        .bind(household_id)
        .fetch_all(&self.pool)
        .await?;

        let mut weights: HashMap<Uuid, HashMap<Uuid, Weight>> = HashMap::new();
        for row in &rows {
            let weight: Weight = level(row.try_get("weight")?, "weight")?;
            weights
                .entry(row.try_get("household_user_id")?)
                .or_default()
                .insert(row.try_get("category_id")?, weight);
        }
        Ok(weights)
    }

    async fn upsert_weight<'e, E>(
        executor: E,
        household_id: Uuid,
        member_id: Uuid,
        input: WeightInput,
    ) -> Result<(), PostgresError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // The SELECT keeps writes inside the member's own household
        let result = sqlx::query(
            r#"
            INSERT INTO category_weights (household_user_id, category_id, weight, updated_at)
            SELECT $1, c.id, $3, NOW()
            FROM categories c
            WHERE c.id = $2 AND c.household_id = $4
            ON CONFLICT (household_user_id, category_id)
            DO UPDATE SET
                weight = EXCLUDED.weight,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(member_id)
        .bind(input.category_id)
        .bind(i16::from(input.weight))
        .bind(household_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("category {}", input.category_id)));
        }
        Ok(())
    }

    pub async fn set_weight(
        &self,
        household_id: Uuid,
        member_id: Uuid,
        category_id: Uuid,
        weight: Weight,
    ) -> Result<(), PostgresError> {
        Self::upsert_weight(&self.pool, household_id, member_id, WeightInput { category_id, weight }).await?;
        tracing::debug!("Set weight {} for member {} on category {}", weight, member_id, category_id);
        Ok(())
    }

    /// Set several weights at once; nothing is written if any category is unknown
    pub async fn set_weights(
        &self,
        household_id: Uuid,
        member_id: Uuid,
        weights: &[WeightInput],
    ) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;
        for input in weights {
            Self::upsert_weight(&mut *tx, household_id, member_id, *input).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Return a weight to "not set"
    pub async fn clear_weight(&self, member_id: Uuid, category_id: Uuid) -> Result<bool, PostgresError> {
        let result = sqlx::query(
            "DELETE FROM category_weights WHERE household_user_id = $1 AND category_id = $2",
        )
        .bind(member_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- houses ----

    /// Active or archived houses, newest first, optionally filtered by a search term
    pub async fn list_houses(
        &self,
        household_id: Uuid,
        archived: bool,
        search: Option<&str>,
    ) -> Result<Vec<House>, PostgresError> {
        let query = format!(
            r#"
            SELECT {}
            FROM houses
            WHERE household_id = $1
              AND is_active = $2
              AND ($3::TEXT IS NULL
                   OR address ILIKE $3
                   OR nickname ILIKE $3
                   OR city ILIKE $3
                   OR zip ILIKE $3)
            ORDER BY created_at DESC
            "#,
            HOUSE_COLUMNS
        );
        let pattern = search.map(str::trim).filter(|q| !q.is_empty()).map(like_pattern);

        let rows = sqlx::query(&query)
            .bind(household_id)
            .bind(!archived)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(house_from_row).collect()
    }

    /// (active, archived) house counts
    pub async fn count_houses(&self, household_id: Uuid) -> Result<(i64, i64), PostgresError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE is_active) AS active,
                COUNT(*) FILTER (WHERE NOT is_active) AS archived
            FROM houses
            WHERE household_id = $1
            "#,
        )
        .bind(household_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.try_get("active")?, row.try_get("archived")?))
    }

    pub async fn get_house(&self, household_id: Uuid, house_id: Uuid) -> Result<House, PostgresError> {
        let query = format!(
            "SELECT {} FROM houses WHERE id = $1 AND household_id = $2",
            HOUSE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(house_id)
            .bind(household_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("house {}", house_id)))?;
        house_from_row(&row)
    }

    pub async fn create_house(&self, household_id: Uuid, form: &HouseForm) -> Result<House, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO houses (
                id, household_id, nickname, address, city, state, zip, price, bedrooms,
                bathrooms, square_feet, lot_size_sqft, year_built, property_type,
                listing_url, notes, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            HOUSE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(household_id)
            .bind(&form.nickname)
            .bind(&form.address)
            .bind(&form.city)
            .bind(&form.state)
            .bind(&form.zip)
            .bind(form.price)
            .bind(form.bedrooms)
            .bind(form.bathrooms)
            .bind(form.square_feet)
            .bind(form.lot_size_sqft)
            .bind(form.year_built)
            .bind(form.property_type)
            .bind(&form.listing_url)
            .bind(&form.notes)
            .bind(form.latitude)
            .bind(form.longitude)
            .fetch_one(&self.pool)
            .await?;
        house_from_row(&row)
    }

    /// Replace every editable field of a house
    pub async fn update_house(
        &self,
        household_id: Uuid,
        house_id: Uuid,
        form: &HouseForm,
    ) -> Result<House, PostgresError> {
        let query = format!(
            r#"
            UPDATE houses SET
                nickname = $3, address = $4, city = $5, state = $6, zip = $7, price = $8,
                bedrooms = $9, bathrooms = $10, square_feet = $11, lot_size_sqft = $12,
                year_built = $13, property_type = $14, listing_url = $15, notes = $16,
                latitude = $17, longitude = $18, updated_at = NOW()
            WHERE id = $1 AND household_id = $2
            RETURNING {}
            "#,
            HOUSE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(house_id)
            .bind(household_id)
            .bind(&form.nickname)
            .bind(&form.address)
            .bind(&form.city)
            .bind(&form.state)
            .bind(&form.zip)
            .bind(form.price)
            .bind(form.bedrooms)
            .bind(form.bathrooms)
            .bind(form.square_feet)
            .bind(form.lot_size_sqft)
            .bind(form.year_built)
            .bind(form.property_type)
            .bind(&form.listing_url)
            .bind(&form.notes)
            .bind(form.latitude)
            .bind(form.longitude)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("house {}", house_id)))?;
        house_from_row(&row)
    }

    /// Archive (`active = false`) or restore a house
    pub async fn set_house_active(
        &self,
        household_id: Uuid,
        house_id: Uuid,
        active: bool,
    ) -> Result<House, PostgresError> {
        let query = format!(
            "UPDATE houses SET is_active = $3, updated_at = NOW() \
             WHERE id = $1 AND household_id = $2 RETURNING {}",
            HOUSE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(house_id)
            .bind(household_id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("house {}", house_id)))?;

        tracing::info!(
            "House {} {}",
            house_id,
            if active { "restored" } else { "archived" }
        );
        house_from_row(&row)
    }

    // ---- ratings ----

    /// The member's rating rows for one house, including notes-only rows
    pub async fn ratings_for_house(
        &self,
        member_id: Uuid,
        house_id: Uuid,
    ) -> Result<Vec<HouseRating>, PostgresError> {
        let query = format!(
            "SELECT {} FROM house_ratings WHERE household_user_id = $1 AND house_id = $2",
            RATING_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(member_id)
            .bind(house_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(rating_from_row).collect()
    }

    /// Every rating the member has given, keyed by house then category
    pub async fn ratings_for_member(
        &self,
        member_id: Uuid,
    ) -> Result<HashMap<Uuid, HashMap<Uuid, Rating>>, PostgresError> {
        let rows = sqlx::query(
            "SELECT house_id, category_id, rating FROM house_ratings \
             WHERE household_user_id = $1 AND rating IS NOT NULL",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        let mut ratings: HashMap<Uuid, HashMap<Uuid, Rating>> = HashMap::new();
        for row in &rows {
            let rating: Rating = level(row.try_get("rating")?, "rating")?;
            ratings
                .entry(row.try_get("house_id")?)
                .or_default()
                .insert(row.try_get("category_id")?, rating);
        }
        Ok(ratings)
    }

    /// Every member's ratings for one house, keyed by member then category
    pub async fn ratings_by_member_for_house(
        &self,
        house_id: Uuid,
    ) -> Result<HashMap<Uuid, HashMap<Uuid, Rating>>, PostgresError> {
        let rows = sqlx::query(
            "SELECT household_user_id, category_id, rating FROM house_ratings \
             WHERE house_id = $1 AND rating IS NOT NULL",
        )
        .bind(house_id)
        .fetch_all(&self.pool)
        .await?;

        let mut ratings: HashMap<Uuid, HashMap<Uuid, Rating>> = HashMap::new();
        for row in &rows {
            let rating: Rating = level(row.try_get("rating")?, "rating")?;
            ratings
                .entry(row.try_get("household_user_id")?)
                .or_default()
                .insert(row.try_get("category_id")?, rating);
        }
        Ok(ratings)
    }

    /// Insert or replace a rating, keeping any notes already on the row
    pub async fn set_rating(
        &self,
        member_id: Uuid,
        house_id: Uuid,
        category_id: Uuid,
        rating: Rating,
    ) -> Result<HouseRating, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO house_ratings (id, household_user_id, house_id, category_id, rating, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (household_user_id, house_id, category_id)
            DO UPDATE SET
                rating = EXCLUDED.rating,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            RATING_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(member_id)
            .bind(house_id)
            .bind(category_id)
            .bind(i16::from(rating))
            .fetch_one(&self.pool)
            .await?;
        rating_from_row(&row)
    }

    /// Insert or replace notes, keeping any rating already on the row
    pub async fn set_rating_notes(
        &self,
        member_id: Uuid,
        house_id: Uuid,
        category_id: Uuid,
        notes: Option<&str>,
    ) -> Result<HouseRating, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO house_ratings (id, household_user_id, house_id, category_id, notes, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (household_user_id, house_id, category_id)
            DO UPDATE SET
                notes = EXCLUDED.notes,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            RATING_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(member_id)
            .bind(house_id)
            .bind(category_id)
            .bind(notes)
            .fetch_one(&self.pool)
            .await?;
        rating_from_row(&row)
    }

    // ---- onboarding ----

    fn decode_onboarding(member_id: Uuid, value: Option<serde_json::Value>) -> OnboardingState {
        value
            .and_then(|v| match serde_json::from_value::<OnboardingState>(v) {
                Ok(state) => Some(state.migrate()),
                Err(e) => {
                    tracing::warn!("Discarding unreadable onboarding state for {}: {}", member_id, e);
                    None
                }
            })
            .unwrap_or_default()
    }

    pub async fn get_onboarding(&self, member_id: Uuid) -> Result<OnboardingState, PostgresError> {
        let row = sqlx::query("SELECT onboarding_state FROM household_users WHERE id = $1")
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("member {}", member_id)))?;

        Ok(Self::decode_onboarding(member_id, row.try_get("onboarding_state")?))
    }

    /// Apply an onboarding action under a row lock and persist the result if it changed
    pub async fn apply_onboarding(
        &self,
        member_id: Uuid,
        action: OnboardingAction,
    ) -> Result<OnboardingState, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT onboarding_state FROM household_users WHERE id = $1 FOR UPDATE")
            .bind(member_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("member {}", member_id)))?;

        let mut state = Self::decode_onboarding(member_id, row.try_get("onboarding_state")?);
        if state.apply(action) {
            sqlx::query("UPDATE household_users SET onboarding_state = $2 WHERE id = $1")
                .bind(member_id)
                .bind(sqlx::types::Json(&state))
                .execute(&mut *tx)
                .await?;
            tracing::debug!("Onboarding for {} updated by {:?}", member_id, action);
        }

        tx.commit().await?;
        Ok(state)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
