//! Category repository, including the lazily created system categories.

use chrono::Utc;
use fintrack_core::ledger::validation::{
    check_merge, ensure_category_deletable, ensure_not_reserved, ensure_not_system, validate_name,
};
use fintrack_core::ledger::{CategoryType, LedgerError, MergeAction, SystemCategory};
use fintrack_shared::types::{CategoryId, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use super::error::{RepoResult, RepositoryError};
use crate::entities::{categories, sea_orm_active_enums, transactions};

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New type.
    pub category_type: Option<CategoryType>,
}

/// Filter options for listing categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Include inactive categories.
    pub include_inactive: bool,
    /// Only this type.
    pub category_type: Option<CategoryType>,
}

/// Loads a category owned by `user_id`.
pub(crate) async fn load_category<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    category_id: CategoryId,
) -> RepoResult<categories::Model> {
    categories::Entity::find_by_id(category_id.into_inner())
        .filter(categories::Column::UserId.eq(user_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::CategoryNotFound(category_id).into())
}

/// Returns the user's system category, creating or reactivating it as needed.
///
/// The insert runs in a savepoint. A concurrent insert of the same category
/// surfaces as a unique violation; the savepoint is rolled back and the row
/// committed by the other writer is read instead.
pub(crate) async fn get_or_create_system<C: ConnectionTrait + TransactionTrait>(
    conn: &C,
    user_id: UserId,
    system: SystemCategory,
) -> RepoResult<categories::Model> {
    let db_type = sea_orm_active_enums::CategoryType::from(system.category_type());
    let find = || {
        categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id.into_inner()))
            .filter(categories::Column::Name.eq(system.name()))
            .filter(categories::Column::CategoryType.eq(db_type))
    };

    if let Some(existing) = find().one(conn).await? {
        if existing.active {
            return Ok(existing);
        }
        let mut active: categories::ActiveModel = existing.into();
        active.active = Set(true);
        active.updated_at = Set(Utc::now().into());
        return Ok(active.update(conn).await?);
    }

    let now = Utc::now().into();
    let category = categories::ActiveModel {
        id: Set(CategoryId::new().into_inner()),
        user_id: Set(user_id.into_inner()),
        name: Set(system.name().to_string()),
        category_type: Set(db_type),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let savepoint = conn.begin().await?;
    match category.insert(&savepoint).await {
        Ok(created) => {
            savepoint.commit().await?;
            Ok(created)
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            savepoint.rollback().await?;
            find()
                .one(conn)
                .await?
                .ok_or_else(|| RepositoryError::Database(err))
        }
        Err(err) => Err(err.into()),
    }
}

async fn count_references<C: ConnectionTrait>(conn: &C, category_id: CategoryId) -> RepoResult<u64> {
    Ok(transactions::Entity::find()
        .filter(transactions::Column::CategoryId.eq(category_id.into_inner()))
        .count(conn)
        .await?)
}

/// Category repository for CRUD, lifecycle and merge operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active category.
    ///
    /// # Errors
    ///
    /// Returns `SystemCategory` for the reserved name/type pairs and
    /// `DuplicateName` if `(name, type)` already exists for the user.
    pub async fn create(
        &self,
        user_id: UserId,
        name: &str,
        category_type: CategoryType,
    ) -> RepoResult<categories::Model> {
        let name = validate_name(name)?;
        ensure_not_reserved(&name, category_type)?;
        let now = Utc::now().into();

        let category = categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            name: Set(name.clone()),
            category_type: Set(category_type.into()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        category
            .insert(&self.db)
            .await
            .map_err(|e| RepositoryError::unique_or_db(e, &name))
    }

    /// Lists the user's categories ordered by type, then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &CategoryFilter,
    ) -> RepoResult<Vec<categories::Model>> {
        let mut query =
            categories::Entity::find().filter(categories::Column::UserId.eq(user_id.into_inner()));

        if !filter.include_inactive {
            query = query.filter(categories::Column::Active.eq(true));
        }
        if let Some(category_type) = filter.category_type {
            let db_type = sea_orm_active_enums::CategoryType::from(category_type);
            query = query.filter(categories::Column::CategoryType.eq(db_type));
        }

        Ok(query
            .order_by_asc(categories::Column::CategoryType)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Gets one category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if it does not exist for this user.
    pub async fn get(
        &self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> RepoResult<categories::Model> {
        load_category(&self.db, user_id, category_id).await
    }

    /// Renames a category and/or changes its type.
    ///
    /// # Errors
    ///
    /// Returns `SystemCategory` when touching a system category or renaming
    /// into a reserved pair, and `DuplicateName` on collision.
    pub async fn update(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        input: UpdateCategoryInput,
    ) -> RepoResult<categories::Model> {
        let txn = self.db.begin().await?;
        let existing = load_category(&txn, user_id, category_id).await?;
        let info = existing.to_info();
        ensure_not_system(&info)?;

        let name = match input.name {
            Some(name) => validate_name(&name)?,
            None => info.name.clone(),
        };
        let category_type = input.category_type.unwrap_or(info.category_type);
        ensure_not_reserved(&name, category_type)?;

        let mut active: categories::ActiveModel = existing.into();
        active.name = Set(name.clone());
        active.category_type = Set(category_type.into());
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| RepositoryError::unique_or_db(e, &name))?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Marks a category inactive.
    ///
    /// # Errors
    ///
    /// Returns `SystemCategory` for the transfer categories.
    pub async fn deactivate(
        &self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> RepoResult<categories::Model> {
        let txn = self.db.begin().await?;
        let existing = load_category(&txn, user_id, category_id).await?;
        ensure_not_system(&existing.to_info())?;

        let mut active: categories::ActiveModel = existing.into();
        active.active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes an unused, non-system category.
    ///
    /// # Errors
    ///
    /// Returns `SystemCategory` or `CategoryInUse`.
    pub async fn delete(&self, user_id: UserId, category_id: CategoryId) -> RepoResult<()> {
        let txn = self.db.begin().await?;
        let existing = load_category(&txn, user_id, category_id).await?;
        let references = count_references(&txn, category_id).await?;
        ensure_category_deletable(&existing.to_info(), references)?;

        categories::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Moves every transaction from `source` to `destination`.
    ///
    /// Returns the number of transactions moved; merging a category into
    /// itself moves nothing.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if either side is missing and
    /// `SystemCategory` if either side is a system category.
    pub async fn merge(
        &self,
        user_id: UserId,
        source: CategoryId,
        destination: CategoryId,
    ) -> RepoResult<u64> {
        let txn = self.db.begin().await?;
        let src = load_category(&txn, user_id, source).await?;
        let dst = load_category(&txn, user_id, destination).await?;

        if check_merge(&src.to_info(), &dst.to_info())? == MergeAction::Noop {
            return Ok(0);
        }

        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::CategoryId, Expr::value(dst.id))
            .col_expr(transactions::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(transactions::Column::UserId.eq(user_id.into_inner()))
            .filter(transactions::Column::CategoryId.eq(src.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(result.rows_affected)
    }
}
