//! Typed repository calls over the `users` table and its profile tables.

use sqlx::{Sqlite, SqlitePool, Transaction};

use super::models::{
    Account, BuyerProfile, CooperativeProfile, FarmerProfile, NewAccount, Profile,
    ProfileFields, Role, RoleCounts,
};

const ACCOUNT_COLUMNS: &str = "user_id, full_name, email, phone, password_hash, role, photo, \
                               created_at, updated_at";

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM users WHERE email = ? COLLATE NOCASE",
        ACCOUNT_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM users WHERE user_id = ?",
        ACCOUNT_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT user_id FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

/// Insert an account and its role profile as one unit.
///
/// Both inserts share a transaction: if the profile insert fails the account
/// row is rolled back, so no account ever exists without its profile.
pub async fn create_account_with_profile(
    pool: &SqlitePool,
    new: &NewAccount,
) -> Result<Account, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO users (full_name, email, phone, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.full_name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.password_hash)
    .bind(new.role)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    let user_id = result.last_insert_rowid();
    insert_profile(&mut tx, user_id, new).await?;

    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM users WHERE user_id = ?",
        ACCOUNT_COLUMNS
    ))
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(account)
}

async fn insert_profile(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    new: &NewAccount,
) -> Result<(), sqlx::Error> {
    let profile = &new.profile;
    match new.role {
        Role::Farmer => {
            sqlx::query(
                "INSERT INTO farmers (user_id, farm_name, location, farm_type, bio) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(&profile.farm_name)
            .bind(&profile.location)
            .bind(&profile.farm_type)
            .bind(&profile.bio)
            .execute(&mut **tx)
            .await?;
        }
        Role::Buyer => {
            sqlx::query("INSERT INTO buyers (user_id, location) VALUES (?, ?)")
                .bind(user_id)
                .bind(&profile.location)
                .execute(&mut **tx)
                .await?;
        }
        Role::Cooperative => {
            sqlx::query(
                "INSERT INTO cooperatives (user_id, cooperative_name, location, description) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(&profile.cooperative_name)
            .bind(&profile.location)
            .bind(&profile.description)
            .execute(&mut **tx)
            .await?;
        }
        Role::Admin => {}
    }
    Ok(())
}

/// Returns false when no account has this id
pub async fn update_contact(
    pool: &SqlitePool,
    user_id: i64,
    full_name: &str,
    email: &str,
    phone: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET full_name = ?, email = ?, phone = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(full_name)
    .bind(email)
    .bind(phone)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_password_hash(
    pool: &SqlitePool,
    user_id: i64,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE user_id = ?")
        .bind(password_hash)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Overwrite the profile columns that are `Some`; `None` keeps the stored value.
/// Columns that do not belong to `role` are ignored. Returns false when the
/// account has no profile row (admins never do).
pub async fn update_profile(
    pool: &SqlitePool,
    role: Role,
    user_id: i64,
    fields: &ProfileFields,
) -> Result<bool, sqlx::Error> {
    let result = match role {
        Role::Farmer => {
            sqlx::query(
                r#"
                UPDATE farmers SET
                    farm_name = COALESCE(?, farm_name),
                    location = COALESCE(?, location),
                    farm_type = COALESCE(?, farm_type),
                    bio = COALESCE(?, bio)
                WHERE user_id = ?
                "#,
            )
            .bind(&fields.farm_name)
            .bind(&fields.location)
            .bind(&fields.farm_type)
            .bind(&fields.bio)
            .bind(user_id)
            .execute(pool)
            .await?
        }
        Role::Buyer => {
            sqlx::query("UPDATE buyers SET location = COALESCE(?, location) WHERE user_id = ?")
                .bind(&fields.location)
                .bind(user_id)
                .execute(pool)
                .await?
        }
        Role::Cooperative => {
            sqlx::query(
                r#"
                UPDATE cooperatives SET
                    cooperative_name = COALESCE(?, cooperative_name),
                    location = COALESCE(?, location),
                    description = COALESCE(?, description),
                    updated_at = ?
                WHERE user_id = ?
                "#,
            )
            .bind(&fields.cooperative_name)
            .bind(&fields.location)
            .bind(&fields.description)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(user_id)
            .execute(pool)
            .await?
        }
        Role::Admin => return Ok(false),
    };
    Ok(result.rows_affected() > 0)
}

/// Set or clear the photo URL. The file itself lives with the upload service.
pub async fn update_photo(
    pool: &SqlitePool,
    user_id: i64,
    photo: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET photo = ?, updated_at = ? WHERE user_id = ?")
        .bind(photo)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Profile rows go with the account through `ON DELETE CASCADE`
pub async fn delete_account(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_accounts(
    pool: &SqlitePool,
    role: Option<Role>,
) -> Result<Vec<Account>, sqlx::Error> {
    match role {
        Some(role) => {
            sqlx::query_as::<_, Account>(&format!(
                "SELECT {} FROM users WHERE role = ? ORDER BY created_at DESC, user_id DESC",
                ACCOUNT_COLUMNS
            ))
            .bind(role)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Account>(&format!(
                "SELECT {} FROM users ORDER BY created_at DESC, user_id DESC",
                ACCOUNT_COLUMNS
            ))
            .fetch_all(pool)
            .await
        }
    }
}

/// Number of profile rows linked to `user_id` for this role (0 for admin)
pub async fn count_profiles(
    pool: &SqlitePool,
    role: Role,
    user_id: i64,
) -> Result<i64, sqlx::Error> {
    let Some(table) = role.profile_table() else {
        return Ok(0);
    };
    let (count,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM {} WHERE user_id = ?", table))
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn load_profile(
    pool: &SqlitePool,
    role: Role,
    user_id: i64,
) -> Result<Option<Profile>, sqlx::Error> {
    let profile = match role {
        Role::Farmer => {
            sqlx::query_as::<_, FarmerProfile>("SELECT * FROM farmers WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .map(Profile::Farmer)
        }
        Role::Buyer => sqlx::query_as::<_, BuyerProfile>("SELECT * FROM buyers WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .map(Profile::Buyer),
        Role::Cooperative => {
            sqlx::query_as::<_, CooperativeProfile>("SELECT * FROM cooperatives WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .map(Profile::Cooperative)
        }
        Role::Admin => None,
    };
    Ok(profile)
}

pub async fn count_by_role(pool: &SqlitePool) -> Result<RoleCounts, sqlx::Error> {
    let rows: Vec<(Role, i64)> = sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role")
        .fetch_all(pool)
        .await?;

    let mut counts = RoleCounts::default();
    for (role, count) in rows {
        match role {
            Role::Buyer => counts.buyers = count,
            Role::Farmer => counts.farmers = count,
            Role::Cooperative => counts.cooperatives = count,
            Role::Admin => counts.admins = count,
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{is_unique_violation, test_pool, ProfileFields};

    fn new_account(email: &str, role: Role) -> NewAccount {
        NewAccount {
            full_name: "Jane Doe".to_string(),
            email: email.to_string(),
            phone: "0788000000".to_string(),
            password_hash: "$argon2id$v=19$placeholder".to_string(),
            role,
            profile: ProfileFields::default(),
        }
    }

    async fn count_users(pool: &SqlitePool) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_create_account_creates_matching_profile() {
        let pool = test_pool().await;

        for (i, role) in [Role::Farmer, Role::Buyer, Role::Cooperative].into_iter().enumerate() {
            let email = format!("user{}@test.rw", i);
            let account = create_account_with_profile(&pool, &new_account(&email, role))
                .await
                .unwrap();
            assert_eq!(account.role, role);
            assert_eq!(count_profiles(&pool, role, account.user_id).await.unwrap(), 1);
            assert!(load_profile(&pool, role, account.user_id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_admin_has_no_profile() {
        let pool = test_pool().await;
        let account = create_account_with_profile(&pool, &new_account("admin@test.rw", Role::Admin))
            .await
            .unwrap();
        assert_eq!(count_profiles(&pool, Role::Admin, account.user_id).await.unwrap(), 0);
        assert!(load_profile(&pool, Role::Admin, account.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_failure_rolls_back_account() {
        for role in [Role::Farmer, Role::Buyer, Role::Cooperative] {
            let pool = test_pool().await;
            let table = role.profile_table().unwrap();
            sqlx::query(&format!(
                "CREATE TRIGGER reject_profile BEFORE INSERT ON {} \
                 BEGIN SELECT RAISE(ABORT, 'profile insert rejected'); END",
                table
            ))
            .execute(&pool)
            .await
            .unwrap();

            let result =
                create_account_with_profile(&pool, &new_account("jane@test.rw", role)).await;
            assert!(result.is_err(), "profile failure must surface for {}", role);
            assert_eq!(count_users(&pool).await, 0, "orphan account left behind for {}", role);
            assert!(!email_exists(&pool, "jane@test.rw").await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let pool = test_pool().await;
        create_account_with_profile(&pool, &new_account("jane@test.rw", Role::Farmer))
            .await
            .unwrap();

        let err = create_account_with_profile(&pool, &new_account("JANE@test.rw", Role::Buyer))
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert_eq!(count_users(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let pool = test_pool().await;
        let created = create_account_with_profile(&pool, &new_account("jane@test.rw", Role::Buyer))
            .await
            .unwrap();

        let found = find_by_email(&pool, "Jane@Test.rw").await.unwrap().unwrap();
        assert_eq!(found.user_id, created.user_id);
        assert!(find_by_email(&pool, "nobody@test.rw").await.unwrap().is_none());
        assert!(find_by_id(&pool, created.user_id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_profile() {
        let pool = test_pool().await;
        let account = create_account_with_profile(&pool, &new_account("jane@test.rw", Role::Farmer))
            .await
            .unwrap();

        assert!(delete_account(&pool, account.user_id).await.unwrap());
        assert_eq!(count_profiles(&pool, Role::Farmer, account.user_id).await.unwrap(), 0);
        assert!(!delete_account(&pool, account.user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_contact_and_password() {
        let pool = test_pool().await;
        let account = create_account_with_profile(&pool, &new_account("jane@test.rw", Role::Buyer))
            .await
            .unwrap();

        assert!(update_contact(&pool, account.user_id, "Jane D", "jd@test.rw", "0788111111")
            .await
            .unwrap());
        assert!(update_password_hash(&pool, account.user_id, "new-hash").await.unwrap());

        let updated = find_by_id(&pool, account.user_id).await.unwrap().unwrap();
        assert_eq!(updated.full_name, "Jane D");
        assert_eq!(updated.email, "jd@test.rw");
        assert_eq!(updated.password_hash, "new-hash");

        assert!(!update_contact(&pool, 9999, "x", "x@y.rw", "1").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unset_columns() {
        let pool = test_pool().await;
        let mut new = new_account("jane@test.rw", Role::Farmer);
        new.profile.farm_name = Some("Green Hills".to_string());
        let account = create_account_with_profile(&pool, &new).await.unwrap();

        let fields = ProfileFields {
            location: Some("Musanze".to_string()),
            bio: Some("Potatoes and beans".to_string()),
            cooperative_name: Some("ignored for farmers".to_string()),
            ..ProfileFields::default()
        };
        assert!(update_profile(&pool, Role::Farmer, account.user_id, &fields).await.unwrap());

        let Some(Profile::Farmer(profile)) =
            load_profile(&pool, Role::Farmer, account.user_id).await.unwrap()
        else {
            panic!("farmer profile missing");
        };
        assert_eq!(profile.farm_name.as_deref(), Some("Green Hills"));
        assert_eq!(profile.location.as_deref(), Some("Musanze"));
        assert_eq!(profile.bio.as_deref(), Some("Potatoes and beans"));
    }

    #[tokio::test]
    async fn test_update_profile_without_row() {
        let pool = test_pool().await;
        let admin = create_account_with_profile(&pool, &new_account("admin@test.rw", Role::Admin))
            .await
            .unwrap();
        let fields = ProfileFields {
            location: Some("Kigali".to_string()),
            ..ProfileFields::default()
        };

        assert!(!update_profile(&pool, Role::Admin, admin.user_id, &fields).await.unwrap());
        assert!(!update_profile(&pool, Role::Buyer, 9999, &fields).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_photo() {
        let pool = test_pool().await;
        let account = create_account_with_profile(&pool, &new_account("jane@test.rw", Role::Buyer))
            .await
            .unwrap();

        assert!(update_photo(&pool, account.user_id, Some("/uploads/jane.jpg")).await.unwrap());
        let found = find_by_id(&pool, account.user_id).await.unwrap().unwrap();
        assert_eq!(found.photo.as_deref(), Some("/uploads/jane.jpg"));

        assert!(update_photo(&pool, account.user_id, None).await.unwrap());
        let found = find_by_id(&pool, account.user_id).await.unwrap().unwrap();
        assert!(found.photo.is_none());

        assert!(!update_photo(&pool, 9999, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_count_by_role() {
        let pool = test_pool().await;
        create_account_with_profile(&pool, &new_account("f1@test.rw", Role::Farmer)).await.unwrap();
        create_account_with_profile(&pool, &new_account("f2@test.rw", Role::Farmer)).await.unwrap();
        create_account_with_profile(&pool, &new_account("b1@test.rw", Role::Buyer)).await.unwrap();

        assert_eq!(list_accounts(&pool, None).await.unwrap().len(), 3);
        assert_eq!(list_accounts(&pool, Some(Role::Farmer)).await.unwrap().len(), 2);
        assert!(list_accounts(&pool, Some(Role::Admin)).await.unwrap().is_empty());

        let counts = count_by_role(&pool).await.unwrap();
        assert_eq!(counts.farmers, 2);
        assert_eq!(counts.buyers, 1);
        assert_eq!(counts.cooperatives, 0);
    }
}
