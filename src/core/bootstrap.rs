use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;

pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    let email = admin.first_admin_email.trim().to_lowercase();
    let email = email.as_str();
    if email.is_empty() {
        tracing::warn!("FIRST_ADMIN_EMAIL not configured; skipping admin bootstrap");
        return Ok(());
    }

    if let Some(existing) = repositories::users::find_by_email(state.db(), email).await? {
        if existing.role != UserRole::Admin {
            tracing::warn!(email, "Bootstrap admin email belongs to a non-admin account");
        } else {
            tracing::info!(email, "Bootstrap admin already exists");
        }
        return Ok(());
    }

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email,
            name: &admin.first_admin_name,
            role: UserRole::Admin,
            status: AccountStatus::Active,
            phone_number: None,
            birth_date: None,
            picture: None,
            picture_key: None,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(email, "Created bootstrap admin");
    Ok(())
}
