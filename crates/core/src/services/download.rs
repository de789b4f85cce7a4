//! Download service: quota-gated asset unlocks.
//!
//! The quota counts distinct products per user, so repeated presigns of the
//! same product never consume additional slots.

use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{download, user_profile::SubscriptionTier},
    repositories::{DownloadRepository, ProductRepository, UserProfileRepository},
};
use chrono::Utc;
use sea_orm::Set;

/// Result of a presign request.
#[derive(Debug, Clone)]
pub struct PresignResult {
    pub download: download::Model,
    /// Slots left after this request; `None` for unlimited tiers.
    pub remaining: Option<u64>,
}

/// Download service.
#[derive(Clone)]
pub struct DownloadService {
    download_repo: DownloadRepository,
    product_repo: ProductRepository,
    profile_repo: UserProfileRepository,
    id_gen: IdGenerator,
}

impl DownloadService {
    /// Create a new download service.
    #[must_use]
    pub const fn new(
        download_repo: DownloadRepository,
        product_repo: ProductRepository,
        profile_repo: UserProfileRepository,
    ) -> Self {
        Self {
            download_repo,
            product_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Presign a product download.
    ///
    /// A product the user already unlocked is refreshed in place without
    /// touching the quota. A new product consumes one quota slot; when the
    /// tier's limit is exhausted the request fails with a 403.
    pub async fn presign(
        &self,
        user_id: &str,
        product_id: &str,
        format: Option<String>,
    ) -> AppResult<PresignResult> {
        let tier = self.tier(user_id).await?;
        let used = self.download_repo.count_distinct_products(user_id).await?;

        if let Some(existing) = self
            .download_repo
            .find_by_user_and_product(user_id, product_id)
            .await?
        {
            let refreshed = self
                .download_repo
                .touch(existing, Utc::now().into())
                .await?;
            return Ok(PresignResult {
                download: refreshed,
                remaining: tier.download_limit().map(|limit| limit.saturating_sub(used)),
            });
        }

        if let Some(limit) = tier.download_limit() {
            if used >= limit {
                return Err(AppError::Forbidden(format!(
                    "Download limit reached for the {} plan ({limit} products)",
                    tier.as_str()
                )));
            }
        }

        let product = self.product_repo.get_by_id(product_id).await?;

        let model = download::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            product_id: Set(product_id.to_string()),
            format: Set(format),
            file_url: Set(product.image_url),
            created_at: Set(Utc::now().into()),
        };
        let download = self.download_repo.create(model).await?;

        Ok(PresignResult {
            download,
            remaining: tier
                .download_limit()
                .map(|limit| limit.saturating_sub(used + 1)),
        })
    }

    /// List a user's downloads.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<download::Model>> {
        self.download_repo.find_by_user(user_id).await
    }

    /// Quota slots the user has left; `None` for unlimited tiers.
    pub async fn remaining(&self, user_id: &str) -> AppResult<Option<u64>> {
        let tier = self.tier(user_id).await?;
        let Some(limit) = tier.download_limit() else {
            return Ok(None);
        };

        let used = self.download_repo.count_distinct_products(user_id).await?;
        Ok(Some(limit.saturating_sub(used)))
    }

    /// Delete a ledger entry. Freed slots become usable again.
    pub async fn delete(&self, user_id: &str, download_id: &str) -> AppResult<()> {
        let entry = self
            .download_repo
            .find_by_id(download_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Download not found: {download_id}")))?;

        if entry.user_id != user_id {
            return Err(AppError::Forbidden("Not your download".to_string()));
        }

        self.download_repo.delete(entry).await
    }

    async fn tier(&self, user_id: &str) -> AppResult<SubscriptionTier> {
        Ok(self
            .profile_repo
            .find_by_user_id(user_id)
            .await?
            .map_or(SubscriptionTier::Trial, |p| p.subscription_type))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_db::entities::user_profile;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn profile(tier: SubscriptionTier) -> user_profile::Model {
        user_profile::Model {
            user_id: "u1".to_string(),
            password: None,
            subscription_type: tier,
            card_number: String::new(),
            card_holder: String::new(),
            card_expiry: String::new(),
            chat_notifications: true,
            new_models_notifications: false,
            password_reset_token: None,
            password_reset_expires_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn distinct_rows(ids: &[&str]) -> Vec<std::collections::BTreeMap<&'static str, sea_orm::Value>> {
        ids.iter()
            .map(|id| {
                let mut row = std::collections::BTreeMap::new();
                row.insert(
                    "product_id",
                    sea_orm::Value::String(Some(Box::new((*id).to_string()))),
                );
                row
            })
            .collect()
    }

    fn entry(product_id: &str) -> download::Model {
        download::Model {
            id: "d1".to_string(),
            user_id: "u1".to_string(),
            product_id: product_id.to_string(),
            format: None,
            file_url: Some("https://cdn.example.com/p1.png".to_string()),
            created_at: Utc::now().into(),
        }
    }

    fn product(id: &str) -> atelier_db::entities::product::Model {
        atelier_db::entities::product::Model {
            id: id.to_string(),
            title: "Chair".to_string(),
            category_id: "c1".to_string(),
            description: String::new(),
            price: rust_decimal::Decimal::new(1000, 2),
            material: String::new(),
            style: String::new(),
            color: String::new(),
            is_active: true,
            is_trending: false,
            image_url: Some("https://cdn.example.com/p4.png".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_presign_refreshes_existing_entry_without_quota() {
        // Trial user already at the 3-product limit; re-requesting an
        // unlocked product must still succeed and leave remaining at zero
        let download_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([distinct_rows(&["p1", "p2", "p3"])])
                .append_query_results([[entry("p1")]])
                .append_query_results([[entry("p1")]])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile(SubscriptionTier::Trial)]])
                .into_connection(),
        );

        let service = DownloadService::new(
            DownloadRepository::new(download_db),
            ProductRepository::new(product_db),
            UserProfileRepository::new(profile_db),
        );

        let result = service.presign("u1", "p1", None).await.unwrap();
        assert_eq!(result.download.product_id, "p1");
        assert_eq!(result.remaining, Some(0));
    }

    #[tokio::test]
    async fn test_presign_premium_reports_unlimited() {
        let download_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([distinct_rows(&["p1", "p2", "p3"])])
                .append_query_results([Vec::<download::Model>::new()])
                .append_query_results([[entry("p4")]])
                .into_connection(),
        );
        let product_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[product("p4")]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile(SubscriptionTier::Premium)]])
                .into_connection(),
        );

        let service = DownloadService::new(
            DownloadRepository::new(download_db),
            ProductRepository::new(product_db),
            UserProfileRepository::new(profile_db),
        );

        let result = service.presign("u1", "p4", None).await.unwrap();
        assert_eq!(result.remaining, None);
    }

    #[tokio::test]
    async fn test_presign_blocked_when_trial_quota_exhausted() {
        let download_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // three distinct products already unlocked
                .append_query_results([distinct_rows(&["p1", "p2", "p3"])])
                // no existing entry for the requested product
                .append_query_results([Vec::<download::Model>::new()])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile(SubscriptionTier::Trial)]])
                .into_connection(),
        );

        let service = DownloadService::new(
            DownloadRepository::new(download_db),
            ProductRepository::new(product_db),
            UserProfileRepository::new(profile_db),
        );

        let result = service.presign("u1", "p4", None).await;
        match result {
            Err(AppError::Forbidden(msg)) => assert!(msg.contains("trial")),
            other => panic!("Expected Forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remaining_for_basic_tier() {
        let download_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([distinct_rows(&["p1", "p2"])])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile(SubscriptionTier::Basic)]])
                .into_connection(),
        );

        let service = DownloadService::new(
            DownloadRepository::new(download_db),
            ProductRepository::new(product_db),
            UserProfileRepository::new(profile_db),
        );

        let remaining = service.remaining("u1").await.unwrap();
        assert_eq!(remaining, Some(8));
    }

    #[tokio::test]
    async fn test_remaining_unlimited_for_premium() {
        let download_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile(SubscriptionTier::Premium)]])
                .into_connection(),
        );

        let service = DownloadService::new(
            DownloadRepository::new(download_db),
            ProductRepository::new(product_db),
            UserProfileRepository::new(profile_db),
        );

        let remaining = service.remaining("u1").await.unwrap();
        assert_eq!(remaining, None);
    }
}
