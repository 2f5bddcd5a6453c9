use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::config::Settings;

pub(crate) const PROFILE_PICTURES_FOLDER: &str = "profile_pictures";
pub(crate) const TASK_PROOFS_FOLDER: &str = "task_proofs";

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
    public_base_url: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredObject {
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) size: i64,
    pub(crate) sha256: String,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().access_key.is_empty() || settings.s3().secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "task-scheduler-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build();
        let client = Client::from_conf(s3_config);

        Ok(Some(Self {
            client,
            bucket: settings.s3().bucket.clone(),
            public_base_url: settings.s3().public_base_url(),
        }))
    }

    pub(crate) fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }

    pub(crate) async fn upload_bytes(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<StoredObject> {
        let size = bytes.len() as i64;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(StoredObject { key: key.to_string(), url: self.object_url(key), size, sha256 })
    }

    pub(crate) async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client.delete_object().bucket(&self.bucket).key(key).send().await?;
        Ok(())
    }

    pub(crate) async fn delete_quietly(&self, key: &str) {
        if let Err(err) = self.delete_object(key).await {
            tracing::warn!(error = %err, key, "Failed to delete stored object");
        }
    }
}

pub(crate) fn object_key(folder: &str, owner_id: &str, extension: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{folder}/{owner_id}_{millis}_{}.{extension}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::{object_key, StorageService, TASK_PROOFS_FOLDER};
    use crate::core::config::Settings;
    use crate::test_support;

    #[test]
    fn object_keys_are_unique_and_scoped() {
        let first = object_key(TASK_PROOFS_FOLDER, "task-1", "png");
        let second = object_key(TASK_PROOFS_FOLDER, "task-1", "png");

        assert!(first.starts_with("task_proofs/task-1_"));
        assert!(first.ends_with(".png"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn storage_is_disabled_without_credentials() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings).await.expect("storage");
        assert!(storage.is_none());
    }

    #[tokio::test]
    async fn object_url_uses_public_base() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_storage_env();
        std::env::set_var("S3_PUBLIC_URL", "https://cdn.example.com/assets/");

        let settings = Settings::load().expect("settings");
        std::env::remove_var("S3_PUBLIC_URL");
        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        assert_eq!(
            storage.object_url("task_proofs/a.png"),
            "https://cdn.example.com/assets/task_proofs/a.png"
        );
    }
}
