use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use tokio::runtime::Handle;

const STATE_CONTENT_TYPE: &str = "application/json";

/// Destination for archived state snapshots.
///
/// Implementations are expected to encrypt objects at rest.
pub trait StateStore {
    fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String>;
}

/// S3-backed store; every object is written with SSE-S3 (AES256).
pub struct S3StateStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
    runtime: Handle,
}

impl S3StateStore {
    /// `runtime` drives the async SDK call; `write_object` must be called off
    /// that runtime's worker threads (e.g. from `spawn_blocking`).
    pub fn new(bucket: impl Into<String>, s3_client: aws_sdk_s3::Client, runtime: Handle) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
            runtime,
        }
    }
}

impl StateStore for S3StateStore {
    fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String> {
        let request = self
            .s3_client
            .put_object()
            .bucket(self.bucket.clone())
            .key(key)
            .body(ByteStream::from(body.to_vec()))
            .content_type(STATE_CONTENT_TYPE)
            .server_side_encryption(ServerSideEncryption::Aes256);

        self.runtime
            .block_on(request.send())
            .map(|_| ())
            .map_err(|error| format!("failed to write object to s3: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::put_object::{PutObjectError, PutObjectOutput};
    use aws_smithy_mocks::{mock, mock_client};

    use super::*;

    const STATE_BODY: &[u8] = br#"{"version":4}"#;

    #[test]
    fn writes_encrypted_json_object_under_bucket_and_key() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime should build");
        let put = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|request| {
                request.bucket() == Some("state-backups")
                    && request.key() == Some("prod/vpc-core/sv-42.json")
                    && request.server_side_encryption() == Some(&ServerSideEncryption::Aes256)
                    && request.content_type() == Some(STATE_CONTENT_TYPE)
                    && request.body().bytes() == Some(STATE_BODY)
            })
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, [&put]);

        let store = S3StateStore::new("state-backups", client, runtime.handle().clone());
        store
            .write_object("prod/vpc-core/sv-42.json", STATE_BODY)
            .expect("write should succeed");

        assert_eq!(put.num_calls(), 1);
    }

    #[test]
    fn rejected_put_is_reported_as_storage_message() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime should build");
        let put = mock!(aws_sdk_s3::Client::put_object).then_error(|| {
            PutObjectError::generic(
                ErrorMetadata::builder()
                    .code("AccessDenied")
                    .message("bucket policy denies write")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, [&put]);

        let store = S3StateStore::new("state-backups", client, runtime.handle().clone());
        let error = store
            .write_object("prod/vpc-core/sv-42.json", STATE_BODY)
            .expect_err("denied put should fail");

        assert!(error.starts_with("failed to write object to s3"));
        assert_eq!(put.num_calls(), 1);
    }
}
