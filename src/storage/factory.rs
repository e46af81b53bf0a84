use super::auth::AuthData;
use super::config::{StoragePath, StorageType};
use super::provider::StorageProvider;
use super::providers::{Local, Minio, Onedata, S3};
use tracing::debug;

/// Create a storage provider from a credential set.
///
/// No credentials means the local filesystem. Unknown discriminators never
/// reach this point: they are rejected when [`StorageType`] is parsed.
///
/// # Arguments
///
/// * `auth` - The credentials of the storage, or `None` when no storage is configured
///
/// # Returns
///
/// A boxed provider whose `get_type()` is the type the credentials were declared with.
pub fn create_provider(auth: Option<&AuthData>) -> Box<dyn StorageProvider> {
    let provider: Box<dyn StorageProvider> = match auth {
        None => Box::new(Local::new()),
        Some(auth) => match auth.storage_type() {
            StorageType::S3 => Box::new(S3::new(auth.clone())),
            StorageType::Minio => Box::new(Minio::new(auth.clone())),
            StorageType::Onedata => Box::new(Onedata::new(auth.clone())),
            StorageType::Local => Box::new(Local::new()),
        },
    };
    debug!("Created storage provider {:?}", provider);
    provider
}

/// Create a storage provider bound to an output path.
///
/// # Arguments
///
/// * `auth` - The credentials of the storage, or `None` for the local filesystem
/// * `output` - The output path uploads are written under
pub fn create_output_provider(
    auth: Option<&AuthData>,
    output: &StoragePath,
) -> Box<dyn StorageProvider> {
    let output = output.clone();
    let provider: Box<dyn StorageProvider> = match auth {
        None => Box::new(Local::new().with_output_path(output)),
        Some(auth) => match auth.storage_type() {
            StorageType::S3 => Box::new(S3::new(auth.clone()).with_output_path(output)),
            StorageType::Minio => Box::new(Minio::new(auth.clone()).with_output_path(output)),
            StorageType::Onedata => {
                Box::new(Onedata::new(auth.clone()).with_output_path(output))
            }
            StorageType::Local => Box::new(Local::new().with_output_path(output)),
        },
    };
    debug!("Created output storage provider {:?}", provider);
    provider
}
