// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Storage credentials read from `STORAGE_AUTH_<TYPE>_<FIELD>_<ID>` variables.

use super::config::StorageType;
use super::error::{StorageError, StorageResult};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use tracing::debug;

static AUTH_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^STORAGE_AUTH_([^_]+)_(.+)_([^_]+)$").expect("valid storage auth pattern")
});

/// Credential set of one configured storage provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    storage_id: String,
    storage_type: StorageType,
    creds: HashMap<String, String>,
}

impl AuthData {
    pub fn new(storage_id: impl Into<String>, storage_type: StorageType) -> Self {
        Self {
            storage_id: storage_id.into(),
            storage_type,
            creds: HashMap::new(),
        }
    }

    pub fn storage_id(&self) -> &str {
        &self.storage_id
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    pub fn creds(&self) -> &HashMap<String, String> {
        &self.creds
    }

    /// Store a credential, overwriting any previous value for `key`.
    pub fn set_credential(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.creds.insert(key.into(), value.into());
    }

    /// Get a credential, or an empty string when `key` was never set.
    pub fn get_credential(&self, key: &str) -> &str {
        self.creds.get(key).map(String::as_str).unwrap_or("")
    }

    /// Get a credential only when it is set to a non-empty value.
    pub fn credential(&self, key: &str) -> Option<&str> {
        Some(self.get_credential(key)).filter(|value| !value.is_empty())
    }
}

/// All storage credentials of one invocation, indexed by storage id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageAuth {
    /// Storage id to provider type
    pub auth_id: BTreeMap<String, StorageType>,
    auth_data: BTreeMap<String, AuthData>,
}

impl StorageAuth {
    /// Build the credentials from a set of environment variables.
    pub fn from_vars(vars: &HashMap<String, String>) -> StorageResult<Self> {
        let mut auth = Self::default();
        auth.read_storage_providers(vars)?;
        Ok(auth)
    }

    /// Scan `vars` for `STORAGE_AUTH_<TYPE>_<FIELD>_<ID>` entries.
    ///
    /// The type is recorded once per id and every field becomes a credential
    /// of that id. Fields may contain underscores (`ONEPROVIDER_HOST`).
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * A variable names an unknown provider type
    /// * The same id is configured with two different provider types
    pub fn read_storage_providers(&mut self, vars: &HashMap<String, String>) -> StorageResult<()> {
        for (name, value) in vars {
            let Some(captures) = AUTH_VAR.captures(name) else {
                continue;
            };
            let storage_type: StorageType = captures[1].parse()?;
            let field = &captures[2];
            let storage_id = &captures[3];

            match self.auth_id.get(storage_id) {
                Some(existing) if *existing != storage_type => {
                    return Err(StorageError::ConfigError(format!(
                        "Storage id '{}' is configured as both {} and {}",
                        storage_id, existing, storage_type
                    )));
                }
                Some(_) => {}
                None => {
                    self.auth_id.insert(storage_id.to_string(), storage_type);
                }
            }

            self.auth_data
                .entry(storage_id.to_string())
                .or_insert_with(|| AuthData::new(storage_id, storage_type))
                .set_credential(field, value.as_str());
            debug!("Read credential field={} for storage id={}", field, storage_id);
        }
        Ok(())
    }

    /// Credentials of the first storage id, in lexical order, configured with `storage_type`.
    pub fn get_auth_data_by_stg_type(&self, storage_type: StorageType) -> Option<&AuthData> {
        self.auth_data
            .values()
            .find(|auth| auth.storage_type() == storage_type)
    }

    /// Credentials configured for `storage_id`.
    pub fn get_data_by_stg_id(&self, storage_id: &str) -> Option<&AuthData> {
        self.auth_data.get(storage_id)
    }

    pub fn is_empty(&self) -> bool {
        self.auth_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_create_auth_data() {
        let auth = AuthData::new("1", StorageType::Local);
        assert_eq!(auth.storage_id(), "1");
        assert_eq!(auth.storage_type(), StorageType::Local);
        assert!(auth.creds().is_empty());
    }

    #[test]
    fn test_set_auth_data_credential() {
        let mut auth = AuthData::new("1", StorageType::Local);
        auth.set_credential("K1", "V1");
        assert_eq!(auth.creds().len(), 1);
        assert_eq!(auth.creds().get("K1"), Some(&"V1".to_string()));

        auth.set_credential("K1", "V2");
        assert_eq!(auth.get_credential("K1"), "V2");
    }

    #[test]
    fn test_get_auth_data_credential() {
        let mut auth = AuthData::new("1", StorageType::Local);
        auth.set_credential("K1", "V1");
        assert_eq!(auth.get_credential("K1"), "V1");
        assert_eq!(auth.get_credential("K11"), "");
        assert_eq!(auth.credential("K11"), None);
    }

    #[test]
    fn test_create_storage_auth() {
        let auth = StorageAuth::default();
        assert!(auth.auth_id.is_empty());
        assert!(auth.is_empty());
    }

    #[test]
    fn test_read_storage_providers() {
        let env = vars(&[
            ("STORAGE_AUTH_S3_USER_1", "u1"),
            ("STORAGE_AUTH_S3_PASS_1", "p1"),
            ("UNRELATED", "x"),
        ]);
        let auth = StorageAuth::from_vars(&env).unwrap();

        assert_eq!(auth.auth_id.len(), 1);
        assert_eq!(auth.auth_id.get("1"), Some(&StorageType::S3));

        let data = auth.get_data_by_stg_id("1").unwrap();
        assert_eq!(data.storage_type(), StorageType::S3);
        assert_eq!(data.get_credential("USER"), "u1");
        assert_eq!(data.get_credential("PASS"), "p1");
    }

    #[test]
    fn test_read_multiple_providers() {
        let env = vars(&[
            ("STORAGE_AUTH_MINIO_USER_1", "minio"),
            ("STORAGE_AUTH_ONEDATA_ONEPROVIDER_HOST_2", "op.example.org"),
            ("STORAGE_AUTH_ONEDATA_TOKEN_2", "tok"),
        ]);
        let auth = StorageAuth::from_vars(&env).unwrap();

        assert_eq!(auth.auth_id.get("1"), Some(&StorageType::Minio));
        assert_eq!(auth.auth_id.get("2"), Some(&StorageType::Onedata));
        let onedata = auth.get_data_by_stg_id("2").unwrap();
        assert_eq!(onedata.get_credential("ONEPROVIDER_HOST"), "op.example.org");
        assert_eq!(onedata.get_credential("TOKEN"), "tok");
    }

    #[test]
    fn test_read_storage_providers_invalid_type() {
        let env = vars(&[("STORAGE_AUTH_ERROR_USER_1", "u1")]);
        let err = StorageAuth::from_vars(&env).unwrap_err();
        assert!(matches!(err, StorageError::InvalidStorageProvider(_)));
    }

    #[test]
    fn test_read_storage_providers_conflicting_types() {
        let env = vars(&[
            ("STORAGE_AUTH_S3_USER_1", "u1"),
            ("STORAGE_AUTH_MINIO_USER_1", "u2"),
        ]);
        let err = StorageAuth::from_vars(&env).unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[test]
    fn test_get_auth_data_by_stg_type() {
        let env = vars(&[
            ("STORAGE_AUTH_S3_USER_1", "u1"),
            ("STORAGE_AUTH_S3_PASS_1", "p1"),
        ]);
        let auth = StorageAuth::from_vars(&env).unwrap();
        let data = auth.get_auth_data_by_stg_type(StorageType::S3).unwrap();
        assert_eq!(data.get_credential("USER"), "u1");
        assert_eq!(data.get_credential("PASS"), "p1");
    }

    #[test]
    fn test_lookups_miss() {
        let env = vars(&[("STORAGE_AUTH_S3_USER_1", "u1")]);
        let auth = StorageAuth::from_vars(&env).unwrap();
        assert!(auth.get_auth_data_by_stg_type(StorageType::Minio).is_none());
        assert!(auth.get_data_by_stg_id("2").is_none());
    }

    #[test]
    fn test_get_auth_data_by_stg_type_lowest_id() {
        let env = vars(&[
            ("STORAGE_AUTH_S3_USER_2", "second"),
            ("STORAGE_AUTH_S3_USER_1", "first"),
        ]);
        let auth = StorageAuth::from_vars(&env).unwrap();
        let data = auth.get_auth_data_by_stg_type(StorageType::S3).unwrap();
        assert_eq!(data.storage_id(), "1");
        assert_eq!(data.get_credential("USER"), "first");
    }
}
