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

//! Classification of the invocation event

use crate::storage::{StorageObject, StorageType};
use serde_json::Value;
use url::form_urlencoded;

const S3_EVENT_SOURCE: &str = "aws:s3";
const MINIO_EVENT_SOURCE: &str = "minio:s3";
const ONEDATA_EVENT_SOURCE: &str = "OneTrigger";

/// What the invocation event asks the supervisor to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An object was created in a storage backend
    Storage {
        storage_type: StorageType,
        object: StorageObject,
    },
    /// Any other payload, handed to the function untouched
    Unknown,
}

impl Event {
    pub fn storage_type(&self) -> Option<StorageType> {
        match self {
            Event::Storage { storage_type, .. } => Some(*storage_type),
            Event::Unknown => None,
        }
    }
}

/// Classify a Lambda event.
pub fn parse_event(event: &Value) -> Event {
    if event.get("eventSource").and_then(Value::as_str) == Some(ONEDATA_EVENT_SOURCE) {
        return parse_onedata_event(event).unwrap_or(Event::Unknown);
    }

    let Some(record) = event.pointer("/Records/0") else {
        return Event::Unknown;
    };
    let storage_type = match record.get("eventSource").and_then(Value::as_str) {
        Some(S3_EVENT_SOURCE) => StorageType::S3,
        Some(MINIO_EVENT_SOURCE) => StorageType::Minio,
        _ => return Event::Unknown,
    };
    parse_s3_record(record, storage_type).unwrap_or(Event::Unknown)
}

fn parse_s3_record(record: &Value, storage_type: StorageType) -> Option<Event> {
    let bucket = record.pointer("/s3/bucket/name")?.as_str()?;
    let raw_key = record.pointer("/s3/object/key")?.as_str()?;
    Some(Event::Storage {
        storage_type,
        object: StorageObject::new(bucket, decode_object_key(raw_key)),
    })
}

/// `Key` is `/<space>/<path inside the space>`.
fn parse_onedata_event(event: &Value) -> Option<Event> {
    let key = event.get("Key")?.as_str()?.trim_start_matches('/');
    let (space, path) = key.split_once('/')?;
    Some(Event::Storage {
        storage_type: StorageType::Onedata,
        object: StorageObject::new(space, path),
    })
}

/// S3 notifications form-encode object keys (`+` for spaces).
fn decode_object_key(raw: &str) -> String {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s3_event(source: &str, key: &str) -> Value {
        json!({
            "Records": [{
                "eventSource": source,
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": "scar-bucket"},
                    "object": {"key": key, "size": 1024}
                }
            }]
        })
    }

    #[test]
    fn test_parse_s3_event() {
        let event = parse_event(&s3_event("aws:s3", "input/image.jpg"));
        assert_eq!(
            event,
            Event::Storage {
                storage_type: StorageType::S3,
                object: StorageObject::new("scar-bucket", "input/image.jpg"),
            }
        );
    }

    #[test]
    fn test_parse_s3_event_decodes_key() {
        let event = parse_event(&s3_event("aws:s3", "input/my+file%281%29.jpg"));
        match event {
            Event::Storage { object, .. } => assert_eq!(object.key, "input/my file(1).jpg"),
            other => panic!("Expected storage event, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_minio_event() {
        let event = parse_event(&s3_event("minio:s3", "input/data.csv"));
        assert_eq!(event.storage_type(), Some(StorageType::Minio));
    }

    #[test]
    fn test_parse_onedata_event() {
        let event = parse_event(&json!({
            "Key": "/my-space/input/file.txt",
            "Records": [{"objectKey": "file.txt"}],
            "eventSource": "OneTrigger"
        }));
        assert_eq!(
            event,
            Event::Storage {
                storage_type: StorageType::Onedata,
                object: StorageObject::new("my-space", "input/file.txt"),
            }
        );
    }

    #[test]
    fn test_parse_unknown_events() {
        assert_eq!(parse_event(&json!({"body": "hello"})), Event::Unknown);
        assert_eq!(parse_event(&json!({"Records": []})), Event::Unknown);
        assert_eq!(
            parse_event(&s3_event("aws:sqs", "input/file")),
            Event::Unknown
        );
        assert_eq!(parse_event(&Value::Null), Event::Unknown);
        assert_eq!(parse_event(&json!({"eventSource": "OneTrigger"})), Event::Unknown);
    }
}
