use super::{IdentityRecord, RecordStore, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory record store for single-node deployments and tests.
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, IdentityRecord>>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, user_id: &str) -> Result<Option<IdentityRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(user_id).cloned())
    }

    async fn upsert(&self, record: IdentityRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.user_id.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::VerificationStatus;

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = MemoryRecordStore::new();
        assert!(store.get("u1").await.unwrap().is_none());

        let mut record = IdentityRecord::new("u1");
        record.pan_number = Some("ABCPD1234E".to_string());
        store.upsert(record).await.unwrap();

        let fetched = store.get("u1").await.unwrap().unwrap();
        assert_eq!(fetched.status, VerificationStatus::Pending);
        assert_eq!(fetched.pan_number.as_deref(), Some("ABCPD1234E"));
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = MemoryRecordStore::new();

        store.upsert(IdentityRecord::new("u1")).await.unwrap();
        let mut updated = IdentityRecord::new("u1");
        updated.status = VerificationStatus::Verified;
        updated.linkage_confirmed = true;
        updated.pan_number = Some("ABCPD1234E".to_string());
        store.upsert(updated).await.unwrap();

        let fetched = store.get("u1").await.unwrap().unwrap();
        assert_eq!(fetched.status, VerificationStatus::Verified);
        assert!(fetched.linkage_confirmed);
    }
}
