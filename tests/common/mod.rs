//! In-memory stand-ins for the external collaborators. Every fake
//! counts its calls so tests can assert which backends were touched.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use servihogar::error::BackendError;
use servihogar::firebase::{
    BlobStore, DocumentStore, IdentityDirectory, IdentityError, IdentityUser,
};
use servihogar::maps::{DistanceLeg, Geocoder, Location};
use servihogar::users::UserService;

#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<Vec<IdentityUser>>,
    pub calls: AtomicUsize,
}

impl MemoryIdentity {
    /// Registers an identity directly, bypassing the service. For
    /// directory/store divergence tests.
    pub fn seed(&self, email: &str) -> String {
        let uid = Uuid::now_v7().simple().to_string();
        self.accounts.lock().unwrap().push(IdentityUser {
            uid: uid.clone(),
            email: email.to_owned(),
        });
        uid
    }

    pub fn count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityDirectory for MemoryIdentity {
    async fn create_account(&self, email: &str, _password: &str) -> Result<String, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.email == email) {
            return Err(IdentityError::Rejected("EMAIL_EXISTS".to_owned()));
        }
        let uid = Uuid::now_v7().simple().to_string();
        accounts.push(IdentityUser { uid: uid.clone(), email: email.to_owned() });
        Ok(uid)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityUser>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }
}

/// Insertion-ordered document store, one `Vec<(id, doc)>` per
/// collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
    pub calls: AtomicUsize,
}

impl MemoryStore {
    pub fn doc(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)?
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(_, doc)| doc.clone())
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.doc(collection, id))
    }

    async fn set(&self, collection: &str, id: &str, doc: &Value) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_owned()).or_default();
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, existing)) => *existing = doc.clone(),
            None => docs.push((id.to_owned(), doc.clone())),
        }
        Ok(())
    }

    async fn add(&self, collection: &str, doc: &Value) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::now_v7().simple().to_string();
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_owned())
            .or_default()
            .push((id.clone(), doc.clone()));
        Ok(id)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: Option<u32>,
    ) -> Result<Vec<(String, Value)>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let collections = self.collections.lock().unwrap();
        let mut out: Vec<(String, Value)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| doc.get(field).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(limit) = limit {
            out.truncate(limit as usize);
        }
        Ok(out)
    }
}

/// Geocoder returning a fixed candidate list.
#[derive(Default)]
pub struct StubGeocoder {
    results: Mutex<Vec<Location>>,
    pub calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn with_results(results: Vec<Location>) -> Self {
        Self { results: Mutex::new(results), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Vec<Location>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.lock().unwrap().clone())
    }

    async fn distance(
        &self,
        _origin: &str,
        _destination: &str,
    ) -> Result<Option<DistanceLeg>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[derive(Default)]
pub struct MemoryBlobs {
    pub fail: bool,
    uploads: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl MemoryBlobs {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn upload(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BackendError::new("storage", "upload refused"));
        }
        self.uploads.lock().unwrap().push(path.to_owned());
        Ok(format!("memory://{path}"))
    }
}

/// Concrete handles to the fakes behind a [`UserService`], for
/// post-hoc inspection.
pub struct TestBackend {
    pub identity: Arc<MemoryIdentity>,
    pub store: Arc<MemoryStore>,
    pub geocoder: Arc<StubGeocoder>,
    pub blobs: Arc<MemoryBlobs>,
}

impl TestBackend {
    pub fn total_calls(&self) -> usize {
        self.identity.calls.load(Ordering::SeqCst)
            + self.store.calls.load(Ordering::SeqCst)
            + self.geocoder.calls.load(Ordering::SeqCst)
            + self.blobs.calls.load(Ordering::SeqCst)
    }
}

pub fn registration(email: &str, role: &str) -> servihogar::users::Registration {
    servihogar::users::Registration {
        email: email.to_owned(),
        password: "password123".to_owned(),
        role: role.to_owned(),
        name: "A".to_owned(),
        surname: "B".to_owned(),
        phone: "555".to_owned(),
        address: None,
        document: None,
    }
}

pub fn user_service() -> (UserService, TestBackend) {
    user_service_with(StubGeocoder::default(), MemoryBlobs::default())
}

pub fn user_service_with(
    geocoder: StubGeocoder,
    blobs: MemoryBlobs,
) -> (UserService, TestBackend) {
    let backend = TestBackend {
        identity: Arc::new(MemoryIdentity::default()),
        store: Arc::new(MemoryStore::default()),
        geocoder: Arc::new(geocoder),
        blobs: Arc::new(blobs),
    };
    let service = UserService::new(
        backend.identity.clone(),
        backend.store.clone(),
        backend.geocoder.clone(),
        backend.blobs.clone(),
    );
    (service, backend)
}
