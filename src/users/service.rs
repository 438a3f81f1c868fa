use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use super::{Role, UserRecord, USERS_COLLECTION};
use crate::error::{AppError, AppResult};
use crate::firebase::{BlobStore, DocumentStore, IdentityDirectory, IdentityError};
use crate::maps::Geocoder;

/// A document payload supplied with a provider registration.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Input to [`UserService::register`]. The role arrives as the raw
/// wire string and is validated before any collaborator call.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub role: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub address: Option<String>,
    pub document: Option<Document>,
}

/// The two success outcomes of a registration.
#[derive(Debug)]
pub enum Registered {
    Created(String),
    RoleAdded(String),
}

impl Registered {
    pub fn uid(&self) -> &str {
        match self {
            Registered::Created(uid) | Registered::RoleAdded(uid) => uid,
        }
    }
}

#[derive(Debug)]
pub struct RoleCheck {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct UserService {
    identity: Arc<dyn IdentityDirectory>,
    store: Arc<dyn DocumentStore>,
    geocoder: Arc<dyn Geocoder>,
    blobs: Arc<dyn BlobStore>,
}

impl UserService {
    pub fn new(
        identity: Arc<dyn IdentityDirectory>,
        store: Arc<dyn DocumentStore>,
        geocoder: Arc<dyn Geocoder>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self { identity, store, geocoder, blobs }
    }

    /// Registers a new account, or grants an additional role to the
    /// account already holding the email. Exactly one of the two
    /// happens; the same email never gets a second record.
    pub async fn register(&self, req: Registration) -> AppResult<Registered> {
        let role: Role = req.role.parse()?;

        let existing = self
            .store
            .find_by_field(USERS_COLLECTION, "email", &req.email, Some(1))
            .await?;

        if let Some((uid, doc)) = existing.into_iter().next() {
            // Known email: merge the role, ignore everything else in
            // the request (including the password — no directory call).
            let mut record: UserRecord = serde_json::from_value(doc)?;
            if record.roles.contains(&role) {
                return Err(AppError::RoleAlreadyGranted(role));
            }
            record.roles.push(role);
            // Full-record write-back: last write wins, same as the
            // original's overwrite. Not atomic across racing requests.
            self.store
                .set(USERS_COLLECTION, &uid, &serde_json::to_value(&record)?)
                .await?;
            info!(%uid, %role, "role added to existing account");
            return Ok(Registered::RoleAdded(uid));
        }

        let uid = self
            .identity
            .create_account(&req.email, &req.password)
            .await
            .map_err(|e| match e {
                IdentityError::Rejected(message) => AppError::IdentityCreateFailed(message),
                IdentityError::Backend(e) => AppError::Backend(e),
            })?;

        // From here on the identity exists; a geocoding failure below
        // leaves it orphaned, with no record written.
        let location = match req.address.as_deref() {
            Some(address) => {
                let mut candidates = self.geocoder.geocode(address).await?;
                if candidates.is_empty() {
                    return Err(AppError::GeocodeFailed);
                }
                Some(candidates.remove(0))
            }
            None => None,
        };

        let document_url = match (role, req.document) {
            (Role::Provider, Some(document)) => {
                let path = format!("documentos/{uid}/{}", document.filename);
                match self
                    .blobs
                    .upload(&path, document.bytes, &document.content_type)
                    .await
                {
                    Ok(url) => Some(url),
                    Err(e) => {
                        // upload failure does not abort the registration
                        warn!(%uid, error = %e, "document upload failed, registering without it");
                        None
                    }
                }
            }
            _ => None,
        };

        let record = UserRecord {
            email: req.email,
            roles: vec![role],
            name: req.name,
            surname: req.surname,
            phone: req.phone,
            address: req.address,
            location,
            document_url,
        };
        self.store
            .set(USERS_COLLECTION, &uid, &serde_json::to_value(&record)?)
            .await?;

        info!(%uid, %role, "account created");
        Ok(Registered::Created(uid))
    }

    /// Role authorization by email. The caller's password is never
    /// checked here; the directory only resolves email to UID.
    pub async fn check_role(&self, email: &str, desired_role: &str) -> AppResult<RoleCheck> {
        let role: Role = desired_role.parse()?;

        let user = self
            .identity
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let doc = self
            .store
            .get(USERS_COLLECTION, &user.uid)
            .await?
            .ok_or(AppError::UserRecordMissing)?;
        let record: UserRecord = serde_json::from_value(doc)?;

        if record.roles.contains(&role) {
            Ok(RoleCheck { uid: user.uid, email: user.email, role })
        } else {
            Err(AppError::RoleNotGranted { wanted: role, granted: record.roles })
        }
    }

    /// Startup connectivity check against the document store, writing
    /// the same throwaway document the original wrote.
    pub async fn probe_store(&self) -> AppResult<()> {
        self.store
            .set(
                "prueba",
                "doc1",
                &json!({ "campo1": "valor1", "campo2": "valor2" }),
            )
            .await?;
        Ok(())
    }
}
