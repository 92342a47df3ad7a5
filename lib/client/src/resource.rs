//! CRUD access to the dashboard's REST collections.
//!
//! Record payloads are opaque JSON: their shape belongs to the backend, not
//! to this crate. What the client does know is where each collection lives,
//! whether it can be written, and whether writes carry an image.

use crate::client::ApiClient;
use crate::error::ResourceError;
use crate::request::{FilePart, MultipartForm};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use smile_portal_core::RecordId;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Form field that carries a child's photo.
pub const IMAGE_FIELD: &str = "image_data";

/// A REST collection exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    /// Child records (with photo).
    Children,
    /// Lightweight child listing.
    ChildrenSummary,
    /// Expanded view of a single child.
    #[serde(rename = "children-detail")]
    ChildDetail,
    /// Programs children can be enrolled in.
    Programs,
    /// Enrollments of children into programs.
    #[serde(rename = "childprograms")]
    ChildPrograms,
    /// Sponsors.
    Sponsors,
    /// Donations made by sponsors.
    Donations,
    /// Staff members.
    #[serde(rename = "staffs")]
    Staff,
    /// Login accounts.
    Users,
}

impl Resource {
    /// Every resource.
    pub const ALL: [Resource; 9] = [
        Self::Children,
        Self::ChildrenSummary,
        Self::ChildDetail,
        Self::Programs,
        Self::ChildPrograms,
        Self::Sponsors,
        Self::Donations,
        Self::Staff,
        Self::Users,
    ];

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Children => "children",
            Self::ChildrenSummary => "children-summary",
            Self::ChildDetail => "children-detail",
            Self::Programs => "programs",
            Self::ChildPrograms => "childprograms",
            Self::Sponsors => "sponsors",
            Self::Donations => "donations",
            Self::Staff => "staffs",
            Self::Users => "users",
        }
    }

    /// Returns the collection path, if the resource can be listed.
    #[must_use]
    pub fn collection_path(&self) -> Option<String> {
        match self {
            Self::ChildDetail => None,
            _ => Some(format!("/{}/", self.name())),
        }
    }

    /// Returns the path of a single record, if records are addressable.
    #[must_use]
    pub fn record_path(&self, id: RecordId) -> Option<String> {
        match self {
            Self::ChildrenSummary => None,
            _ => Some(format!("/{}/{id}/", self.name())),
        }
    }

    /// Returns true if the resource accepts create, update and delete.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        !matches!(
            self,
            Self::ChildrenSummary | Self::ChildDetail | Self::Users
        )
    }

    /// Returns true if writes are sent as multipart forms.
    #[must_use]
    pub fn uses_multipart(&self) -> bool {
        matches!(self, Self::Children)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| format!("unknown resource '{s}'"))
    }
}

/// CRUD operations over [`Resource`] collections.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    client: Arc<ApiClient>,
}

impl ResourceClient {
    /// Creates a resource client on top of an API client.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Lists every record of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource has no collection endpoint or the
    /// call fails.
    #[instrument(skip(self))]
    pub async fn list(&self, resource: Resource) -> Result<Vec<JsonValue>, ResourceError> {
        let path = resource
            .collection_path()
            .ok_or_else(|| ResourceError::NotListable {
                resource: resource.to_string(),
            })?;
        let records: Vec<JsonValue> = self.client.get(&path).await?;
        debug!(count = records.len(), "listed records");
        Ok(records)
    }

    /// Retrieves a single record.
    #[instrument(skip(self))]
    pub async fn retrieve(
        &self,
        resource: Resource,
        id: RecordId,
    ) -> Result<JsonValue, ResourceError> {
        let path = Self::record_path(resource, id)?;
        Ok(self.client.get(&path).await?)
    }

    /// Creates a record, attaching `image` for resources that store one.
    #[instrument(skip(self, record, image))]
    pub async fn create(
        &self,
        resource: Resource,
        record: &JsonValue,
        image: Option<FilePart>,
    ) -> Result<JsonValue, ResourceError> {
        let path = Self::writable(resource)?
            .collection_path()
            .ok_or_else(|| ResourceError::NotListable {
                resource: resource.to_string(),
            })?;

        if resource.uses_multipart() {
            let form = Self::form(record, image);
            Ok(self.client.post_multipart(&path, form).await?)
        } else {
            Self::reject_image(resource, image.as_ref())?;
            Ok(self.client.post(&path, record).await?)
        }
    }

    /// Replaces a record, attaching `image` for resources that store one.
    #[instrument(skip(self, record, image))]
    pub async fn update(
        &self,
        resource: Resource,
        id: RecordId,
        record: &JsonValue,
        image: Option<FilePart>,
    ) -> Result<JsonValue, ResourceError> {
        let path = Self::record_path(Self::writable(resource)?, id)?;

        if resource.uses_multipart() {
            let form = Self::form(record, image);
            Ok(self.client.put_multipart(&path, form).await?)
        } else {
            Self::reject_image(resource, image.as_ref())?;
            Ok(self.client.put(&path, record).await?)
        }
    }

    /// Deletes a record.
    #[instrument(skip(self))]
    pub async fn delete(&self, resource: Resource, id: RecordId) -> Result<(), ResourceError> {
        let path = Self::record_path(Self::writable(resource)?, id)?;
        let _: JsonValue = self.client.delete(&path).await?;
        Ok(())
    }

    fn writable(resource: Resource) -> Result<Resource, ResourceError> {
        if resource.is_writable() {
            Ok(resource)
        } else {
            Err(ResourceError::ReadOnly {
                resource: resource.to_string(),
            })
        }
    }

    fn record_path(resource: Resource, id: RecordId) -> Result<String, ResourceError> {
        resource
            .record_path(id)
            .ok_or_else(|| ResourceError::NotAddressable {
                resource: resource.to_string(),
            })
    }

    fn reject_image(resource: Resource, image: Option<&FilePart>) -> Result<(), ResourceError> {
        match image {
            Some(_) => Err(ResourceError::ImageNotSupported {
                resource: resource.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn form(record: &JsonValue, image: Option<FilePart>) -> MultipartForm {
        let form = MultipartForm::from_json_object(record);
        match image {
            Some(file) => form.file(IMAGE_FIELD, file),
            None => form,
        }
    }
}
