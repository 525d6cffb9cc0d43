#![doc = "PIM (Write) API client: creates and publishes folders."]
//
//! # PimClient
//!
//! Implements [`Writer`] against the authoritative write endpoint. The write
//! API addresses parents by id only, so [`PimClient`] holds a shared
//! [`Discovery`] handle to translate a parent *path* into an id before each
//! create.
//!
//! After a successful create the folder is published in every configured
//! locale. A failed publish is logged and does not fail the create; the
//! folder is then present but unpublished in that locale.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taxonomy_import_core::config::{Locales, PimConfig};
use taxonomy_import_core::contract::{CreatedFolder, Discovery, NewFolder, WriteError, Writer};
use taxonomy_import_core::path;
use tracing::{error, info, warn};

use crate::graphql::{GraphqlEndpoint, GraphqlError};

pub const ACCESS_TOKEN_ID_HEADER: &str = "X-Crystallize-Access-Token-Id";
pub const ACCESS_TOKEN_SECRET_HEADER: &str = "X-Crystallize-Access-Token-Secret";

const CREATE_FOLDER_MUTATION: &str = r#"
mutation CreateFolder($input: CreateFolderInput!, $language: String!) {
    folder {
        create(disableComponentValidation: false, input: $input, language: $language) {
            id
            name
        }
    }
}"#;

const PUBLISH_FOLDER_MUTATION: &str = r#"
mutation PublishFolder($id: ID!, $language: String!) {
    folder {
        publish(id: $id, language: $language) {
            id
        }
    }
}"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderInput<'a> {
    name: &'a str,
    shape_identifier: &'a str,
    tenant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<TreeInput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeInput<'a> {
    parent_id: &'a str,
}

#[derive(Serialize)]
struct CreateVars<'a> {
    input: CreateFolderInput<'a>,
    language: &'a str,
}

#[derive(Serialize)]
struct PublishVars<'a> {
    id: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct FolderMutation<T> {
    folder: Option<T>,
}

#[derive(Deserialize)]
struct CreateField {
    create: Option<CreatedFolder>,
}

#[derive(Deserialize)]
struct PublishField {
    publish: Option<PublishedId>,
}

#[derive(Deserialize)]
struct PublishedId {
    #[allow(dead_code)]
    id: String,
}

fn remote(operation: &'static str, e: GraphqlError) -> WriteError {
    match e {
        GraphqlError::MissingData => WriteError::MalformedResponse {
            operation,
            message: e.to_string(),
        },
        other => WriteError::Remote {
            operation,
            message: other.to_string(),
        },
    }
}

pub struct PimClient<D> {
    endpoint: GraphqlEndpoint,
    discovery: Arc<D>,
    tenant_id: String,
    locales: Locales,
}

impl<D: Discovery> PimClient<D> {
    pub fn new(
        config: &PimConfig,
        locales: Locales,
        timeout: Duration,
        discovery: Arc<D>,
    ) -> Result<Self, GraphqlError> {
        let endpoint = GraphqlEndpoint::new(
            "pim",
            &config.api_url,
            &[
                (ACCESS_TOKEN_ID_HEADER, config.access_token_id.as_str()),
                (ACCESS_TOKEN_SECRET_HEADER, config.access_token_secret.as_str()),
            ],
            timeout,
        )?;
        info!(
            api_url = %config.api_url,
            tenant_id = %config.tenant_id,
            publish = ?locales.publish,
            "Initialised PIM client"
        );
        Ok(Self {
            endpoint,
            discovery,
            tenant_id: config.tenant_id.clone(),
            locales,
        })
    }

    /// Parent id for `parent_path`, or `None` for the root.
    async fn parent_id(&self, parent_path: &str) -> Result<Option<String>, WriteError> {
        if parent_path == path::ROOT {
            return Ok(None);
        }
        match self.discovery.find_by_path(parent_path).await {
            Some(node) => Ok(Some(node.id)),
            None => {
                error!(parent_path, "Could not find parent id for path");
                Err(WriteError::ParentNotFound(parent_path.to_string()))
            }
        }
    }
}

#[async_trait]
impl<D: Discovery> Writer for PimClient<D> {
    async fn create_node<'a>(&self, req: NewFolder<'a>) -> Result<CreatedFolder, WriteError> {
        let parent_id = self.parent_id(req.parent_path).await?;
        let vars = CreateVars {
            input: CreateFolderInput {
                name: req.name,
                shape_identifier: req.shape.identifier(),
                tenant_id: &self.tenant_id,
                tree: parent_id.as_deref().map(|parent_id| TreeInput { parent_id }),
            },
            language: &self.locales.language,
        };

        let data: FolderMutation<CreateField> = self
            .endpoint
            .execute("CreateFolder", CREATE_FOLDER_MUTATION, &vars)
            .await
            .map_err(|e| {
                error!(name = req.name, parent_path = req.parent_path, shape = %req.shape, error = %e, "Failed to create folder");
                remote("CreateFolder", e)
            })?;
        let created = data
            .folder
            .and_then(|f| f.create)
            .ok_or(WriteError::MalformedResponse {
                operation: "CreateFolder",
                message: "folder.create was null".to_string(),
            })?;
        info!(name = %created.name, id = %created.id, parent_path = req.parent_path, "Created folder");

        for language in &self.locales.publish {
            if let Err(e) = self.publish_node(&created.id, language).await {
                warn!(id = %created.id, language = %language, error = %e, "Folder created but not published");
            }
        }
        Ok(created)
    }

    async fn publish_node(&self, id: &str, language: &str) -> Result<(), WriteError> {
        let data: FolderMutation<PublishField> = self
            .endpoint
            .execute("PublishFolder", PUBLISH_FOLDER_MUTATION, &PublishVars { id, language })
            .await
            .map_err(|e| remote("PublishFolder", e))?;
        if data.folder.and_then(|f| f.publish).is_none() {
            return Err(WriteError::MalformedResponse {
                operation: "PublishFolder",
                message: "folder.publish was null".to_string(),
            });
        }
        info!(id, language, "Published folder");
        Ok(())
    }
}
