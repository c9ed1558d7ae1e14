//! Maps peer project IDs to human-readable labels (slugs).

use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::client::ModrinthClient;
use crate::error::RegistryError;
use crate::model::Project;

#[derive(Debug, Clone)]
pub struct PeerResolver {
    client: ModrinthClient,
}

impl PeerResolver {
    pub fn new(client: ModrinthClient) -> Self {
        Self { client }
    }

    /// Slug of a single project, `None` when the project cannot be found.
    pub async fn label_of(&self, id: &str) -> Result<Option<String>, RegistryError> {
        let project: Option<Project> = self.client.get_json(&format!("project/{id}"), &[]).await?;
        Ok(project.map(|p| p.slug))
    }

    /// Slugs for a set of project IDs, keyed by the requested ID.
    ///
    /// One batch request is tried first. IDs the batch did not answer for are
    /// looked up one by one; IDs that still fail are logged and left out.
    pub async fn labels_of(&self, ids: &[String]) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        if ids.is_empty() {
            return labels;
        }

        match self.batch(ids).await {
            Ok(Some(projects)) => {
                for id in ids {
                    if let Some(project) = projects.iter().find(|p| &p.id == id || &p.slug == id) {
                        labels.insert(id.clone(), project.slug.clone());
                    }
                }
            }
            Ok(None) => debug!("Batch project lookup rejected, falling back to single lookups"),
            Err(e) => warn!("Batch project lookup failed: {}", e),
        }

        let missing: Vec<&String> = ids.iter().filter(|id| !labels.contains_key(*id)).collect();
        let lookups = join_all(missing.iter().map(|id| self.label_of(id))).await;
        for (id, lookup) in missing.into_iter().zip(lookups) {
            match lookup {
                Ok(Some(slug)) => {
                    labels.insert(id.clone(), slug);
                }
                Ok(None) => warn!("Peer '{}' not found in the registry", id),
                Err(e) => warn!("Could not look up peer '{}': {}", id, e),
            }
        }

        labels
    }

    async fn batch(&self, ids: &[String]) -> Result<Option<Vec<Project>>, RegistryError> {
        let encoded = serde_json::Value::from(ids.to_vec()).to_string();
        self.client.get_json("projects", &[("ids", encoded)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{REMAINING_HEADER, RESET_HEADER};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(status: u16) -> ResponseTemplate {
        ResponseTemplate::new(status)
            .insert_header(REMAINING_HEADER, "299")
            .insert_header(RESET_HEADER, "60")
    }

    fn resolver_for(server: &MockServer) -> PeerResolver {
        let client = ModrinthClient::builder()
            .base_url(server.uri())
            .build()
            .unwrap();
        PeerResolver::new(client)
    }

    #[tokio::test]
    async fn batch_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .and(query_param("ids", r#"["P7FfFNjF","AANobbMI"]"#))
            .respond_with(reply(200).set_body_json(json!([
                { "id": "AANobbMI", "slug": "sodium" },
                { "id": "P7FfFNjF", "slug": "fabric-api" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let ids = vec!["P7FfFNjF".to_string(), "AANobbMI".to_string()];
        let labels = resolver_for(&server).labels_of(&ids).await;

        assert_eq!(labels.len(), 2);
        assert_eq!(labels["P7FfFNjF"], "fabric-api");
        assert_eq!(labels["AANobbMI"], "sodium");
    }

    #[tokio::test]
    async fn falls_back_to_single_lookups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(reply(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/project/P7FfFNjF"))
            .respond_with(reply(200).set_body_json(json!({ "id": "P7FfFNjF", "slug": "fabric-api" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/project/gone"))
            .respond_with(reply(404))
            .mount(&server)
            .await;

        let ids = vec!["P7FfFNjF".to_string(), "gone".to_string()];
        let labels = resolver_for(&server).labels_of(&ids).await;

        assert_eq!(labels.len(), 1);
        assert_eq!(labels["P7FfFNjF"], "fabric-api");
        assert!(!labels.contains_key("gone"));
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let server = MockServer::start().await;
        let labels = resolver_for(&server).labels_of(&[]).await;
        assert!(labels.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
