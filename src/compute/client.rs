//! Compute Engine v1 over REST.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

use super::api::ComputeApi;
use super::error::ComputeResult;
use super::template::InstanceTemplate;
use super::types::{Image, Instance, InstanceIdentity, InstanceList, Operation};
use crate::google::{ApiResult, GoogleHttp, TokenProvider};

const API_ROOT: [&str; 2] = ["compute", "v1"];

/// [`ComputeApi`] backed by `compute.googleapis.com`.
#[derive(Clone)]
pub struct GceClient {
    http: GoogleHttp,
}

impl GceClient {
    pub fn new(endpoint: &str, tokens: Arc<dyn TokenProvider>) -> ApiResult<Self> {
        Ok(Self {
            http: GoogleHttp::new(endpoint, tokens)?,
        })
    }

    fn url(&self, path: &[&str]) -> ApiResult<Url> {
        let segments: Vec<&str> = API_ROOT.iter().copied().chain(path.iter().copied()).collect();
        self.http.url(&segments)
    }

    fn instance_url(&self, id: &InstanceIdentity, action: Option<&str>) -> ApiResult<Url> {
        let mut path = vec![
            "projects",
            id.project.as_str(),
            "zones",
            id.zone.as_str(),
            "instances",
            id.instance.as_str(),
        ];
        path.extend(action);
        self.url(&path)
    }

    async fn instance_action(&self, id: &InstanceIdentity, action: &str) -> ComputeResult<Operation> {
        let url = self.instance_url(id, Some(action))?;
        let resource = format!("instance {} ({action})", id.instance);
        Ok(self
            .http
            .post_json::<(), Operation>(url, None, &resource)
            .await?)
    }
}

#[async_trait]
impl ComputeApi for GceClient {
    async fn list_instances(&self, project: &str, zone: &str) -> ComputeResult<Vec<Instance>> {
        let resource = format!("instances in {project}/{zone}");
        let mut instances = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&["projects", project, "zones", zone, "instances"])?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: InstanceList = self.http.get_json(url, &resource).await?;
            instances.extend(page.items);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(instances)
    }

    async fn get_instance(&self, id: &InstanceIdentity) -> ComputeResult<Instance> {
        let url = self.instance_url(id, None)?;
        let resource = format!("instance {}", id.instance);
        Ok(self.http.get_json(url, &resource).await?)
    }

    async fn image_from_family(&self, project: &str, family: &str) -> ComputeResult<Image> {
        let url = self.url(&["projects", project, "global", "images", "family", family])?;
        let resource = format!("image family {project}/{family}");
        Ok(self.http.get_json(url, &resource).await?)
    }

    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        template: &InstanceTemplate,
    ) -> ComputeResult<Operation> {
        let url = self.url(&["projects", project, "zones", zone, "instances"])?;
        let resource = format!("instance {} (insert)", template.name);
        Ok(self.http.post_json(url, Some(template), &resource).await?)
    }

    async fn start_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        self.instance_action(id, "start").await
    }

    async fn stop_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        self.instance_action(id, "stop").await
    }

    async fn reset_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        self.instance_action(id, "reset").await
    }

    async fn delete_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        let url = self.instance_url(id, None)?;
        let resource = format!("instance {} (delete)", id.instance);
        Ok(self.http.delete_json(url, &resource).await?)
    }

    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> ComputeResult<Operation> {
        let url = self.url(&["projects", project, "zones", zone, "operations", operation])?;
        let resource = format!("operation {operation}");
        Ok(self.http.get_json(url, &resource).await?)
    }
}
