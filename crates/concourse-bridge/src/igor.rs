//! Build metadata client (Igor)
//!
//! Lists the teams, pipelines, jobs and resources a Concourse build master
//! exposes. Every call is forwarded to `{base}/concourse/{buildMaster}/...`.

use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::http;
use crate::Result;

const SERVICE: &str = "igor";

#[derive(Debug, Clone)]
pub struct IgorClient {
    base: Url,
    http_client: reqwest::Client,
}

impl IgorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base: http::parse_base(SERVICE, base_url)?,
            http_client: http::build_client(SERVICE, timeout)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn concourse_url(&self, build_master: &str, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["concourse", build_master];
        segments.extend_from_slice(rest);
        http::join_segments(SERVICE, &self.base, &segments)
    }

    async fn get_names(&self, url: Url) -> Result<Vec<String>> {
        debug!(url = %url, "Fetching Concourse metadata");
        let response = http::check(SERVICE, self.http_client.get(url).send().await).await?;
        http::decode(SERVICE, response).await
    }

    pub async fn teams(&self, build_master: &str) -> Result<Vec<String>> {
        let url = self.concourse_url(build_master, &["teams"])?;
        self.get_names(url).await
    }

    pub async fn pipelines(&self, build_master: &str, team: &str) -> Result<Vec<String>> {
        let url = self.concourse_url(build_master, &["teams", team, "pipelines"])?;
        self.get_names(url).await
    }

    pub async fn jobs(&self, build_master: &str, team: &str, pipeline: &str) -> Result<Vec<String>> {
        let url = self.concourse_url(build_master, &["teams", team, "pipelines", pipeline, "jobs"])?;
        self.get_names(url).await
    }

    pub async fn resources(
        &self,
        build_master: &str,
        team: &str,
        pipeline: &str,
    ) -> Result<Vec<String>> {
        let url = self.concourse_url(
            build_master,
            &["teams", team, "pipelines", pipeline, "resources"],
        )?;
        self.get_names(url).await
    }
}
