//! Orchestration client (Orca): Concourse stage start notifications.

use std::time::Duration;

use reqwest::Url;
use tracing::info;

use crate::http;
use crate::Result;

const SERVICE: &str = "orca";

#[derive(Debug, Clone)]
pub struct OrcaClient {
    base: Url,
    http_client: reqwest::Client,
}

impl OrcaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base: http::parse_base(SERVICE, base_url)?,
            http_client: http::build_client(SERVICE, timeout)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn stage_start_url(&self, stage_id: &str, job: &str, build_number: i64) -> Result<Url> {
        let mut url = http::join_segments(SERVICE, &self.base, &["concourse", "stage", "start"])?;
        url.query_pairs_mut()
            .append_pair("stageId", stage_id)
            .append_pair("job", job)
            .append_pair("buildNumber", &build_number.to_string());
        Ok(url)
    }

    /// Tell the orchestrator which Concourse build runs for a stage.
    ///
    /// The request body is empty; any success status is accepted.
    pub async fn concourse_stage_execution(
        &self,
        stage_id: &str,
        job: &str,
        build_number: i64,
    ) -> Result<()> {
        let url = self.stage_start_url(stage_id, job, build_number)?;
        info!(stage_id = %stage_id, job = %job, build_number, "Notifying Concourse stage start");
        let sent = self.http_client.post(url).body("").send().await;
        http::check(SERVICE, sent).await?;
        Ok(())
    }
}
