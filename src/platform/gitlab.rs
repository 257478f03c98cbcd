//! GitLab service implementation

use crate::error::{Error, Result};
use crate::platform::MergeRequestService;
use crate::types::{
    JobStats, ListQuery, MergeRequest, MergeStatus, MrRef, NewMergeRequest, Pipeline,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiUser {
    name: String,
}

#[derive(Deserialize)]
struct ApiPipeline {
    id: u64,
    status: String,
    web_url: Option<String>,
}

#[derive(Deserialize)]
struct ApiMergeRequest {
    id: u64,
    iid: u64,
    project_id: u64,
    title: String,
    state: String,
    source_branch: String,
    target_branch: String,
    author: Option<ApiUser>,
    web_url: String,
    // Absent on GitLab < 15.6, which only sends `merge_status`
    detailed_merge_status: Option<String>,
    merge_status: Option<String>,
    #[serde(default)]
    rebase_in_progress: bool,
    merge_error: Option<String>,
    head_pipeline: Option<ApiPipeline>,
}

#[derive(Deserialize)]
struct ApiJob {
    status: String,
}

impl From<ApiMergeRequest> for MergeRequest {
    fn from(mr: ApiMergeRequest) -> Self {
        let status = mr
            .detailed_merge_status
            .or(mr.merge_status)
            .unwrap_or_else(|| "unchecked".to_string());

        Self {
            id: mr.id,
            iid: mr.iid,
            project_id: mr.project_id,
            title: mr.title,
            state: mr.state,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            author: mr.author.map(|a| a.name),
            web_url: mr.web_url,
            detailed_merge_status: MergeStatus::from(status),
            rebase_in_progress: mr.rebase_in_progress,
            merge_error: mr.merge_error.filter(|e| !e.trim().is_empty()),
            head_pipeline: mr.head_pipeline.map(|p| Pipeline {
                id: p.id,
                status: p.status.into(),
                web_url: p.web_url,
            }),
        }
    }
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size used when scanning for a global MR id
const GLOBAL_LOOKUP_PAGE_SIZE: u32 = 100;

/// Turn a non-success response into an error that keeps GitLab's message.
///
/// `action` prefixes the message, e.g. `merging MR: 405 ... on ...: <body>`.
/// The merge engine inspects this text for rebase hints, so the body must
/// survive.
async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let endpoint = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(Error::GitLabApi(format!(
        "{action}: {status} on {endpoint}: {}",
        body.trim()
    )))
}

impl GitLabService {
    /// Create a new GitLab service
    ///
    /// `base_url` is the instance root, e.g. `https://gitlab.com`.
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    fn mr_url(project: &str, iid: u64, suffix: &str) -> String {
        format!(
            "/projects/{}/merge_requests/{iid}{suffix}",
            urlencoding::encode(project)
        )
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("PRIVATE-TOKEN", &self.token)
    }

    /// Map a reference to `(project, iid)`, scanning open MRs for global ids.
    async fn resolve(&self, reference: &MrRef) -> Result<(String, u64)> {
        match reference {
            MrRef::Project { project, iid } => Ok((project.clone(), *iid)),
            MrRef::Global(id) => {
                debug!(mr_id = id, "resolving global MR id");
                let url = self.api_url("/merge_requests");
                let per_page = GLOBAL_LOOKUP_PAGE_SIZE.to_string();

                let response = self
                    .authed(self.client.get(&url))
                    .query(&[
                        ("scope", "all"),
                        ("state", "opened"),
                        ("per_page", per_page.as_str()),
                    ])
                    .send()
                    .await?;
                let mrs: Vec<ApiMergeRequest> = ensure_success(response, "resolving MR id")
                    .await?
                    .json()
                    .await?;

                let found = mrs
                    .into_iter()
                    .find(|mr| mr.id == *id)
                    .ok_or_else(|| Error::NotFound(id.to_string()))?;

                debug!(
                    mr_id = id,
                    project_id = found.project_id,
                    mr_iid = found.iid,
                    "resolved global MR id"
                );
                Ok((found.project_id.to_string(), found.iid))
            }
        }
    }
}

#[async_trait]
impl MergeRequestService for GitLabService {
    async fn get_mr(&self, reference: &MrRef) -> Result<MergeRequest> {
        let (project, iid) = self.resolve(reference).await?;
        debug!(%project, mr_iid = iid, "getting MR");

        let url = self.api_url(&Self::mr_url(&project, iid, ""));
        let response = self
            .authed(self.client.get(&url))
            .query(&[("include_rebase_in_progress", "true")])
            .send()
            .await?;
        let mr: ApiMergeRequest = ensure_success(response, "getting MR").await?.json().await?;
        let mr: MergeRequest = mr.into();

        debug!(
            mr_iid = iid,
            status = %mr.detailed_merge_status,
            rebase_in_progress = mr.rebase_in_progress,
            "got MR"
        );
        Ok(mr)
    }

    async fn rebase_mr(&self, reference: &MrRef) -> Result<()> {
        let (project, iid) = self.resolve(reference).await?;
        debug!(%project, mr_iid = iid, "triggering rebase");

        let url = self.api_url(&Self::mr_url(&project, iid, "/rebase"));
        let response = self.authed(self.client.put(&url)).send().await?;
        ensure_success(response, "triggering rebase").await?;

        debug!(mr_iid = iid, "rebase accepted");
        Ok(())
    }

    async fn merge_mr(&self, reference: &MrRef) -> Result<()> {
        let (project, iid) = self.resolve(reference).await?;
        debug!(%project, mr_iid = iid, "merging MR");

        let url = self.api_url(&Self::mr_url(&project, iid, "/merge"));
        let response = self.authed(self.client.put(&url)).send().await?;
        ensure_success(response, "merging MR").await?;

        debug!(mr_iid = iid, "merge accepted");
        Ok(())
    }

    async fn pipeline_job_stats(&self, project: &str, pipeline_id: u64) -> Result<JobStats> {
        debug!(project, pipeline_id, "getting pipeline jobs");

        let url = self.api_url(&format!(
            "/projects/{}/pipelines/{pipeline_id}/jobs",
            urlencoding::encode(project)
        ));
        let response = self
            .authed(self.client.get(&url))
            .query(&[("per_page", "100")])
            .send()
            .await?;
        let jobs: Vec<ApiJob> = ensure_success(response, "getting pipeline jobs")
            .await?
            .json()
            .await?;

        Ok(JobStats::from_statuses(jobs.iter().map(|j| j.status.as_str())))
    }

    async fn list_mrs(&self, query: &ListQuery) -> Result<Vec<MergeRequest>> {
        debug!(?query, "listing MRs");

        let mut params: Vec<(&str, String)> = vec![
            ("state", "opened".to_string()),
            (
                "scope",
                if query.mine { "assigned_to_me" } else { "all" }.to_string(),
            ),
            ("per_page", query.per_page.unwrap_or(20).to_string()),
        ];
        if let Some(project_id) = query.project_id {
            params.push(("project_id", project_id.to_string()));
        }
        if query.approved {
            params.push(("approved_by_ids", "Any".to_string()));
        }

        let url = self.api_url("/merge_requests");
        let response = self
            .authed(self.client.get(&url))
            .query(&params)
            .send()
            .await?;
        let mrs: Vec<ApiMergeRequest> = ensure_success(response, "listing MRs")
            .await?
            .json()
            .await?;

        debug!(count = mrs.len(), "listed MRs");
        Ok(mrs.into_iter().map(Into::into).collect())
    }

    async fn create_mr(&self, project: &str, request: &NewMergeRequest) -> Result<MergeRequest> {
        debug!(
            project,
            source = %request.source_branch,
            target = %request.target_branch,
            "creating MR"
        );

        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            urlencoding::encode(project)
        ));
        let response = self
            .authed(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        let mr: ApiMergeRequest = ensure_success(response, "creating MR").await?.json().await?;
        let mr: MergeRequest = mr.into();

        debug!(mr_iid = mr.iid, project_id = mr.project_id, "created MR");
        Ok(mr)
    }
}
