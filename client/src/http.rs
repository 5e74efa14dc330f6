//! `reqwest`-backed [`GovQuery`] implementation.

use async_trait::async_trait;
use govhub_types::{Address, ChainDescriptor, Proposal, ProposalId, TallyResult, VoteRecord};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ClientError;
use crate::query::{GovQuery, PROPOSAL_STATUS_VOTING_PERIOD};
use crate::wire::{ProposalsResponse, TallyResponse, VoteResponse};

/// Gateway path of the governance module.
pub const DEFAULT_GOV_API_PREFIX: &str = "/cosmos/gov/v1";

/// Error bodies are kept for diagnostics but cut to this many bytes.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for chain REST gateways.
///
/// One instance serves every chain; the chain's base URL comes from the
/// [`ChainDescriptor`] passed to each call.
#[derive(Clone)]
pub struct HttpGovClient {
    http: reqwest::Client,
    api_prefix: String,
}

impl HttpGovClient {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self {
            http,
            api_prefix: DEFAULT_GOV_API_PREFIX.to_string(),
        })
    }

    /// Use a different governance path (e.g. `/cosmos/gov/v1beta1`).
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.api_prefix = format!("/{}", prefix.trim_matches('/'));
        self
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn proposals_url(&self, chain: &ChainDescriptor) -> String {
        format!(
            "{}{}/proposals?proposal_status={}",
            chain.rest_base(),
            self.api_prefix,
            PROPOSAL_STATUS_VOTING_PERIOD
        )
    }

    pub fn proposal_count_url(&self, chain: &ChainDescriptor) -> String {
        format!(
            "{}&pagination.count_total=true&pagination.limit=1",
            self.proposals_url(chain)
        )
    }

    pub fn tally_url(&self, chain: &ChainDescriptor, proposal_id: &ProposalId) -> String {
        format!(
            "{}{}/proposals/{}/tally",
            chain.rest_base(),
            self.api_prefix,
            proposal_id
        )
    }

    pub fn vote_url(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
        voter: &Address,
    ) -> String {
        format!(
            "{}{}/proposals/{}/votes/{}",
            chain.rest_base(),
            self.api_prefix,
            proposal_id,
            voter
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GovQuery for HttpGovClient {
    async fn voting_proposals(&self, chain: &ChainDescriptor) -> Result<Vec<Proposal>, ClientError> {
        let url = self.proposals_url(chain);
        tracing::debug!(chain = %chain.chain_id, %url, "fetching voting proposals");
        let resp: ProposalsResponse = self.get_json(&url).await?;
        Ok(resp
            .proposals
            .into_iter()
            .map(|p| p.into_proposal())
            .collect())
    }

    async fn voting_proposal_count(&self, chain: &ChainDescriptor) -> Result<usize, ClientError> {
        let resp: ProposalsResponse = self.get_json(&self.proposal_count_url(chain)).await?;
        if let Some(total) = resp.counted_total() {
            return Ok(total);
        }
        // Gateway ignored count_total; count a full page instead.
        tracing::debug!(chain = %chain.chain_id, "gateway returned no total, counting full list");
        Ok(self.voting_proposals(chain).await?.len())
    }

    async fn tally(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
    ) -> Result<TallyResult, ClientError> {
        let resp: TallyResponse = self.get_json(&self.tally_url(chain, proposal_id)).await?;
        TallyResult::try_from(resp.tally)
    }

    async fn vote(
        &self,
        chain: &ChainDescriptor,
        proposal_id: &ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, ClientError> {
        let resp: VoteResponse = self
            .get_json(&self.vote_url(chain, proposal_id, voter))
            .await?;
        resp.vote.into_record()
    }
}
