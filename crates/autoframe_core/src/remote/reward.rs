//! Reward/unlock gate consulted before a remote job starts.

use async_trait::async_trait;

/// What the gate is asked to unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRequest {
    pub job_id: String,
    pub file_count: usize,
    pub ratio_count: usize,
}

/// Gate reply; `token` is forwarded to the job start call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardOutcome {
    pub status: String,
    pub token: Option<String>,
}

impl RewardOutcome {
    pub fn granted(token: impl Into<String>) -> Self {
        Self {
            status: "granted".to_string(),
            token: Some(token.into()),
        }
    }

    pub fn unavailable(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            token: None,
        }
    }
}

/// External collaborator that trades user interaction for a start token.
#[async_trait]
pub trait RewardGate: Send + Sync {
    async fn request_unlock(&self, request: &RewardRequest) -> RewardOutcome;
}

/// Gate for hosts without any unlock flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRewardGate;

#[async_trait]
impl RewardGate for NoRewardGate {
    async fn request_unlock(&self, _request: &RewardRequest) -> RewardOutcome {
        RewardOutcome::unavailable("unconfigured")
    }
}

/// Gate that always hands out the same configured token.
#[derive(Debug, Clone)]
pub struct StaticTokenGate {
    token: String,
}

impl StaticTokenGate {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl RewardGate for StaticTokenGate {
    async fn request_unlock(&self, _request: &RewardRequest) -> RewardOutcome {
        RewardOutcome::granted(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RewardRequest {
        RewardRequest {
            job_id: "j1".into(),
            file_count: 1,
            ratio_count: 2,
        }
    }

    #[tokio::test]
    async fn no_gate_has_no_token() {
        let outcome = NoRewardGate.request_unlock(&request()).await;
        assert_eq!(outcome.status, "unconfigured");
        assert_eq!(outcome.token, None);
    }

    #[tokio::test]
    async fn static_gate_grants_token() {
        let outcome = StaticTokenGate::new("abc").request_unlock(&request()).await;
        assert_eq!(outcome, RewardOutcome::granted("abc"));
    }
}
