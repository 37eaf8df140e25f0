use async_trait::async_trait;
use rand::Rng;

use crate::DynUpstream;
use crate::error::UpstreamError;
use crate::traits::Upstream;
use crate::types::Fetched;

/// Picks one of several equivalent resolvers uniformly at random per call.
///
/// No affinity and no retry: a failure from the chosen member is returned
/// as is.
pub struct RandomUpstream {
    upstreams: Vec<DynUpstream>,
}

impl RandomUpstream {
    pub fn new(upstreams: Vec<DynUpstream>) -> Self {
        Self { upstreams }
    }
}

#[async_trait]
impl Upstream for RandomUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        if self.upstreams.is_empty() {
            return Err(UpstreamError::NoUpstreams);
        }
        let index = rand::thread_rng().gen_range(0..self.upstreams.len());
        self.upstreams[index].get(key).await
    }
}
