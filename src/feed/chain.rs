use async_trait::async_trait;
use tracing::{error, warn};

use super::{FeedQuery, Post, PostSource, RetrievalError};

/// Two-tier retrieval: the primary source, then the fallback on any failure.
///
/// There is no retry inside either tier. When both fail, the fallback's error is
/// returned and the primary's is only logged.
pub struct FallbackChain {
    primary: Box<dyn PostSource>,
    fallback: Box<dyn PostSource>,
}

impl FallbackChain {
    #[must_use]
    pub fn new(primary: Box<dyn PostSource>, fallback: Box<dyn PostSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PostSource for FallbackChain {
    fn name(&self) -> &'static str {
        "fallback-chain"
    }

    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<Post>, RetrievalError> {
        match self.primary.fetch(query).await {
            Ok(posts) => return Ok(posts),
            Err(primary_err) => {
                warn!(
                    source = self.primary.name(),
                    fallback = self.fallback.name(),
                    community = %query.community,
                    sort = %query.sort,
                    error = %primary_err,
                    "Primary retrieval failed, falling back"
                );
            }
        }

        self.fallback.fetch(query).await.inspect_err(|e| {
            error!(
                source = self.fallback.name(),
                community = %query.community,
                sort = %query.sort,
                error = %e,
                "Fallback retrieval failed"
            );
        })
    }
}
