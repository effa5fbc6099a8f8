use thiserror::Error;

use crate::model::CanonicalItem;
use crate::settings::SourceConfig;
use crate::source::{extract_or_empty, sort_by_recency, ExtractContext, SourceAdapter};
use crate::sqlite_cli::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("aggregation cycle cancelled")]
pub struct Cancelled;

pub struct AggregationPipeline<'a> {
    ctx: ExtractContext<'a>,
    parallel: bool,
}

impl<'a> AggregationPipeline<'a> {
    pub fn new(ctx: ExtractContext<'a>) -> Self {
        Self {
            ctx,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.ctx.cancel.clone()
    }

    pub fn build(
        &self,
        sources: &[(&dyn SourceAdapter, SourceConfig)],
        limit: Option<usize>,
    ) -> Vec<CanonicalItem> {
        self.run(sources, limit).unwrap_or_default()
    }

    pub fn run(
        &self,
        sources: &[(&dyn SourceAdapter, SourceConfig)],
        limit: Option<usize>,
    ) -> Result<Vec<CanonicalItem>, Cancelled> {
        let ready: Vec<(&dyn SourceAdapter, &SourceConfig)> = sources
            .iter()
            .filter(|(adapter, config)| {
                let descriptor = adapter.descriptor();
                let state = descriptor.readiness(config, self.ctx.fallback_executor.as_deref());
                if !state.is_ready() {
                    log::debug!("source {} skipped: {state:?}", descriptor.id);
                }
                state.is_ready()
            })
            .map(|(adapter, config)| (*adapter, config))
            .collect();

        let batches = if self.parallel && ready.len() > 1 {
            self.extract_parallel(&ready)
        } else {
            ready
                .iter()
                .map(|(adapter, config)| extract_or_empty(*adapter, &self.ctx, config))
                .collect()
        };

        if self.ctx.cancel.is_cancelled() {
            log::info!("catalog build cancelled; discarding partial results");
            return Err(Cancelled);
        }

        let mut items: Vec<CanonicalItem> = batches.into_iter().flatten().collect();
        sort_by_recency(&mut items);
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        log::info!(
            "catalog built from {} of {} sources: {} items",
            ready.len(),
            sources.len(),
            items.len()
        );
        Ok(items)
    }

    fn extract_parallel(
        &self,
        ready: &[(&dyn SourceAdapter, &SourceConfig)],
    ) -> Vec<Vec<CanonicalItem>> {
        let ctx = &self.ctx;
        std::thread::scope(|scope| {
            let handles: Vec<_> = ready
                .iter()
                .map(|&(adapter, config)| scope.spawn(move || extract_or_empty(adapter, ctx, config)))
                .collect();

            handles
                .into_iter()
                .zip(ready)
                .map(|(handle, (adapter, _))| {
                    handle.join().unwrap_or_else(|_| {
                        log::warn!("source {} panicked during extraction", adapter.descriptor().id);
                        Vec::new()
                    })
                })
                .collect()
        })
    }
}
