//! Trader service: market maker plus scheduler behind start/shutdown.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::{info, info_span, warn, Instrument};
use vmm_core::{Price, Ticker};
use vmm_executor::{IntervalScheduler, IterationContext, IterationTask, SchedulerState};
use vmm_gateway::{DynGateway, PaperGateway, TimeoutGateway};
use vmm_mm::{MarketMaker, MmError};

use crate::config::{AppConfig, GatewayConfig};
use crate::error::{AppError, AppResult};

/// Adapts [`MarketMaker::do_iteration`] to the scheduler's task contract.
pub struct MarketMakerTask(Arc<MarketMaker>);

impl MarketMakerTask {
    pub fn new(maker: Arc<MarketMaker>) -> Self {
        Self(maker)
    }
}

impl IterationTask for MarketMakerTask {
    type Error = MmError;

    fn execute(&self, ctx: IterationContext) -> BoxFuture<'_, Result<(), MmError>> {
        let span = info_span!(
            "iteration",
            symbol = %self.0.config().symbol,
            interval = ctx.interval,
            iteration = ctx.iteration
        );
        Box::pin(self.0.do_iteration().instrument(span))
    }
}

/// Paper venue seeded from config, behind the per-call deadline.
pub fn build_paper_gateway(config: &GatewayConfig) -> DynGateway {
    let mut paper = PaperGateway::new();
    if config.paper_latency_ms > 0 {
        paper = paper.with_latency(Duration::from_millis(config.paper_latency_ms));
    }
    for t in &config.paper_tickers {
        paper.set_ticker(Ticker::new(
            t.symbol.clone(),
            Price::new(t.last_price),
            Price::new(t.best_bid),
            Price::new(t.best_ask),
        ));
    }
    Arc::new(TimeoutGateway::new(Arc::new(paper), config.request_timeout()))
}

/// Owns one market maker and the scheduler driving it.
pub struct TraderService {
    name: String,
    maker: Arc<MarketMaker>,
    scheduler: IntervalScheduler<MarketMakerTask>,
}

impl TraderService {
    pub fn new(config: &AppConfig, gateway: DynGateway, oracle_gateway: DynGateway) -> AppResult<Self> {
        let maker = Arc::new(MarketMaker::new(config.trade.clone(), gateway, oracle_gateway)?);
        let task = Arc::new(MarketMakerTask::new(Arc::clone(&maker)));
        let scheduler = IntervalScheduler::new(config.executor.clone(), task)?;
        Ok(Self {
            name: config.service_name.clone(),
            maker,
            scheduler,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Begin scheduling; returns immediately.
    pub fn start(&self) -> AppResult<()> {
        self.scheduler.start()?;
        info!(
            service = %self.name,
            symbol = %self.maker.config().symbol,
            oracle_symbol = %self.maker.config().oracle_symbol(),
            interval_ms = self.scheduler.config().interval_ms,
            iterations = self.scheduler.config().iterations_per_interval,
            "Trader service started"
        );
        Ok(())
    }

    /// Stop scheduling and wait for the in-flight iteration, up to `deadline`.
    ///
    /// On timeout the run loop is already signalled and exits once the
    /// current iteration returns; a later call waits for that exit again.
    pub async fn shutdown(&self, deadline: Duration) -> AppResult<()> {
        info!(service = %self.name, deadline_ms = deadline.as_millis() as u64, "Shutting down trader service");
        match tokio::time::timeout(deadline, self.scheduler.shutdown()).await {
            Ok(()) => {
                info!(service = %self.name, "Trader service stopped");
                Ok(())
            }
            Err(_) => {
                warn!(service = %self.name, "Shutdown deadline exceeded");
                Err(AppError::ShutdownTimeout(deadline))
            }
        }
    }
}
