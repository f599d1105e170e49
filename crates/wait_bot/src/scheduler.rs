use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atl_site::{FetchError, SiteClient};
use social_services::{FeedPublisher, send_update};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wait_times::{SeverityThresholds, extract, format_now};

/// Trait for sources of the wait-time page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the HTML of `url`
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl PageFetcher for SiteClient {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_html(url).await
    }
}

/// Settings for the polling loop
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Page to scrape
    pub target_url: String,

    /// Time between two iterations
    pub interval: Duration,

    /// Granularity at which a shutdown request is noticed while sleeping (default: 10 seconds)
    pub tick: Duration,

    /// Bounds of the severity bands
    pub thresholds: SeverityThresholds,
}

impl SchedulerSettings {
    /// Settings with the default 10 second tick
    pub fn new(target_url: String, interval: Duration, thresholds: SeverityThresholds) -> Self {
        Self {
            target_url,
            interval,
            tick: Duration::from_secs(10),
            thresholds,
        }
    }
}

/// How a single iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The page could not be downloaded
    FetchFailed,
    /// The page held no usable wait times, nothing was posted
    NoData,
    /// An update was delivered
    Published,
    /// The update could not be delivered
    PublishFailed,
}

/// Drives fetch, extract, format and publish on a fixed interval
#[derive(Clone)]
pub struct Scheduler {
    fetcher: Arc<dyn PageFetcher>,
    publisher: Arc<dyn FeedPublisher>,
    settings: SchedulerSettings,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        publisher: Arc<dyn FeedPublisher>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            fetcher,
            publisher,
            settings,
        }
    }

    /// Run iterations until `shutdown` is cancelled, returning how many were started
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        info!(
            "Bot configured to check wait times every {} minutes",
            self.settings.interval.as_secs() / 60
        );

        let mut iteration: u64 = 0;

        while !shutdown.is_cancelled() {
            iteration += 1;
            info!("Starting iteration {}", iteration);

            // Each iteration runs in its own task so a panic cannot take the loop down.
            let this = self.clone();
            match tokio::spawn(async move { this.run_iteration().await }).await {
                Ok(outcome) => debug!("Iteration {} finished: {:?}", iteration, outcome),
                Err(e) => error!("Unexpected error in iteration {}: {}", iteration, e),
            }

            if !self.sleep_until_next(&shutdown).await {
                break;
            }
        }

        info!("Bot shutdown completed gracefully");
        iteration
    }

    /// Fetch, extract, format and publish once
    pub async fn run_iteration(&self) -> IterationOutcome {
        let html = match self.fetcher.fetch_page(&self.settings.target_url).await {
            Ok(html) => html,
            Err(e) => {
                error!(
                    "Failed to download HTML from {}: {}. Skipping this iteration.",
                    self.settings.target_url, e
                );
                return IterationOutcome::FetchFailed;
            }
        };

        let reading = extract(&html);
        if reading.is_empty() {
            warn!("No wait times retrieved. Skipping update.");
            return IterationOutcome::NoData;
        }

        info!("Retrieved wait times: {}", reading);

        let message = format_now(&reading, &self.settings.thresholds);
        info!("Formatted update:\n{}", message);

        if send_update(self.publisher.as_ref(), &message).await {
            info!("Iteration completed successfully");
            IterationOutcome::Published
        } else {
            error!("Failed to send update");
            IterationOutcome::PublishFailed
        }
    }

    /// Sleep one interval in ticks. Returns `false` once `shutdown` is cancelled.
    async fn sleep_until_next(&self, shutdown: &CancellationToken) -> bool {
        info!(
            "Sleeping for {} minutes until next check",
            self.settings.interval.as_secs() / 60
        );

        let tick = self.settings.tick.max(Duration::from_millis(1));
        let mut remaining = self.settings.interval;

        while !remaining.is_zero() {
            let step = remaining.min(tick);
            tokio::select! {
                _ = shutdown.cancelled() => return false,
                _ = sleep(step) => {}
            }
            remaining = remaining.saturating_sub(step);
        }

        !shutdown.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_services::PublishError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PAGE: &str = r#"
        <html>
            <h1>DOMESTIC Terminal</h1>
            <div>
                <div class="lomestic"><h2>NORTH CHECKPOINT</h2></div>
                <div class="lomestic"><h2>SOUTH CHECKPOINT</h2></div>
                <div class="lomestic"><h2>CENTRAL CHECKPOINT</h2></div>
                <div class="lomestic float-right">
                    <div class="declasser3"><button><span>15</span></button></div>
                </div>
                <div class="lomestic float-right">
                    <div class="declasser3"><button><span>25</span></button></div>
                </div>
                <div class="lomestic float-right">
                    <div class="declasser3"><button><span>35</span></button></div>
                </div>
            </div>
        </html>
    "#;

    enum FetchBehavior {
        Page(&'static str),
        Fail,
        Panic,
    }

    struct MockFetcher {
        behavior: FetchBehavior,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn new(behavior: FetchBehavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch_page(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                FetchBehavior::Page(html) => Ok(html.to_string()),
                FetchBehavior::Fail => Err(FetchError::Timeout(10)),
                FetchBehavior::Panic => panic!("fetcher blew up"),
            }
        }
    }

    struct MockPublisher {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockPublisher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedPublisher for MockPublisher {
        async fn publish(&self, text: &str) -> Result<String, PublishError> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(PublishError::Unauthorized("bad token".to_string()))
            } else {
                Ok("mock-update-id".to_string())
            }
        }
    }

    fn scheduler(fetcher: Arc<MockFetcher>, publisher: Arc<MockPublisher>) -> Scheduler {
        Scheduler::new(
            fetcher,
            publisher,
            SchedulerSettings::new(
                "https://www.atl.com/times/".to_string(),
                Duration::from_secs(60),
                SeverityThresholds::default(),
            ),
        )
    }

    #[tokio::test]
    async fn test_iteration_publishes_formatted_update() {
        let publisher = MockPublisher::new(false);
        let scheduler = scheduler(MockFetcher::new(FetchBehavior::Page(PAGE)), publisher.clone());

        assert_eq!(scheduler.run_iteration().await, IterationOutcome::Published);

        let sent = publisher.sent();
        assert_eq!(sent.len(), 1);

        let lines: Vec<&str> = sent[0].lines().collect();
        assert!(lines[0].starts_with("Current TSA wait times (as of "));
        assert_eq!(
            &lines[2..],
            &["🟢 North: 15 min", "🟡 South: 25 min", "🟠 Central: 35 min"]
        );
    }

    #[tokio::test]
    async fn test_iteration_skips_publish_without_data() {
        let publisher = MockPublisher::new(false);
        let scheduler = scheduler(
            MockFetcher::new(FetchBehavior::Page("<html><body>Closed</body></html>")),
            publisher.clone(),
        );

        assert_eq!(scheduler.run_iteration().await, IterationOutcome::NoData);
        assert!(publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_iteration_skips_publish_on_fetch_failure() {
        let publisher = MockPublisher::new(false);
        let scheduler = scheduler(MockFetcher::new(FetchBehavior::Fail), publisher.clone());

        assert_eq!(scheduler.run_iteration().await, IterationOutcome::FetchFailed);
        assert!(publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_iteration_reports_publish_failure() {
        let publisher = MockPublisher::new(true);
        let scheduler = scheduler(MockFetcher::new(FetchBehavior::Page(PAGE)), publisher.clone());

        assert_eq!(
            scheduler.run_iteration().await,
            IterationOutcome::PublishFailed
        );
        assert_eq!(publisher.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_repeats_on_interval_until_cancelled() {
        let fetcher = MockFetcher::new(FetchBehavior::Page(PAGE));
        let publisher = MockPublisher::new(false);
        let scheduler = scheduler(fetcher.clone(), publisher.clone());

        let token = CancellationToken::new();
        let run_token = token.clone();
        let handle = tokio::spawn(async move { scheduler.run(run_token).await });

        tokio::time::sleep(Duration::from_secs(95)).await;
        token.cancel();

        let iterations = handle.await.unwrap();
        assert_eq!(iterations, 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(publisher.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_failing_iterations() {
        let fetcher = MockFetcher::new(FetchBehavior::Panic);
        let publisher = MockPublisher::new(false);
        let scheduler = scheduler(fetcher.clone(), publisher.clone());

        let token = CancellationToken::new();
        let run_token = token.clone();
        let handle = tokio::spawn(async move { scheduler.run(run_token).await });

        tokio::time::sleep(Duration::from_secs(155)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert!(publisher.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_observed_within_a_tick() {
        let fetcher = MockFetcher::new(FetchBehavior::Fail);
        let publisher = MockPublisher::new(false);
        let mut scheduler = scheduler(fetcher, publisher);
        scheduler.settings.interval = Duration::from_secs(30 * 60);

        let token = CancellationToken::new();
        let run_token = token.clone();
        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(async move { scheduler.run(run_token).await });

        tokio::time::sleep(Duration::from_secs(5)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let fetcher = MockFetcher::new(FetchBehavior::Page(PAGE));
        let scheduler = scheduler(fetcher.clone(), MockPublisher::new(false));

        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(scheduler.run(token).await, 0);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
