use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use retailmap_core::{AppConfig, BoundingBox, PincodeCollection};

use crate::error::{LoaderError, SourceError};
use crate::source::BoundarySource;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MIN_ZOOM: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderConfig {
    /// Quiet period after the last viewport change before querying.
    pub debounce: Duration,
    /// Below this zoom nothing is queried and published data is cleared.
    pub min_zoom: f64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_zoom: DEFAULT_MIN_ZOOM,
        }
    }
}

impl LoaderConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            min_zoom: config.pincode_min_zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    Idle,
    /// Waiting for the viewport to settle.
    Pending,
    Fetching,
    Ready,
    /// Last query failed; `data` still holds the previous result.
    Failed,
}

/// What the map layer should currently draw.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSnapshot {
    pub phase: LoaderPhase,
    pub data: Option<Arc<PincodeCollection>>,
    pub error: Option<String>,
    pub generation: u64,
}

impl LoaderSnapshot {
    fn idle() -> Self {
        Self {
            phase: LoaderPhase::Idle,
            data: None,
            error: None,
            generation: 0,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoaderPhase::Pending | LoaderPhase::Fetching)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Observation {
    zoom: f64,
    bounds: Option<BoundingBox>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct QueryKey {
    zoom: f64,
    bounds: BoundingBox,
}

#[derive(Debug)]
enum Command {
    Observe(Observation),
    SetMinZoom(f64),
}

type Completion = (u64, Result<PincodeCollection, SourceError>);

/// Sends viewport observations to the loader. Cheap to clone; the loader
/// stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct ViewportHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ViewportHandle {
    /// Reports the current zoom and visible bounds.
    ///
    /// A NaN or infinite zoom counts as below the threshold.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if the loader task has stopped.
    pub fn observe(&self, zoom: f64, bounds: Option<BoundingBox>) -> Result<(), LoaderError> {
        self.commands
            .send(Command::Observe(Observation { zoom, bounds }))
            .map_err(|_| LoaderError::Closed)
    }

    /// Changes the zoom threshold and re-evaluates the last observation.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidZoom`] for a NaN or infinite threshold
    /// and [`LoaderError::Closed`] if the loader task has stopped.
    pub fn set_min_zoom(&self, min_zoom: f64) -> Result<(), LoaderError> {
        if !min_zoom.is_finite() {
            return Err(LoaderError::InvalidZoom(min_zoom));
        }
        self.commands
            .send(Command::SetMinZoom(min_zoom))
            .map_err(|_| LoaderError::Closed)
    }
}

struct InFlight {
    generation: u64,
    started: Instant,
    task: JoinHandle<()>,
}

pub struct ViewportLoader<S> {
    source: Arc<S>,
    config: LoaderConfig,
    snapshot: watch::Sender<LoaderSnapshot>,
    completions: mpsc::UnboundedSender<Completion>,
    generation: u64,
    last_observation: Option<Observation>,
    /// Key of the most recent accepted query, pending or started.
    current_key: Option<QueryKey>,
    deadline: Option<Instant>,
    in_flight: Option<InFlight>,
}

impl<S: BoundarySource> ViewportLoader<S> {
    /// Starts the loader task on the current tokio runtime.
    ///
    /// Returns the handle used to report viewport changes and a receiver
    /// for published snapshots.
    pub fn spawn(source: S, config: LoaderConfig) -> (ViewportHandle, watch::Receiver<LoaderSnapshot>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(LoaderSnapshot::idle());

        let loader = Self {
            source: Arc::new(source),
            config,
            snapshot: snapshot_tx,
            completions: completion_tx,
            generation: 0,
            last_observation: None,
            current_key: None,
            deadline: None,
            in_flight: None,
        };
        tokio::spawn(loader.run(command_rx, completion_rx));

        (
            ViewportHandle {
                commands: command_tx,
            },
            snapshot_rx,
        )
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Observe(observation)) => self.observe(observation),
                    Some(Command::SetMinZoom(min_zoom)) => self.set_min_zoom(min_zoom),
                    None => break,
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.start_fetch();
                }
                Some((generation, result)) = completions.recv() => self.complete(generation, result),
            }
        }

        self.cancel_in_flight();
        tracing::debug!("viewport loader stopped");
    }

    fn observe(&mut self, observation: Observation) {
        tracing::debug!(
            zoom = observation.zoom,
            bounds = ?observation.bounds,
            "viewport observed"
        );
        self.last_observation = Some(observation);

        let qualifies = observation.zoom.is_finite() && observation.zoom >= self.config.min_zoom;
        if !qualifies {
            self.clear_below_threshold(observation.zoom);
            return;
        }
        let Some(bounds) = observation.bounds else {
            return;
        };
        let key = QueryKey {
            zoom: observation.zoom,
            bounds,
        };

        let phase = self.snapshot.borrow().phase;
        let unchanged = self.current_key == Some(key)
            && matches!(
                phase,
                LoaderPhase::Pending | LoaderPhase::Fetching | LoaderPhase::Ready
            );
        if unchanged {
            return;
        }

        self.generation += 1;
        self.cancel_in_flight();
        self.current_key = Some(key);
        self.deadline = Some(Instant::now() + self.config.debounce);
        self.publish(|s| s.phase = LoaderPhase::Pending);
    }

    fn set_min_zoom(&mut self, min_zoom: f64) {
        if !min_zoom.is_finite() {
            tracing::warn!(
                min_zoom,
                current = self.config.min_zoom,
                "ignoring non-finite pincode zoom threshold"
            );
            return;
        }
        tracing::debug!(min_zoom, "pincode zoom threshold changed");
        self.config.min_zoom = min_zoom;
        if let Some(observation) = self.last_observation {
            self.observe(observation);
        }
    }

    fn clear_below_threshold(&mut self, zoom: f64) {
        let had_work = self.deadline.is_some() || self.in_flight.is_some();
        let had_data = self.snapshot.borrow().data.is_some();
        if !had_work && !had_data && self.current_key.is_none() {
            return;
        }
        tracing::debug!(zoom, min_zoom = self.config.min_zoom, "below pincode zoom threshold, clearing");
        self.generation += 1;
        self.cancel_in_flight();
        self.deadline = None;
        self.current_key = None;
        self.publish(|s| {
            s.phase = LoaderPhase::Idle;
            s.data = None;
            s.error = None;
        });
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(
                generation = in_flight.generation,
                "superseded in-flight pincode query"
            );
            in_flight.task.abort();
        }
    }

    fn start_fetch(&mut self) {
        self.deadline = None;
        let Some(key) = self.current_key else {
            return;
        };
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();

        let task = tokio::spawn(async move {
            let result = source.fetch(key.bounds, key.zoom).await;
            // The receiver lives as long as the loader; a send error means
            // the loader has already stopped.
            let _ = completions.send((generation, result));
        });
        self.in_flight = Some(InFlight {
            generation,
            started: Instant::now(),
            task,
        });
        self.publish(|s| {
            s.phase = LoaderPhase::Fetching;
            s.error = None;
        });
    }

    fn complete(&mut self, generation: u64, result: Result<PincodeCollection, SourceError>) {
        let current = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation && generation == self.generation);
        if !current {
            tracing::debug!(generation, current = self.generation, "dropping stale pincode result");
            return;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        let elapsed_ms = u64::try_from(in_flight.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(collection) => {
                tracing::info!(
                    features = collection.len(),
                    elapsed_ms,
                    generation,
                    "pincode boundaries ready"
                );
                let data = Arc::new(collection);
                self.publish(|s| {
                    s.phase = LoaderPhase::Ready;
                    s.data = Some(data);
                    s.error = None;
                });
            }
            Err(SourceError::Cancelled) => {
                tracing::debug!(generation, "pincode query cancelled by source");
                self.current_key = None;
                self.publish(|s| {
                    s.phase = if s.data.is_some() {
                        LoaderPhase::Ready
                    } else {
                        LoaderPhase::Idle
                    };
                });
            }
            Err(SourceError::Backend(message)) => {
                tracing::warn!(error = %message, elapsed_ms, generation, "pincode query failed");
                self.publish(|s| {
                    s.phase = LoaderPhase::Failed;
                    s.error = Some(message);
                });
            }
        }
    }

    fn publish(&self, update: impl FnOnce(&mut LoaderSnapshot)) {
        let generation = self.generation;
        self.snapshot.send_modify(|snapshot| {
            update(snapshot);
            snapshot.generation = generation;
        });
    }
}
