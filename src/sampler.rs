use crate::configuration::Configuration;
use crate::data::Snapshot;
use crate::registry::Registry;
use crossbeam_channel::{bounded, tick, Sender};
use log::debug;
use std::io;
use std::sync::Arc;
use std::time::Instant;

pub(crate) enum ControlMessage {
    Snapshot(Sender<Snapshot>),
    Stop,
}

/// Periodic sampler which drives a registry's export.
///
/// The sampler owns a shared [`Registry`] handle and, once [`run`] is called,
/// samples it on a fixed interval, handing each snapshot to the configured
/// exporter.  Writers keep recording into their metric handles the whole
/// time; sampling never blocks them beyond one stripe's critical section.
///
/// [`run`]: Sampler::run
pub struct Sampler {
    registry: Arc<Registry>,
    conf: Configuration,
    control_tx: Sender<ControlMessage>,
    control_rx: crossbeam_channel::Receiver<ControlMessage>,
}

impl Sampler {
    pub(crate) fn from_config(conf: Configuration) -> Sampler {
        let (control_tx, control_rx) = bounded(1024);
        let registry = Arc::new(Registry::with_stripes(conf.stripe_count));

        Sampler {
            registry,
            conf,
            control_tx,
            control_rx,
        }
    }

    /// Gets a builder to configure a `Sampler` instance with.
    pub fn builder() -> Configuration { Configuration::default() }

    /// Shared handle to the registry this sampler reads.
    pub fn registry(&self) -> Arc<Registry> { self.registry.clone() }

    /// Creates a `Controller` bound to this sampler.
    pub fn controller(&self) -> Controller { Controller::new(self.control_tx.clone()) }

    /// Runs the sampling loop until a stop command arrives.
    pub fn run(&mut self) {
        let control_rx = self.control_rx.clone();
        let ticker = tick(self.conf.sample_interval);

        loop {
            crossbeam_channel::select! {
                recv(control_rx) -> msg => match msg {
                    Ok(ControlMessage::Snapshot(tx)) => {
                        let _ = tx.send(self.registry.sample());
                    },
                    Ok(ControlMessage::Stop) | Err(_) => break,
                },
                recv(ticker) -> _ => {
                    let start = Instant::now();
                    let snapshot = self.registry.sample();
                    debug!("sampled {} metrics in {:?}", snapshot.len(), start.elapsed());

                    if let Some(exporter) = self.conf.exporter.as_mut() {
                        exporter(snapshot);
                    }
                },
            }
        }
    }
}

/// Handle for interacting with a running [`Sampler`] from other threads.
#[derive(Clone)]
pub struct Controller {
    control_tx: Sender<ControlMessage>,
}

impl Controller {
    pub(crate) fn new(control_tx: Sender<ControlMessage>) -> Controller {
        Controller { control_tx }
    }

    /// Requests an on-demand snapshot from the sampler.
    ///
    /// Fails if the sampler has shut down and its control channel is gone.
    pub fn snapshot(&self) -> Result<Snapshot, io::Error> {
        let (tx, rx) = bounded(1);
        self.control_tx
            .send(ControlMessage::Snapshot(tx))
            .map_err(|_| io_error("failed to send snapshot command"))?;
        rx.recv().map_err(|_| io_error("failed to receive snapshot"))
    }

    /// Asks the sampler to stop after its current turn.
    pub fn stop(&self) { let _ = self.control_tx.send(ControlMessage::Stop); }
}

fn io_error(reason: &str) -> io::Error { io::Error::new(io::ErrorKind::Other, reason) }
