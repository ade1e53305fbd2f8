//! API worker
//!
//! Network calls run on a dedicated thread hosting a tokio runtime. The controller
//! talks to it over channels: commands in, events out. Every call is spawned as
//! its own task, so a slow or hung request never holds up the next one. Calls
//! tied to a request id can be cancelled; an accepted request has no deadline.

use crate::api::{
    AnalysisRequest, AnalysisResponse, AudioResponse, AuthAction, AuthReply, Credentials,
    TasteService, UserStatus,
};
use crate::{Result, TasteError};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::runtime::Runtime;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runtime threads available to concurrent calls
const RUNTIME_THREADS: usize = 4;

/// Commands sent to the API worker
#[derive(Clone, Debug)]
pub enum ApiCommand {
    /// `POST /analyze`
    Analyze {
        request_id: Uuid,
        request: AnalysisRequest,
    },
    /// `POST /generate_audio`
    GenerateAudio { request_id: Uuid, dialogue: String },
    /// `GET /user/status`
    UserStatus,
    /// `POST /login` or `POST /register`
    Authenticate {
        action: AuthAction,
        credentials: Credentials,
    },
    /// `POST /logout`
    Logout,
    /// Abort the call started for a request id, if it is still running
    Cancel(Uuid),
    /// Shutdown the worker
    Shutdown,
}

/// Events emitted by the API worker, one per finished call
#[derive(Clone, Debug)]
pub enum ApiEvent {
    AnalysisDone {
        request_id: Uuid,
        result: Result<AnalysisResponse>,
    },
    AudioDone {
        request_id: Uuid,
        result: Result<AudioResponse>,
    },
    UserStatus(Result<UserStatus>),
    AuthDone {
        action: AuthAction,
        result: Result<AuthReply>,
    },
    LoggedOut(Result<()>),
    /// Worker shut down
    Shutdown,
}

/// Handle for interacting with a running API worker
pub struct ApiHandle {
    /// Send commands to the worker
    pub command_tx: Sender<ApiCommand>,
    /// Receive events from the worker
    pub event_rx: Receiver<ApiEvent>,
    /// Thread handle for the worker
    worker_handle: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn send(&self, command: ApiCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| TasteError::ChannelError(format!("Failed to send API command: {}", e)))
    }

    /// Take the worker thread handle so the owner can join it
    pub fn take_join_handle(&mut self) -> Option<JoinHandle<()>> {
        self.worker_handle.take()
    }

    /// Shutdown the worker and wait for it
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.command_tx.send(ApiCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| TasteError::ChannelError("API worker thread panicked".to_string()))?;
        }
        Ok(())
    }
}

/// Runner that spawns the API worker thread
pub struct ApiWorker<S> {
    service: S,
    buffer_size: usize,
}

impl<S: TasteService> ApiWorker<S> {
    pub fn new(service: S, buffer_size: usize) -> Self {
        Self {
            service,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Start the worker thread
    ///
    /// The worker runs in a separate thread with its own tokio runtime.
    pub fn start(self) -> Result<ApiHandle> {
        let (command_tx, command_rx) = bounded::<ApiCommand>(self.buffer_size);
        let (event_tx, event_rx) = bounded::<ApiEvent>(self.buffer_size);
        let service = Arc::new(self.service);

        let worker_handle = std::thread::Builder::new()
            .name("tastecheck-api".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(RUNTIME_THREADS)
                    .thread_name("tastecheck-api-call")
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to create tokio runtime: {}", e);
                        let _ = event_tx.send(ApiEvent::Shutdown);
                        return;
                    }
                };

                worker_loop(&runtime, service, command_rx, &event_tx);
                runtime.shutdown_background();
                let _ = event_tx.send(ApiEvent::Shutdown);
                info!("API worker shutdown complete");
            })?;

        Ok(ApiHandle {
            command_tx,
            event_rx,
            worker_handle: Some(worker_handle),
        })
    }
}

/// Run a call on the runtime and forward its event when it finishes
fn spawn_call<F>(runtime: &Runtime, event_tx: &Sender<ApiEvent>, call: F) -> AbortHandle
where
    F: Future<Output = ApiEvent> + Send + 'static,
{
    let event_tx = event_tx.clone();
    runtime
        .spawn(async move {
            let event = call.await;
            if event_tx.send(event).is_err() {
                debug!("API event channel closed, dropping reply");
            }
        })
        .abort_handle()
}

/// Main worker loop: dispatch each command as its own task
fn worker_loop<S: TasteService>(
    runtime: &Runtime,
    service: Arc<S>,
    command_rx: Receiver<ApiCommand>,
    event_tx: &Sender<ApiEvent>,
) {
    info!("API worker started");
    let mut in_flight: HashMap<Uuid, AbortHandle> = HashMap::new();

    loop {
        let command = match command_rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => {
                info!("API command channel closed, shutting down");
                break;
            }
        };
        in_flight.retain(|_, task| !task.is_finished());

        match command {
            ApiCommand::Analyze {
                request_id,
                request,
            } => {
                debug!("Analyze request {} ({})", request_id, request.mode);
                let service = Arc::clone(&service);
                let task = spawn_call(runtime, event_tx, async move {
                    let result = service.analyze(&request).await;
                    if let Err(e) = &result {
                        warn!("Analysis {} failed: {}", request_id, e);
                    }
                    ApiEvent::AnalysisDone { request_id, result }
                });
                in_flight.insert(request_id, task);
            }

            ApiCommand::GenerateAudio {
                request_id,
                dialogue,
            } => {
                debug!("Audio request {}", request_id);
                let service = Arc::clone(&service);
                let task = spawn_call(runtime, event_tx, async move {
                    let result = service.generate_audio(&dialogue).await;
                    ApiEvent::AudioDone { request_id, result }
                });
                in_flight.insert(request_id, task);
            }

            ApiCommand::UserStatus => {
                let service = Arc::clone(&service);
                spawn_call(runtime, event_tx, async move {
                    ApiEvent::UserStatus(service.user_status().await)
                });
            }

            ApiCommand::Authenticate {
                action,
                credentials,
            } => {
                debug!("{:?} for {}", action, credentials.email);
                let service = Arc::clone(&service);
                spawn_call(runtime, event_tx, async move {
                    let result = service.authenticate(action, &credentials).await;
                    ApiEvent::AuthDone { action, result }
                });
            }

            ApiCommand::Logout => {
                let service = Arc::clone(&service);
                spawn_call(runtime, event_tx, async move {
                    ApiEvent::LoggedOut(service.logout().await)
                });
            }

            ApiCommand::Cancel(request_id) => match in_flight.remove(&request_id) {
                Some(task) => {
                    debug!("Cancelling call {}", request_id);
                    task.abort();
                }
                None => debug!("Call {} already finished", request_id),
            },

            ApiCommand::Shutdown => {
                info!("API worker received shutdown");
                break;
            }
        }
    }

    for task in in_flight.values() {
        task.abort();
    }
}
