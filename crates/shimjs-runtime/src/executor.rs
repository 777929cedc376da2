// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Single-thread script executor.
//!
//! Script values are `Rc`-based and never leave the thread that created
//! them. The executor owns one [`ScriptContext`] on a dedicated worker thread
//! and runs submitted jobs against it in submission order. Each submission
//! returns a [`JobHandle`], a future resolving to the job's result.
//!
//! # Example
//!
//! ```rust
//! use shimjs_runtime::{RuntimeConfig, ScriptExecutor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> shimjs_runtime::Result<()> {
//! let executor = ScriptExecutor::new(&RuntimeConfig::default())?;
//! let sum = executor.submit_eval("1 + 2")?.await?;
//! assert_eq!(sum, serde_json::json!(3));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender, TrySendError};
use serde_json::Value as JsonValue;
use shimjs_loader::SourceMap;
use shimjs_script::Value;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace};

use crate::config::RuntimeConfig;
use crate::context::ScriptContext;
use crate::error::{Result, RuntimeError};

const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

type Job = Box<dyn FnOnce(&mut ScriptContext) + Send>;

/// Runs a [`ScriptContext`] on its own thread behind a bounded job queue
pub struct ScriptExecutor {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    capacity: usize,
}

impl ScriptExecutor {
    /// Start the worker thread and create its context from `config`
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let capacity = config.executor.queue_capacity.max(1);
        let (sender, receiver) = channel::bounded::<Job>(capacity);
        let context_config = config.clone();

        let worker = thread::Builder::new()
            .name(config.executor.thread_name.clone())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let mut context = ScriptContext::with_config(&context_config);
                info!("script executor started");

                for job in receiver.iter() {
                    if panic::catch_unwind(AssertUnwindSafe(|| job(&mut context))).is_err() {
                        error!("script job panicked");
                    }
                }

                info!("script executor stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            capacity,
        })
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs waiting in the queue
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    /// Whether the executor still accepts jobs
    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue `job` to run against the worker's context.
    ///
    /// Fails immediately with [`RuntimeError::QueueFull`] when the queue has
    /// no room, and with [`RuntimeError::ExecutorClosed`] after shutdown.
    pub fn submit<T, F>(&self, job: F) -> Result<JobHandle<T>>
    where
        F: FnOnce(&mut ScriptContext) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(RuntimeError::ExecutorClosed)?;
        let (result_tx, result_rx) = oneshot::channel();

        let job: Job = Box::new(move |context: &mut ScriptContext| {
            // The receiver may already be gone; the job still ran.
            let _ = result_tx.send(job(context));
        });

        match sender.try_send(job) {
            Ok(()) => {
                trace!(pending = sender.len(), "job queued");
                Ok(JobHandle { receiver: result_rx })
            }
            Err(TrySendError::Full(_)) => Err(RuntimeError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(RuntimeError::ExecutorClosed),
        }
    }

    /// Evaluate `code` with eval shielding; the result is converted to JSON
    pub fn submit_eval(&self, code: impl Into<String>) -> Result<JobHandle<JsonValue>> {
        let code = code.into();
        self.submit(move |context| Ok(context.eval(&code)?.to_json()?))
    }

    /// Evaluate `code` in the global scope, keeping its definitions
    pub fn submit_eval_into_engine(&self, code: impl Into<String>) -> Result<JobHandle<JsonValue>> {
        let code = code.into();
        self.submit(move |context| Ok(context.eval_into_engine(&code)?.to_json()?))
    }

    /// Call the global function `name` with JSON arguments
    pub fn submit_function_invocation(
        &self,
        name: impl Into<String>,
        args: Vec<JsonValue>,
    ) -> Result<JobHandle<JsonValue>> {
        let name = name.into();
        self.submit(move |context| {
            let args: Vec<Value> = args.iter().map(Value::from_json).collect();
            Ok(context.invoke_function(&name, &args)?.to_json()?)
        })
    }

    /// Call `method` on the global object found at the dotted `target` path
    pub fn submit_method_invocation(
        &self,
        target: impl Into<String>,
        method: impl Into<String>,
        args: Vec<JsonValue>,
    ) -> Result<JobHandle<JsonValue>> {
        let target = target.into();
        let method = method.into();
        self.submit(move |context| {
            let object = context.get_script_object(&target)?;
            let args: Vec<Value> = args.iter().map(Value::from_json).collect();
            Ok(context.invoke_method(&object, &method, &args)?.to_json()?)
        })
    }

    /// Require a module from the root directory and return its exports as JSON
    pub fn submit_require(&self, specifier: impl Into<String>) -> Result<JobHandle<JsonValue>> {
        let specifier = specifier.into();
        self.submit(move |context| Ok(context.require(&specifier)?.to_json()?))
    }

    /// Register `sources` with the worker's loader
    pub fn submit_load(&self, sources: SourceMap) -> Result<JobHandle<()>> {
        self.submit(move |context| context.load_with_require(&sources))
    }

    /// Stop accepting jobs, drain the queue and wait for the worker to exit
    pub fn shutdown(&mut self) -> Result<()> {
        if self.sender.take().is_some() {
            debug!("shutting down script executor");
        }
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| RuntimeError::JobAborted),
            None => Ok(()),
        }
    }
}

impl Drop for ScriptExecutor {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!(%err, "script executor did not stop cleanly");
        }
    }
}

/// Pending result of a submitted job.
///
/// Await it from async code, or call [`wait`](Self::wait) from a thread
/// that is not driving a tokio runtime.
#[derive(Debug)]
pub struct JobHandle<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> JobHandle<T> {
    /// Block the current thread until the job finishes
    pub fn wait(self) -> Result<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(RuntimeError::JobAborted))
    }
}

impl<T> Future for JobHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RuntimeError::JobAborted)))
    }
}
