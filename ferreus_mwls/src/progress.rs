/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for MWLS construction and queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for approximator construction and queries.

use crate::config::SearchBackend;
use std::fmt::Debug;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Progress events emitted by an [`MwlsApproximator`](crate::MwlsApproximator).
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// Event indicating that the range search backend has been built.
    BackendBuilt {
        backend: SearchBackend,
        num_points: usize,
        elapsed: Duration,
    },

    /// Event indicating that the local system at `point` was singular and
    /// the zero coefficient fallback was returned.
    SingularSystem { point: Vec<f64> },

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        let _ = self.tx.try_send(msg);
    }
}

/// Spawns a listener thread that runs a handler closure for each progress message.
///
/// Messages are dropped rather than blocking the caller when more than `buffer`
/// of them are waiting. The listener exits once every clone of the returned sink
/// has been dropped.
///
/// # Example
/// ```
/// use ferreus_mwls::progress::{closure_sink, ProgressMsg, ProgressSink};
///
/// let (sink, handle) = closure_sink(16, |msg| {
///     if let ProgressMsg::Message { message } = msg {
///         println!("{message}");
///     }
/// });
///
/// sink.emit(ProgressMsg::Message { message: "hello".to_string() });
/// drop(sink);
/// handle.join().unwrap();
/// ```
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}

/// Progress sink that keeps every message in memory. Handy for inspecting
/// what an approximator reported.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: std::sync::Mutex<Vec<ProgressMsg>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the messages received so far.
    pub fn messages(&self) -> Vec<ProgressMsg> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, msg: ProgressMsg) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(msg),
            Err(poisoned) => poisoned.into_inner().push(msg),
        }
    }
}
