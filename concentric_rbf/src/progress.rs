/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and the decile tracker for long-running runs.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for long-running computations.

use std::fmt::Debug;
use std::sync::{Arc, mpsc};
use std::thread;

/// Stage of the gamma search that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    CoarseScan,
    Bisection,
}

/// Progress events emitted during long-running computations.
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// Percentage of points evaluated in the current pass, in steps of ten.
    EvaluationProgress { percent: u32 },

    /// A gamma candidate has been scored.
    GammaCandidate {
        stage: SearchStage,
        gamma: f64,
        score: f64,
    },

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
/// The thread exits once every clone of the returned sink has been dropped.
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

/// Tracks completion in deciles and reports only when the decile increases.
///
/// # Examples
///
/// ```
/// use concentric_rbf::progress::DecileProgress;
///
/// let mut progress = DecileProgress::new();
/// assert_eq!(progress.update(0, 20), Some(0));
/// assert_eq!(progress.update(1, 20), None);
/// assert_eq!(progress.update(2, 20), Some(10));
/// assert_eq!(progress.update(20, 20), Some(100));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DecileProgress {
    previous: Option<u32>,
    current: Option<u32>,
}

impl DecileProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything reported so far.
    pub fn init(&mut self) {
        *self = Self::default();
    }

    /// Records `current` of `total` items done.
    ///
    /// Returns the percentage (a multiple of ten) when a new decile is reached.
    pub fn update(&mut self, current: usize, total: usize) -> Option<u32> {
        if total == 0 {
            return None;
        }

        let decile = (current.min(total) * 10 / total) as u32;
        self.current = Some(decile);

        match self.previous {
            Some(previous) if decile <= previous => None,
            _ => {
                self.previous = Some(decile);
                Some(decile * 10)
            }
        }
    }

    /// Last decile seen by [`DecileProgress::update`], reported or not.
    pub fn current(&self) -> Option<u32> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reports_each_decile_once() {
        let mut progress = DecileProgress::new();
        let total = 37;
        let reported: Vec<u32> = (0..=total)
            .filter_map(|i| progress.update(i, total))
            .collect();
        assert_eq!(reported, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
        assert_eq!(progress.current(), Some(10));
    }

    #[test]
    fn init_resets() {
        let mut progress = DecileProgress::new();
        assert_eq!(progress.update(5, 5), Some(100));
        assert_eq!(progress.update(5, 5), None);
        progress.init();
        assert_eq!(progress.update(5, 5), Some(100));
    }

    #[test]
    fn empty_total_reports_nothing() {
        let mut progress = DecileProgress::new();
        assert_eq!(progress.update(0, 0), None);
    }

    #[test]
    fn closure_sink_delivers_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_handler = Arc::clone(&seen);
        let (sink, handle) = closure_sink(8, move |msg| {
            if let ProgressMsg::EvaluationProgress { percent } = msg {
                seen_in_handler.lock().unwrap().push(percent);
            }
        });

        sink.emit(ProgressMsg::EvaluationProgress { percent: 40 });
        sink.emit(ProgressMsg::Message { message: "ignored".into() });
        drop(sink);
        handle.join().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![40]);
    }
}
