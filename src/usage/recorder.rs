// (C) Copyright IBM Corp. 2025.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::models::{EvaluationEvent, RecorderEvent};
use super::{
    EvaluationTallyJson, FeedbackEvent, FeedbackScoreJson, UsageClient, UsageEvent,
    UsageRecordJson, UsageReportJson,
};
use crate::models::EvaluationResult;
use crate::utils::{ThreadHandle, ThreadStatus};

/// Starts periodic transmission of usage reports.
///
/// # Arguments
///
/// * `transmit_interval` - Time between transmissions to the client
/// * `client` - Receives the aggregated reports
///
/// # Return values
///
/// * UsageRecorder - Owns the background thread. Hand out
///   [`UsageRecorder::sender`] to whoever records events; dropping the
///   recorder flushes what is pending and stops the thread.
pub fn start_usage_recording<T: UsageClient>(
    transmit_interval: Duration,
    client: T,
) -> UsageRecorder {
    let (sender, receiver) = mpsc::channel();

    let thread = ThreadHandle::new(move |terminator: mpsc::Receiver<()>| {
        let mut batcher = UsageBatcher::new(client);
        let mut last_flush = Instant::now();
        debug!("Starting usage transmitting thread");
        loop {
            match receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => batcher.handle_event(event),
                // Nothing arrived, give the batcher a chance to flush:
                Err(RecvTimeoutError::Timeout) => {}
                // All senders have been dropped:
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if let Err(TryRecvError::Disconnected) = terminator.try_recv() {
                break;
            }
            if last_flush.elapsed() >= transmit_interval {
                batcher.flush();
                last_flush = Instant::now();
            }
        }
        // Drain what was queued before shutting down.
        while let Ok(event) = receiver.try_recv() {
            batcher.handle_event(event);
        }
        batcher.flush();
        debug!("Usage transmitting thread finished");
    });

    UsageRecorder {
        thread,
        sender: UsageRecorderSender {
            event_sender: sender,
        },
    }
}

/// Owns the usage transmitting thread.
#[derive(Debug)]
pub struct UsageRecorder {
    thread: ThreadHandle<()>,
    sender: UsageRecorderSender,
}

impl UsageRecorder {
    /// A cheap, cloneable handle for recording events from any thread.
    pub fn sender(&self) -> UsageRecorderSender {
        self.sender.clone()
    }

    pub fn get_thread_status(&mut self) -> ThreadStatus<()> {
        self.thread.get_thread_status()
    }
}

/// Enqueues events for the recorder thread. Never blocks; events that cannot
/// be enqueued are logged and dropped.
#[derive(Debug, Clone)]
pub struct UsageRecorderSender {
    event_sender: mpsc::Sender<RecorderEvent>,
}

impl UsageRecorderSender {
    pub fn record_usage(&self, event: UsageEvent) {
        let flag_name = event.flag_name.clone();
        self.send(RecorderEvent::Usage(event), &flag_name);
    }

    pub fn record_feedback(&self, event: FeedbackEvent) {
        let flag_name = event.flag_name.clone();
        self.send(RecorderEvent::Feedback(event), &flag_name);
    }

    pub fn record_evaluation(&self, flag_name: &str, result: &EvaluationResult) {
        self.send(
            RecorderEvent::Evaluation(EvaluationEvent {
                flag_name: flag_name.to_string(),
                enabled: result.enabled,
            }),
            flag_name,
        );
    }

    fn send(&self, event: RecorderEvent, flag_name: &str) {
        if let Err(e) = self.event_sender.send(event) {
            warn!("Fail to enqueue usage data for flag '{flag_name}': {e}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct UsageKey {
    flag_name: String,
    user_id: String,
    company_id: String,
    action: String,
}

#[derive(Debug)]
struct UsageAggregate {
    count: u32,
    last_seen: DateTime<Utc>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct EvaluationTally {
    enabled: u64,
    disabled: u64,
}

#[derive(Debug, Default)]
struct RatingTally {
    count: u64,
    sum: u64,
}

/// Aggregates events and batches them for transmission.
struct UsageBatcher<T: UsageClient> {
    usages: HashMap<UsageKey, UsageAggregate>,
    feedback: Vec<FeedbackEvent>,
    ratings: HashMap<String, RatingTally>,
    evaluations: HashMap<String, EvaluationTally>,
    client: T,
}

impl<T: UsageClient> UsageBatcher<T> {
    fn new(client: T) -> Self {
        Self {
            usages: HashMap::new(),
            feedback: Vec::new(),
            ratings: HashMap::new(),
            evaluations: HashMap::new(),
            client,
        }
    }

    fn handle_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::Usage(event) => {
                let key = UsageKey {
                    flag_name: event.flag_name,
                    user_id: event.user_id,
                    company_id: event.company_id,
                    action: event.action,
                };
                self.usages
                    .entry(key)
                    .and_modify(|aggregate| {
                        aggregate.count += 1;
                        aggregate.last_seen = aggregate.last_seen.max(event.timestamp);
                        aggregate.metadata = event.metadata.clone();
                    })
                    .or_insert_with(|| UsageAggregate {
                        count: 1,
                        last_seen: event.timestamp,
                        metadata: event.metadata.clone(),
                    });
            }
            RecorderEvent::Feedback(event) => {
                let tally = self.ratings.entry(event.flag_name.clone()).or_default();
                tally.count += 1;
                tally.sum += u64::from(event.rating);
                self.feedback.push(event);
            }
            RecorderEvent::Evaluation(event) => {
                let tally = self.evaluations.entry(event.flag_name).or_default();
                if event.enabled {
                    tally.enabled += 1;
                } else {
                    tally.disabled += 1;
                }
            }
        }
    }

    fn take_report(&mut self) -> UsageReportJson {
        let mut usages: Vec<_> = self.usages.drain().collect();
        usages.sort_by(|a, b| a.0.cmp(&b.0));
        let mut evaluations: Vec<_> = self.evaluations.drain().collect();
        evaluations.sort_by(|a, b| a.0.cmp(&b.0));
        let mut ratings: Vec<_> = self.ratings.drain().collect();
        ratings.sort_by(|a, b| a.0.cmp(&b.0));

        UsageReportJson {
            usages: usages
                .into_iter()
                .map(|(key, aggregate)| UsageRecordJson {
                    flag_name: key.flag_name,
                    user_id: key.user_id,
                    company_id: key.company_id,
                    action: key.action,
                    count: aggregate.count,
                    last_seen: aggregate.last_seen,
                    metadata: aggregate.metadata,
                })
                .collect(),
            feedback: std::mem::take(&mut self.feedback),
            feedback_scores: ratings
                .into_iter()
                .map(|(flag_name, tally)| FeedbackScoreJson::new(flag_name, tally.count, tally.sum))
                .collect(),
            evaluations: evaluations
                .into_iter()
                .map(|(flag_name, tally)| {
                    EvaluationTallyJson::new(flag_name, tally.enabled, tally.disabled)
                })
                .collect(),
        }
    }

    fn flush(&mut self) {
        let report = self.take_report();
        if report.is_empty() {
            return;
        }

        debug!(
            "Sending usage report: {} usages, {} feedback entries, {} evaluated flags.",
            report.usages.len(),
            report.feedback.len(),
            report.evaluations.len()
        );
        if let Err(err) = self.client.push_usage_report(&report) {
            warn!("Sending usage report failed: {}", err);
        }
    }
}
