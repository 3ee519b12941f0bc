// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logs and OpenTelemetry metrics for pipeline activity.
//!
//! Every cache read, loader call, write-back and flush is recorded as an
//! activity of an operation. Logs go through `tracing`; metrics are emitted only
//! with the `metrics` feature and a configured meter provider.

use std::{sync::Arc, time::Duration};

use cachepipe_tier::Error;
#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};

pub(crate) mod attributes;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Operation {
    BulkGet,
    BulkSet,
    Load,
    Execute,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BulkGet => "cache.bulk_get",
            Self::BulkSet => "cache.bulk_set",
            Self::Load => "loader.load",
            Self::Execute => "pipeline.execute",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Activity {
    Hit,
    Miss,
    DecodeFailed,
    Filled,
    NotFound,
    FillFailed,
    Populated,
    PopulateFailed,
    CacheUnavailable,
    Cancelled,
    Ok,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::DecodeFailed => "cache.decode_failed",
            Self::Filled => "loader.filled",
            Self::NotFound => "loader.not_found",
            Self::FillFailed => "loader.fill_failed",
            Self::Populated => "cache.populated",
            Self::PopulateFailed => "cache.populate_failed",
            Self::CacheUnavailable => "cache.unavailable",
            Self::Cancelled => "pipeline.cancelled",
            Self::Ok => "pipeline.ok",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Hit | Self::Miss | Self::Filled | Self::Populated | Self::Ok => Severity::Debug,
            Self::DecodeFailed | Self::NotFound => Severity::Info,
            Self::PopulateFailed | Self::CacheUnavailable | Self::Cancelled => Severity::Warn,
            Self::FillFailed => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// One recorded occurrence of an activity.
#[derive(Debug)]
pub(crate) struct Event<'a> {
    pub name: &'static str,
    pub operation: Operation,
    pub activity: Activity,
    pub count: u64,
    pub duration: Option<Duration>,
    pub error: Option<&'a Error>,
}

impl<'a> Event<'a> {
    pub fn new(name: &'static str, operation: Operation, activity: Activity, count: usize) -> Self {
        Self {
            name,
            operation,
            activity,
            count: count as u64,
            duration: None,
            error: None,
        }
    }

    pub fn took(self, duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            ..self
        }
    }

    pub fn failed(self, error: &'a Error) -> Self {
        Self {
            error: Some(error),
            ..self
        }
    }
}

#[cfg(any(feature = "metrics", test))]
#[derive(Debug)]
struct Instruments {
    events: Counter<u64>,
    operation_duration: Histogram<f64>,
    batch_keys: Histogram<u64>,
}

#[derive(Debug)]
struct TelemetryInner {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    instruments: Option<Instruments>,
}

/// Records pipeline activity. Clones share the same instruments.
#[derive(Clone, Debug)]
pub(crate) struct PipelineTelemetry {
    inner: Arc<TelemetryInner>,
}

impl PipelineTelemetry {
    pub(crate) fn new(logging_enabled: bool) -> Self {
        Self {
            inner: Arc::new(TelemetryInner {
                logging_enabled,
                #[cfg(any(feature = "metrics", test))]
                instruments: None,
            }),
        }
    }

    #[cfg(any(feature = "metrics", test))]
    pub(crate) fn with_meter(logging_enabled: bool, meter: &Meter) -> Self {
        Self {
            inner: Arc::new(TelemetryInner {
                logging_enabled,
                instruments: Some(Instruments {
                    events: metrics::create_event_counter(meter),
                    operation_duration: metrics::create_operation_duration_histogram(meter),
                    batch_keys: metrics::create_batch_keys_histogram(meter),
                }),
            }),
        }
    }

    pub(crate) fn record(&self, event: &Event<'_>) {
        if event.count == 0 && event.duration.is_none() {
            return;
        }

        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.inner.instruments {
            let attrs = [
                KeyValue::new(attributes::PIPELINE_NAME, event.name),
                KeyValue::new(attributes::PIPELINE_OPERATION_NAME, event.operation.as_str()),
                KeyValue::new(attributes::PIPELINE_ACTIVITY_NAME, event.activity.as_str()),
            ];
            if event.count > 0 {
                instruments.events.add(event.count, &attrs);
            }
            if let Some(duration) = event.duration {
                instruments.operation_duration.record(duration.as_secs_f64(), &attrs);
            }
        }

        if self.inner.logging_enabled {
            Self::emit(event);
        }
    }

    #[cfg_attr(
        not(any(feature = "metrics", test)),
        expect(unused_variables, reason = "no-op without metrics")
    )]
    pub(crate) fn record_batch(&self, name: &'static str, keys: usize) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.inner.instruments {
            instruments
                .batch_keys
                .record(keys as u64, &[KeyValue::new(attributes::PIPELINE_NAME, name)]);
        }
    }

    fn emit(event: &Event<'_>) {
        let name = event.name;
        let op = event.operation.as_str();
        let activity = event.activity.as_str();
        let count = event.count;
        let duration_ns = event.duration.map(|d| d.as_nanos());
        let error = event.error.map(tracing::field::display);

        // Tracing level must be constant, so we use a macro to select the appropriate level.
        // Field names must match constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cachepipe.name = name,
                    cachepipe.operation = op,
                    cachepipe.activity = activity,
                    cachepipe.count = count,
                    cachepipe.duration_ns = ?duration_ns,
                    cachepipe.error = error,
                    "cachepipe.event"
                )
            };
        }

        match event.activity.severity() {
            Severity::Error => emit_event!(error),
            Severity::Warn => emit_event!(warn),
            Severity::Info => emit_event!(info),
            Severity::Debug => emit_event!(debug),
        }
    }
}
