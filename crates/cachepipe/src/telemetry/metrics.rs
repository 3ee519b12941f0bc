// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::{
    InstrumentationScope,
    metrics::{Counter, Histogram, Meter, MeterProvider},
};

const METER_NAME: &str = "cachepipe";
const VERSION: &str = "v0.1.0";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
const EVENT_COUNT_NAME: &str = "cachepipe.event.count";
const OPERATION_DURATION_NAME: &str = "cachepipe.operation.duration";
const BATCH_KEYS_NAME: &str = "cachepipe.batch.keys";

pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

pub(crate) fn create_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter(EVENT_COUNT_NAME)
        .with_description("Pipeline events, counted per key")
        .with_unit("{event}")
        .build()
}

pub(crate) fn create_operation_duration_histogram(meter: &Meter) -> Histogram<f64> {
    meter
        .f64_histogram(OPERATION_DURATION_NAME)
        .with_description("Duration of cache, loader and pipeline operations")
        .with_unit("s")
        .build()
}

pub(crate) fn create_batch_keys_histogram(meter: &Meter) -> Histogram<u64> {
    meter
        .u64_histogram(BATCH_KEYS_NAME)
        .with_description("Distinct keys read per pipeline flush")
        .with_unit("{key}")
        .build()
}
