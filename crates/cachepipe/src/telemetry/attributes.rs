// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const PIPELINE_NAME: &str = "cachepipe.name";

#[cfg(test)]
pub(crate) const PIPELINE_EVENT_NAME: &str = "cachepipe.event";

#[cfg(any(feature = "metrics", test))]
pub(crate) const PIPELINE_OPERATION_NAME: &str = "cachepipe.operation";

#[cfg(any(feature = "metrics", test))]
pub(crate) const PIPELINE_ACTIVITY_NAME: &str = "cachepipe.activity";

#[cfg(test)]
pub(crate) const PIPELINE_COUNT_NAME: &str = "cachepipe.count";

#[cfg(test)]
pub(crate) const PIPELINE_DURATION_NAME: &str = "cachepipe.duration_ns";
