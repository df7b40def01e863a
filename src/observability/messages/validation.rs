// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scenario validation warnings and errors.

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct ScenarioRejected<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ScenarioRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "scenario '{}' rejected: {}", self.path, self.error)
    }
}

impl StructuredLog for ScenarioRejected<'_> {
    fn log(&self) {
        tracing::error!(path = self.path, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("scenario_rejected", span_name = name, path = self.path)
    }
}

pub struct ObjectiveDemoted<'a> {
    pub objective: &'a str,
    pub reason: &'a str,
}

impl Display for ObjectiveDemoted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "objective '{}' demoted: {}", self.objective, self.reason)
    }
}

impl StructuredLog for ObjectiveDemoted<'_> {
    fn log(&self) {
        tracing::warn!(objective = self.objective, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("objective_demoted", span_name = name, objective = self.objective)
    }
}
