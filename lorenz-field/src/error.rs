// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FieldError>;

#[derive(Debug, Error)]
pub enum FieldError {
    /// Inputs that cannot describe a meaningful sample grid or solve.
    /// Raised before any integration work starts.
    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// The solver could not carry the solution to the requested duration.
    #[error("integration failed at t={t}: {reason}")]
    IntegrationFailure { t: f64, reason: String },

    #[error("ensemble member {index} failed: {source}")]
    EnsembleMember {
        index: usize,
        #[source]
        source: Box<FieldError>,
    },
}

impl FieldError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            reason: reason.into(),
        }
    }

    pub fn integration(t: f64, reason: impl Into<String>) -> Self {
        Self::IntegrationFailure {
            t,
            reason: reason.into(),
        }
    }

    /// True for `InvalidParameters`, looking through ensemble wrapping.
    pub fn is_invalid_parameters(&self) -> bool {
        match self {
            Self::InvalidParameters { .. } => true,
            Self::EnsembleMember { source, .. } => source.is_invalid_parameters(),
            Self::IntegrationFailure { .. } => false,
        }
    }

    /// True for `IntegrationFailure`, looking through ensemble wrapping.
    pub fn is_integration_failure(&self) -> bool {
        match self {
            Self::IntegrationFailure { .. } => true,
            Self::EnsembleMember { source, .. } => source.is_integration_failure(),
            Self::InvalidParameters { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FieldError::invalid("dt must be positive");
        assert_eq!(err.to_string(), "invalid parameters: dt must be positive");

        let err = FieldError::integration(3.5, "step size underflow");
        assert_eq!(err.to_string(), "integration failed at t=3.5: step size underflow");
    }

    #[test]
    fn test_ensemble_wrapping_classification() {
        let inner = FieldError::integration(1.0, "diverged");
        let wrapped = FieldError::EnsembleMember {
            index: 2,
            source: Box::new(inner),
        };
        assert!(wrapped.is_integration_failure());
        assert!(!wrapped.is_invalid_parameters());
        assert!(wrapped.to_string().starts_with("ensemble member 2 failed"));
    }
}
