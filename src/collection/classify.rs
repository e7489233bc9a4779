//! Classification: turning a candidate type into zero or more descriptors.

use std::panic::{self, AssertUnwindSafe};

use crate::candidate::{CandidateType, Injectable};
use crate::descriptors::ServiceDescriptor;
use crate::error::DiError;
use crate::internal::panic_message;
use crate::key::Key;
use crate::registration::Registration;

/// Decides which descriptors a candidate contributes.
///
/// A candidate contributes nothing when it is abstract, has no injectable
/// metadata, has metadata that fails to evaluate, or ends up with no contract
/// it can actually be viewed as. A declared contract takes precedence over the
/// contracts requested by the scanning location; an unbound declaration yields
/// one descriptor per requested contract the candidate satisfies.
///
/// Classification never fails. Rejections are logged at `debug` level and
/// metadata failures at `warn` level.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{classify, CandidateType, Lifetime};
/// use std::sync::Arc;
///
/// trait Codec: Send + Sync {}
/// trait Filter: Send + Sync {}
///
/// #[derive(Default)]
/// struct Gzip;
/// impl Codec for Gzip {}
/// impl Filter for Gzip {}
///
/// let candidate = CandidateType::of_default::<Gzip>()
///     .implements::<dyn Codec>(|g| g as Arc<dyn Codec>)
///     .implements::<dyn Filter>(|g| g as Arc<dyn Filter>)
///     .injectable_unbound(Lifetime::Transient)
///     .requesting::<dyn Codec>()
///     .requesting::<dyn Filter>()
///     .build();
///
/// assert_eq!(classify(&candidate).len(), 2);
/// ```
pub fn classify(candidate: &CandidateType) -> Vec<ServiceDescriptor> {
    classify_registrations(candidate)
        .into_iter()
        .map(|reg| reg.descriptor)
        .collect()
}

pub(crate) fn classify_registrations(candidate: &CandidateType) -> Vec<Registration> {
    let implementation = candidate.implementation();

    if candidate.is_abstract() {
        tracing::debug!(candidate = %implementation, "skipping abstract candidate");
        return Vec::new();
    }

    let Some(injectable) = evaluate_metadata(candidate) else {
        return Vec::new();
    };

    let contracts: Vec<Key> = match injectable.contract {
        Some(contract) => vec![contract],
        None => candidate.requested().to_vec(),
    };
    if contracts.is_empty() {
        tracing::debug!(
            candidate = %implementation,
            "skipping candidate with no declared or requested contract"
        );
        return Vec::new();
    }

    contracts
        .into_iter()
        .filter_map(|contract| {
            let registration = candidate.registration(contract, injectable.lifetime, false);
            if registration.is_none() {
                tracing::debug!(
                    candidate = %implementation,
                    contract = %contract,
                    "candidate does not satisfy contract"
                );
            }
            registration
        })
        .collect()
}

/// Evaluates a candidate's injectable metadata, logging and swallowing failures.
///
/// `None` when the candidate declares no metadata or its evaluation fails.
pub(crate) fn evaluate_metadata(candidate: &CandidateType) -> Option<Injectable> {
    let implementation = candidate.implementation();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| candidate.evaluate_metadata()));
    let result = match outcome {
        Ok(None) => {
            tracing::debug!(candidate = %implementation, "candidate has no injectable metadata");
            return None;
        }
        Ok(Some(result)) => result,
        Err(payload) => Err(DiError::Classification {
            candidate: implementation.display_name(),
            reason: format!("metadata evaluation panicked: {}", panic_message(&*payload)),
        }),
    };

    match result {
        Ok(injectable) => Some(injectable),
        Err(error) => {
            tracing::warn!(candidate = %implementation, %error, "failed to classify candidate");
            None
        }
    }
}
