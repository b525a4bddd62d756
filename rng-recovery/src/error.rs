// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Failure modes of the recovery core.
///
/// An unrecognized engine string is a caller-layer concern and
/// deliberately has no variant here: the core's [`crate::Engine`] is a
/// closed two-variant enum with no string parsing inside it, so there is
/// nothing for the core itself to reject.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("need at least {need} observations to recover state, got {got}")]
    InsufficientObservations { need: usize, got: usize },

    #[error("observation {index} is not a valid Math.random() output: {value}")]
    MalformedDouble { index: usize, value: f64 },
}
