// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recovers Xorshift128+ internal state from a sequence of observed
//! `Math.random()` outputs, for both V8 and SpiderMonkey.
//!
//! `Math.random()` extracts a fixed slice of bits from the PRNG state on
//! every call, and that extraction is linear over GF(2). Observing enough
//! outputs turns "what is the state?" into a solvable linear system;
//! [`recover_rng`] solves it and verifies every candidate by replaying it
//! against the real observations before handing it back.

mod error;
mod matrix;
mod observe;
mod recover;

pub use error::RecoveryError;
pub use matrix::Engine;
pub use observe::{extract_spidermonkey, extract_v8};
pub use recover::{recover_rng, CandidateIter};
