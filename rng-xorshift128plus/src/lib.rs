// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bit-exact model of the Xorshift128+ PRNG as used by `Math.random()` in
//! V8 (Chromium/Node.js) and SpiderMonkey (Firefox).
//!
//! Both engines share the same 128-bit state and the same forward state
//! transition; they differ only in how a transition's state is turned into
//! an observable `f64`. [`JsRng`] models that as a tagged enum rather than
//! a trait object, since the set of engines is closed and dispatch by
//! `match` avoids a vtable indirection on the hot `math_random` path.

const MASK64: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// The 128-bit Xorshift128+ state, split into its two 64-bit halves.
///
/// At least one half must be non-zero: the all-zero state is a fixed
/// point of the transition and must never be used as a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorshiftState {
    pub s0: u64,
    pub s1: u64,
}

impl XorshiftState {
    /// Construct a state from its two halves.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if both halves are zero.
    pub fn new(s0: u64, s1: u64) -> Self {
        debug_assert!(s0 != 0 || s1 != 0, "XorshiftState: at least one half must be non-zero");
        Self { s0, s1 }
    }

    /// Advance the state by one step.
    ///
    /// `x = s0 ^ (s0 << 23)`; the new `s1` is `x ^ s1 ^ (x >> 17) ^ (s1 >>
    /// 26)` and the new `s0` is the old `s1`.
    #[inline]
    pub fn next_state(&mut self) {
        let x = self.s0 ^ ((self.s0 << 23) & MASK64);
        let new_s1 = x ^ self.s1 ^ (x >> 17) ^ (self.s1 >> 26);
        self.s0 = self.s1;
        self.s1 = new_s1;
    }

    /// Undo one `next_state` step.
    ///
    /// The algebraic inverse of the shift-xor chain: unshift the `>>17`
    /// entanglement with a doubling chain (`>>17`, `>>34`), then unshift
    /// the `<<23` entanglement the same way (`<<23`, `<<46`).
    #[inline]
    pub fn prev_state(&mut self) {
        let mut z = self.s1 ^ self.s0 ^ (self.s0 >> 26);
        z ^= z >> 17;
        z ^= z >> 34;
        z ^= (z << 23) & MASK64;
        z ^= (z << 46) & MASK64;
        let new_s1 = self.s0;
        self.s0 = z;
        self.s1 = new_s1;
    }
}

/// A `Math.random()` generator, tagged by the engine whose exact
/// bit-level behavior it reproduces.
#[derive(Debug, Clone)]
pub enum JsRng {
    /// V8's `Math.random()`: draws are served from a 64-entry LIFO cache
    /// that is refilled, 64 states at a time, whenever it runs dry.
    V8 { state: XorshiftState, cache: Vec<f64> },
    /// SpiderMonkey's `Math.random()`: each call advances the state once
    /// and derives its output directly from the new state.
    SpiderMonkey { state: XorshiftState },
}

impl JsRng {
    /// A fresh V8-flavored generator with an empty cache.
    pub fn new_v8(s0: u64, s1: u64) -> Self {
        JsRng::V8 { state: XorshiftState::new(s0, s1), cache: Vec::with_capacity(64) }
    }

    /// A fresh SpiderMonkey-flavored generator.
    pub fn new_spidermonkey(s0: u64, s1: u64) -> Self {
        JsRng::SpiderMonkey { state: XorshiftState::new(s0, s1) }
    }

    /// The next `Math.random()` output, in `[0, 1)`.
    pub fn math_random(&mut self) -> f64 {
        match self {
            JsRng::V8 { state, cache } => {
                if cache.is_empty() {
                    for _ in 0..64 {
                        let mantissa_bits = (state.s0 >> 12) | 0x3FF0000000000000;
                        cache.push(f64::from_bits(mantissa_bits) - 1.0);
                        state.next_state();
                    }
                }
                cache.pop().expect("cache was just refilled")
            }
            JsRng::SpiderMonkey { state } => {
                state.next_state();
                let rand = state.s0.wrapping_add(state.s1) & ((1u64 << 53) - 1);
                if rand == 0 {
                    return 0.0;
                }
                let bit_length = 64 - rand.leading_zeros() as u64;
                let mantissa = (rand - (1u64 << (bit_length - 1))) << (53 - bit_length);
                let exponent = 969 + bit_length;
                f64::from_bits(mantissa | (exponent << 52))
            }
        }
    }

    /// Advance the underlying state by one step. Never touches the V8
    /// cache: recovery's cache-alignment routine relies on this.
    pub fn next_state(&mut self) {
        self.state_mut().next_state();
    }

    /// Undo one `next_state` step. Never touches the V8 cache.
    pub fn prev_state(&mut self) {
        self.state_mut().prev_state();
    }

    /// The current `(s0, s1)` halves of the state.
    pub fn state(&self) -> (u64, u64) {
        let s = self.state_ref();
        (s.s0, s.s1)
    }

    /// The V8 output cache, in pop order (last element is the next
    /// `math_random()` result). Always empty for SpiderMonkey.
    pub fn cache(&self) -> &[f64] {
        match self {
            JsRng::V8 { cache, .. } => cache,
            JsRng::SpiderMonkey { .. } => &[],
        }
    }

    /// Drop all cached outputs, forcing the next V8 `math_random()` call
    /// to refill from the current state. No-op for SpiderMonkey.
    pub fn clear_cache(&mut self) {
        if let JsRng::V8 { cache, .. } = self {
            cache.clear();
        }
    }

    fn state_ref(&self) -> &XorshiftState {
        match self {
            JsRng::V8 { state, .. } => state,
            JsRng::SpiderMonkey { state } => state,
        }
    }

    fn state_mut(&mut self) -> &mut XorshiftState {
        match self {
            JsRng::V8 { state, .. } => state,
            JsRng::SpiderMonkey { state } => state,
        }
    }
}
