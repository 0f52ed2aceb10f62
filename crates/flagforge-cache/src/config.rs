// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

/// Re-exported under the cache crate's own name since every cache method
/// signature reads more naturally as "a CachedFlagConfig" than "a
/// ResolvedFlagConfig" — same type, shared with `flagforge-store` and
/// `flagforge-sdk` so there is exactly one definition of "what one flag in
/// one environment resolves to".
pub use flagforge_core::ResolvedFlagConfig as CachedFlagConfig;
