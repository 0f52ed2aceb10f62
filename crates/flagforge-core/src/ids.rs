// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
	($name:ident) => {
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(pub Uuid);

		impl $name {
			pub fn new() -> Self {
				Self(Uuid::new_v4())
			}
		}

		impl Default for $name {
			fn default() -> Self {
				Self::new()
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ok(Self(Uuid::parse_str(s)?))
			}
		}
	};
}

uuid_id!(EnvironmentId);
uuid_id!(FlagId);
uuid_id!(FlagConfigId);
uuid_id!(RuleId);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrips_through_string() {
		let id = FlagId::new();
		let parsed: FlagId = id.to_string().parse().unwrap();
		assert_eq!(id, parsed);
	}

	#[test]
	fn ids_are_unique() {
		assert_ne!(FlagId::new(), FlagId::new());
	}
}
