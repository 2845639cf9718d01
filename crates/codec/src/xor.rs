//! Repeating-key XOR stream adapter.

use binilla_schema::StreamAdapter;

/// XORs the stored bytes with a repeating key.
///
/// XOR is its own inverse, so decode and encode are the same transform. An
/// empty key leaves the bytes untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorAdapter {
	key: Vec<u8>,
}

impl XorAdapter {
	pub fn new(key: impl Into<Vec<u8>>) -> Self {
		Self { key: key.into() }
	}

	fn apply(&self, bytes: &[u8]) -> Vec<u8> {
		if self.key.is_empty() {
			return bytes.to_vec();
		}
		bytes.iter().zip(self.key.iter().cycle()).map(|(b, k)| b ^ k).collect()
	}
}

impl StreamAdapter for XorAdapter {
	fn name(&self) -> &str {
		"xor"
	}

	fn decode(&self, stored: &[u8]) -> Result<Vec<u8>, String> {
		Ok(self.apply(stored))
	}

	fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, String> {
		Ok(self.apply(payload))
	}
}
