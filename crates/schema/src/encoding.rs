//! Byte encodings for scalar and string fields.

use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::error::EncodingError;

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Endian {
	#[default]
	Little,
	Big,
}

/// Layout of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntEncoding {
	pub signed: bool,
	/// Width in bits: 8, 16, 24, 32 or 64.
	pub bits: u8,
	pub endian: Endian,
}

impl IntEncoding {
	pub const SUPPORTED_BITS: [u8; 5] = [8, 16, 24, 32, 64];

	pub const fn unsigned(bits: u8, endian: Endian) -> Self {
		Self {
			signed: false,
			bits,
			endian,
		}
	}

	pub const fn signed(bits: u8, endian: Endian) -> Self {
		Self { signed: true, bits, endian }
	}

	pub fn byte_len(&self) -> usize {
		usize::from(self.bits / 8)
	}

	/// Mask covering every bit of the encoded width.
	pub fn mask(&self) -> u128 {
		(1u128 << self.bits) - 1
	}

	/// Inclusive range of values representable by this encoding.
	pub fn range(&self) -> (i128, i128) {
		if self.signed {
			let half = 1i128 << (self.bits - 1);
			(-half, half - 1)
		} else {
			(0, (1i128 << self.bits) - 1)
		}
	}

	pub fn contains(&self, value: i128) -> bool {
		let (lo, hi) = self.range();
		(lo..=hi).contains(&value)
	}

	/// Decodes `bytes`, which must be exactly [`byte_len`](Self::byte_len) long.
	pub fn read(&self, bytes: &[u8]) -> i128 {
		let mut raw = 0u128;
		match self.endian {
			Endian::Little => {
				for (i, b) in bytes.iter().enumerate() {
					raw |= u128::from(*b) << (8 * i);
				}
			}
			Endian::Big => {
				for b in bytes {
					raw = (raw << 8) | u128::from(*b);
				}
			}
		}
		self.from_bits(raw)
	}

	/// Two's complement bit pattern of `value` at the field width.
	pub fn to_bits(&self, value: i128) -> u128 {
		(value as u128) & self.mask()
	}

	/// Value of the bit pattern `raw`, sign-extended for signed encodings.
	pub fn from_bits(&self, raw: u128) -> i128 {
		let raw = raw & self.mask();
		if self.signed && (raw >> (self.bits - 1)) & 1 == 1 {
			(raw | !self.mask()) as i128
		} else {
			raw as i128
		}
	}

	/// Encodes `value` truncated to the field width.
	pub fn write(&self, value: i128) -> Vec<u8> {
		let raw = self.to_bits(value);
		let len = self.byte_len();
		let mut out = Vec::with_capacity(len);
		for i in 0..len {
			out.push((raw >> (8 * i)) as u8);
		}
		if self.endian == Endian::Big {
			out.reverse();
		}
		out
	}
}

/// Layout of a floating point field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatEncoding {
	/// Width in bits: 32 or 64.
	pub bits: u8,
	pub endian: Endian,
}

impl FloatEncoding {
	pub fn byte_len(&self) -> usize {
		usize::from(self.bits / 8)
	}

	pub fn read(&self, bytes: &[u8]) -> f64 {
		match (self.bits, self.endian) {
			(32, Endian::Little) => f64::from(f32::from_le_bytes(take_array(bytes))),
			(32, Endian::Big) => f64::from(f32::from_be_bytes(take_array(bytes))),
			(_, Endian::Little) => f64::from_le_bytes(take_array(bytes)),
			(_, Endian::Big) => f64::from_be_bytes(take_array(bytes)),
		}
	}

	pub fn write(&self, value: f64) -> Vec<u8> {
		match (self.bits, self.endian) {
			(32, Endian::Little) => (value as f32).to_le_bytes().to_vec(),
			(32, Endian::Big) => (value as f32).to_be_bytes().to_vec(),
			(_, Endian::Little) => value.to_le_bytes().to_vec(),
			(_, Endian::Big) => value.to_be_bytes().to_vec(),
		}
	}

	/// Rounds `value` through the stored precision.
	pub fn quantize(&self, value: f64) -> f64 {
		if self.bits == 32 { f64::from(value as f32) } else { value }
	}
}

fn take_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
	let mut out = [0u8; N];
	let n = bytes.len().min(N);
	out[..n].copy_from_slice(&bytes[..n]);
	out
}

/// Character encoding of a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum StrEncoding {
	Ascii,
	#[strum(serialize = "latin-1")]
	Latin1,
	#[default]
	Utf8,
	Utf16le,
	Utf16be,
}

impl StrEncoding {
	/// Width of one code unit, which is also the width of the NUL terminator.
	pub fn unit_len(&self) -> usize {
		match self {
			StrEncoding::Utf16le | StrEncoding::Utf16be => 2,
			_ => 1,
		}
	}

	pub fn encode(&self, text: &str) -> Result<Vec<u8>, EncodingError> {
		let name: &'static str = self.into();
		match self {
			StrEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
			StrEncoding::Ascii | StrEncoding::Latin1 => {
				let limit = if *self == StrEncoding::Ascii { 0x7f } else { 0xff };
				text.chars()
					.map(|ch| {
						let code = u32::from(ch);
						if code <= limit {
							Ok(code as u8)
						} else {
							Err(EncodingError::Unencodable { ch, encoding: name })
						}
					})
					.collect()
			}
			StrEncoding::Utf16le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
			StrEncoding::Utf16be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
		}
	}

	pub fn decode(&self, bytes: &[u8]) -> Result<String, EncodingError> {
		let name: &'static str = self.into();
		match self {
			StrEncoding::Utf8 => std::str::from_utf8(bytes).map(str::to_string).map_err(|e| EncodingError::Invalid {
				encoding: name,
				offset: e.valid_up_to(),
			}),
			StrEncoding::Ascii => match bytes.iter().position(|b| *b > 0x7f) {
				Some(offset) => Err(EncodingError::Invalid { encoding: name, offset }),
				None => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
			},
			StrEncoding::Latin1 => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
			StrEncoding::Utf16le | StrEncoding::Utf16be => {
				if bytes.len() % 2 != 0 {
					return Err(EncodingError::Invalid {
						encoding: name,
						offset: bytes.len() - 1,
					});
				}
				let units: Vec<u16> = bytes
					.chunks_exact(2)
					.map(|pair| {
						if *self == StrEncoding::Utf16le {
							u16::from_le_bytes([pair[0], pair[1]])
						} else {
							u16::from_be_bytes([pair[0], pair[1]])
						}
					})
					.collect();
				let mut out = String::with_capacity(units.len());
				for (i, decoded) in char::decode_utf16(units).enumerate() {
					match decoded {
						Ok(ch) => out.push(ch),
						Err(_) => return Err(EncodingError::Invalid { encoding: name, offset: i * 2 }),
					}
				}
				Ok(out)
			}
		}
	}
}
