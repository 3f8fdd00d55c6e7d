use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Rolling string hash over the decimal digits of `key`.
///
/// Reproduces the browser behaviour bit for bit: the shift wraps at 32 bits
/// while the running sum does not, and channels are read from the low three
/// bytes of the 32-bit truncation.
fn string_hash(key: i64) -> i32 {
    let mut hash: i64 = 0;
    for byte in key.to_string().bytes() {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        hash = i64::from(byte) + shifted - hash;
    }
    hash as i32
}

pub fn hash_color(key: i64) -> Rgb {
    let hash = string_hash(key);
    let channel = |shift: u32| ((hash >> shift) & 0xff) as u8;
    Rgb::new(channel(0), channel(8), channel(16))
}
