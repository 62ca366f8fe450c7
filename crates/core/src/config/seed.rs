use fnv::FnvHasher;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    convert::TryFrom,
    fmt,
    hash::{Hash, Hasher},
};

/// Seed for the map generator's RNG. A seed can be given as a number, or as
/// arbitrary text which gets hashed into a number when the RNG is built. That
/// lets people share maps with memorable names ("archipelago") instead of
/// opaque integers.
///
/// Deserialization accepts:
/// - any integer that fits in a `u64`
/// - a string holding such an integer, which is parsed
/// - any other string, kept as text
///
/// Seeds always serialize as a string, because JSON and TOML can't represent
/// every `u64` as a number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Seed {
    Int(u64),
    Text(String),
}

impl Seed {
    /// Pick a new seed from OS entropy. The thread RNG is left alone, so
    /// random draws made elsewhere in the host aren't shifted.
    pub fn random() -> Self {
        Self::Int(Pcg64::from_entropy().gen())
    }

    /// The numeric value used to seed the RNG. Text is hashed with FNV, which
    /// is stable across platforms and releases.
    pub fn to_u64(&self) -> u64 {
        match self {
            Self::Int(seed) => *seed,
            Self::Text(text) => {
                let mut hasher = FnvHasher::default();
                text.hash(&mut hasher);
                hasher.finish()
            }
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(seed) => write!(f, "{}", seed),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Self::Int(seed)
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        text.parse::<u64>()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Text(text.into()))
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SeedVisitor)
    }
}

/// Generates an integer visit method that accepts any value convertible into
/// a `u64`
macro_rules! visit_int {
    ($fname:ident, $type:ty) => {
        fn $fname<E: serde::de::Error>(
            self,
            value: $type,
        ) -> Result<Self::Value, E> {
            u64::try_from(value).map(Seed::Int).map_err(|_| {
                E::custom(format!("seed out of range: {}", value))
            })
        }
    };
}

struct SeedVisitor;

impl<'de> Visitor<'de> for SeedVisitor {
    type Value = Seed;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a non-negative integer or a string")
    }

    visit_int!(visit_u8, u8);
    visit_int!(visit_u16, u16);
    visit_int!(visit_u32, u32);
    visit_int!(visit_u64, u64);
    visit_int!(visit_i8, i8);
    visit_int!(visit_i16, i16);
    visit_int!(visit_i32, i32);
    visit_int!(visit_i64, i64);

    fn visit_str<E: serde::de::Error>(
        self,
        value: &str,
    ) -> Result<Self::Value, E> {
        Ok(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{
        assert_de_tokens, assert_de_tokens_error, assert_ser_tokens, Token,
    };

    #[test]
    fn test_random() {
        let seeds: Vec<Seed> = (0..4).map(|_| Seed::random()).collect();
        assert!(seeds.iter().all(|seed| matches!(seed, Seed::Int(_))));
        assert!(seeds.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Seed::from("42"), Seed::Int(42));
        assert_eq!(Seed::from("archipelago"), Seed::Text("archipelago".into()));
        // Negative numbers don't fit, so they're text
        assert_eq!(Seed::from("-5"), Seed::Text("-5".into()));
    }

    #[test]
    fn test_to_u64() {
        assert_eq!(Seed::Int(77).to_u64(), 77);

        // Hashing is stable and distinguishes different text
        let seed = Seed::Text("archipelago".into());
        assert_eq!(seed.to_u64(), seed.clone().to_u64());
        assert_ne!(seed.to_u64(), Seed::Text("pangaea".into()).to_u64());
    }

    #[test]
    fn test_serialize() {
        assert_ser_tokens(&Seed::Int(9000), &[Token::String("9000")]);
        assert_ser_tokens(
            &Seed::Text("pangaea".into()),
            &[Token::String("pangaea")],
        );
    }

    #[test]
    fn test_deserialize() {
        assert_de_tokens(&Seed::Int(9000), &[Token::U64(9000)]);
        assert_de_tokens(&Seed::Int(12), &[Token::I32(12)]);
        assert_de_tokens(&Seed::Int(9000), &[Token::Str("9000")]);
        assert_de_tokens(&Seed::Text("pangaea".into()), &[Token::Str("pangaea")]);

        assert_de_tokens_error::<Seed>(
            &[Token::I64(-3)],
            "seed out of range: -3",
        );
        assert_de_tokens_error::<Seed>(
            &[Token::Bool(true)],
            "invalid type: boolean `true`, \
            expected a non-negative integer or a string",
        );
    }
}
