//! Serde helpers for 0x-prefixed hex fields

macro_rules! fixed_hex_mod {
    ($name:ident, $len:expr) => {
        pub mod $name {
            use serde::{self, Deserialize, Deserializer, Serializer};

            pub fn serialize<S>(bytes: &[u8; $len], serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
            }

            pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; $len], D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                let s = s.strip_prefix("0x").unwrap_or(&s);
                let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
                bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom(concat!("expected ", $len, " bytes")))
            }
        }
    };
}

fixed_hex_mod!(bytes20, 20);
fixed_hex_mod!(bytes32, 32);

pub mod bytes {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

pub mod bytes_vec {
    use serde::ser::SerializeSeq;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(items: &Vec<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&format!("0x{}", hex::encode(item)))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|s| {
                let s = s.strip_prefix("0x").unwrap_or(&s).to_string();
                hex::decode(&s).map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
