//! Script data values.
//!
//! `ScriptData` is the single value representation crossing the script ABI:
//! redeemers, datums, script contexts and script return values are all
//! expressed as this recursive tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value passed to or produced by an on-chain script.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptData {
    Int(i128),
    Bytes(Vec<u8>),
    List(Vec<ScriptData>),
    /// Association list; key order is preserved
    Map(Vec<(ScriptData, ScriptData)>),
    /// Tagged constructor, the encoding of sum types
    Constr { tag: u64, fields: Vec<ScriptData> },
}

impl ScriptData {
    /// Unit value, the conventional "no interesting payload" constructor
    pub fn unit() -> Self {
        ScriptData::Constr {
            tag: 0,
            fields: Vec::new(),
        }
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ScriptData::Bytes(bytes.into())
    }

    pub fn constr(tag: u64, fields: Vec<ScriptData>) -> Self {
        ScriptData::Constr { tag, fields }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            ScriptData::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ScriptData::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Debug for ScriptData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptData::Int(v) => write!(f, "{}", v),
            ScriptData::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            ScriptData::List(items) => f.debug_list().entries(items).finish(),
            ScriptData::Map(pairs) => {
                f.debug_map().entries(pairs.iter().map(|(k, v)| (k, v))).finish()
            }
            ScriptData::Constr { tag, fields } => {
                write!(f, "Constr({}, {:?})", tag, fields)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_is_empty_constr_zero() {
        match ScriptData::unit() {
            ScriptData::Constr { tag: 0, fields } => assert!(fields.is_empty()),
            other => panic!("unexpected unit encoding: {:?}", other),
        }
    }

    #[test]
    fn serde_roundtrip_nested() {
        let value = ScriptData::constr(
            1,
            vec![
                ScriptData::Int(-42),
                ScriptData::bytes(vec![0xde, 0xad]),
                ScriptData::List(vec![ScriptData::unit()]),
                ScriptData::Map(vec![(ScriptData::Int(1), ScriptData::Int(2))]),
            ],
        );
        let json = serde_json::to_string(&value).unwrap();
        let back: ScriptData = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn accessors() {
        assert_eq!(ScriptData::Int(7).as_int(), Some(7));
        assert_eq!(ScriptData::unit().as_int(), None);
        assert_eq!(ScriptData::bytes(vec![1]).as_bytes(), Some(&[1u8][..]));
    }
}
