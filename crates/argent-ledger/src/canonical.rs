//! Canonical transaction hashing.
//!
//! A transaction is projected onto a fixed JSON shape and hashed once with
//! SHA-256. The projection keeps a compact field order shared by all kinds:
//!
//! ```text
//! {"h":"","p":<prev>,"a":<tag>,"b":<balance>,"c":{"n":..,"t":..,"o":..},"o":<origin>,"d":<dest>,"e":<exp>}
//! ```
//!
//! `h` is always empty, `c` is always present, empty `p`/`d`/`e` and a zero
//! `b` are left out. Strings are escaped the way Go's `encoding/json` does,
//! so hashes match ledgers written by the Go node.
//!
//! Two historical quirks are part of the format: a Claim is projected with
//! the Send tag (`a = 0`) and gets the first character of its previous hash
//! appended to the final hash; a Trust carries its origin in the `e` slot,
//! so its expiration is not covered by the hash.

use std::io;

use serde::Serialize;

use argent_crypto::ContentHasher;
use argent_types::{Currency, Transaction, TxBody, TxKind};

use crate::error::ValidationError;

#[derive(Serialize)]
struct Projection<'a> {
    h: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    p: &'a str,
    a: u8,
    #[serde(skip_serializing_if = "is_zero")]
    b: u64,
    c: CurrencyProjection<'a>,
    o: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    d: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    e: &'a str,
}

#[derive(Serialize, Default)]
struct CurrencyProjection<'a> {
    n: &'a str,
    t: &'a str,
    o: &'a str,
}

impl<'a> From<&'a Currency> for CurrencyProjection<'a> {
    fn from(c: &'a Currency) -> Self {
        Self {
            n: &c.name,
            t: &c.ticker,
            o: c.owner_str(),
        }
    }
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Escapes `<`, `>`, `&`, U+2028 and U+2029 like Go's encoder.
struct GoEscapes;

impl serde_json::ser::Formatter for GoEscapes {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Deterministic projection and hashing of transactions.
pub struct Canonicalizer;

impl Canonicalizer {
    /// The canonical JSON bytes that are hashed for `tx`.
    pub fn projection(tx: &Transaction) -> Result<Vec<u8>, ValidationError> {
        let prev = tx.previous_hash_str();
        let projection = match &tx.body {
            TxBody::Create {
                balance,
                currency,
                origin,
            } => Projection {
                h: "",
                p: "",
                a: TxKind::Create.tag(),
                b: *balance,
                c: currency.into(),
                o: origin.as_str(),
                d: "",
                e: "",
            },
            TxBody::Send {
                balance,
                currency,
                origin,
                destination,
            } => Projection {
                h: "",
                p: prev,
                a: TxKind::Send.tag(),
                b: *balance,
                c: currency.into(),
                o: origin.as_str(),
                d: destination.as_str(),
                e: "",
            },
            TxBody::Claim {
                origin,
                destination,
            } => Projection {
                h: "",
                p: prev,
                a: TxKind::Send.tag(),
                b: 0,
                c: CurrencyProjection::default(),
                o: origin,
                d: destination.as_str(),
                e: "",
            },
            TxBody::Trust {
                origin,
                destination,
                ..
            } => Projection {
                h: "",
                p: prev,
                a: TxKind::Trust.tag(),
                b: 0,
                c: CurrencyProjection::default(),
                o: origin.as_str(),
                d: destination.as_str(),
                e: origin.as_str(),
            },
        };

        let mut out = Vec::with_capacity(256);
        let mut ser = serde_json::Serializer::with_formatter(&mut out, GoEscapes);
        projection
            .serialize(&mut ser)
            .map_err(|e| ValidationError::Unencodable(e.to_string()))?;
        Ok(out)
    }

    /// Decimal type tag followed by the hex SHA-256 of the projection; a
    /// Claim also gets the first character of its previous hash.
    pub fn hash(tx: &Transaction) -> Result<String, ValidationError> {
        let digest = ContentHasher::hash_hex(&Self::projection(tx)?);
        let mut hash = format!("{}{digest}", tx.kind().tag());
        if tx.kind() == TxKind::Claim {
            let suffix = tx
                .previous_hash_str()
                .chars()
                .next()
                .ok_or(ValidationError::MissingPreviousHash(TxKind::Claim))?;
            hash.push(suffix);
        }
        Ok(hash)
    }

    /// Recompute and store the hash.
    pub fn seal(tx: &mut Transaction) -> Result<(), ValidationError> {
        tx.hash = Self::hash(tx)?;
        Ok(())
    }

    /// Whether the stored hash equals the recomputed one.
    pub fn check(tx: &Transaction) -> Result<(), ValidationError> {
        let expected = Self::hash(tx)?;
        if expected != tx.hash {
            return Err(ValidationError::HashMismatch {
                expected,
                found: tx.hash.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argent_types::{Address, Scheme, Signature};
    use proptest::prelude::*;

    fn text(tx: &Transaction) -> String {
        String::from_utf8(Canonicalizer::projection(tx).unwrap()).unwrap()
    }

    fn send(balance: u64) -> Transaction {
        Transaction::new(
            TxBody::Send {
                balance,
                currency: Currency::native(),
                origin: Address::new("A"),
                destination: Address::new("B"),
            },
            Some("2prev".into()),
        )
    }

    #[test]
    fn native_create_projection() {
        let tx = Transaction::new(
            TxBody::Create {
                balance: 0,
                currency: Currency::native(),
                origin: Address::new("OWNER"),
            },
            None,
        );
        assert_eq!(
            text(&tx),
            r#"{"h":"","a":2,"c":{"n":"Argent","t":"ART","o":""},"o":"OWNER"}"#
        );
        assert!(Canonicalizer::hash(&tx).unwrap().starts_with('2'));
    }

    #[test]
    fn send_projection_keeps_field_order() {
        assert_eq!(
            text(&send(5)),
            r#"{"h":"","p":"2prev","a":0,"b":5,"c":{"n":"Argent","t":"ART","o":""},"o":"A","d":"B"}"#
        );
    }

    #[test]
    fn token_create_projects_owner() {
        let tx = Transaction::new(
            TxBody::Create {
                balance: 100,
                currency: Currency::token("Gold", "GLD", Address::new("MINTER")),
                origin: Address::new("HOLDER"),
            },
            None,
        );
        assert_eq!(
            text(&tx),
            r#"{"h":"","a":2,"b":100,"c":{"n":"Gold","t":"GLD","o":"MINTER"},"o":"HOLDER"}"#
        );
    }

    #[test]
    fn claim_uses_send_tag_and_previous_suffix() {
        let tx = Transaction::new(
            TxBody::Claim {
                origin: "0abc".into(),
                destination: Address::new("ME"),
            },
            Some("3xyz".into()),
        );
        assert_eq!(
            text(&tx),
            r#"{"h":"","p":"3xyz","a":0,"c":{"n":"","t":"","o":""},"o":"0abc","d":"ME"}"#
        );
        let hash = Canonicalizer::hash(&tx).unwrap();
        assert!(hash.starts_with('1'));
        assert!(hash.ends_with('3'));
        assert_eq!(hash.len(), 1 + 64 + 1);
    }

    #[test]
    fn claim_without_previous_cannot_hash() {
        let tx = Transaction::new(
            TxBody::Claim {
                origin: "0abc".into(),
                destination: Address::new("ME"),
            },
            None,
        );
        assert_eq!(
            Canonicalizer::hash(&tx),
            Err(ValidationError::MissingPreviousHash(TxKind::Claim))
        );
    }

    #[test]
    fn trust_hash_ignores_expiration() {
        let trust = |expiration: &str| {
            Transaction::new(
                TxBody::Trust {
                    origin: Address::new("A"),
                    destination: Address::new("B"),
                    expiration: expiration.into(),
                },
                Some("2prev".into()),
            )
        };
        assert_eq!(
            text(&trust("0")),
            r#"{"h":"","p":"2prev","a":3,"c":{"n":"","t":"","o":""},"o":"A","d":"B","e":"A"}"#
        );
        assert_eq!(
            Canonicalizer::hash(&trust("0")).unwrap(),
            Canonicalizer::hash(&trust("1700000000000000000")).unwrap()
        );
    }

    #[test]
    fn html_characters_are_escaped_like_go() {
        let tx = Transaction::new(
            TxBody::Create {
                balance: 1,
                currency: Currency::token("<A&B>", "AB", Address::new("M")),
                origin: Address::new("H"),
            },
            None,
        );
        assert!(text(&tx).contains(r#""n":"\u003cA\u0026B\u003e""#));
    }

    #[test]
    fn hash_and_signature_are_not_projected() {
        let base = send(5);
        let mut decorated = base.clone();
        decorated.hash = "0something".into();
        decorated.signature = Some(Signature::new(Scheme::Ec, "c2ln"));
        assert_eq!(
            Canonicalizer::hash(&base).unwrap(),
            Canonicalizer::hash(&decorated).unwrap()
        );
    }

    #[test]
    fn seal_then_check() {
        let mut tx = send(9);
        Canonicalizer::seal(&mut tx).unwrap();
        assert!(Canonicalizer::check(&tx).is_ok());
        tx.body = send(10).body;
        assert!(matches!(
            Canonicalizer::check(&tx),
            Err(ValidationError::HashMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn projected_fields_change_the_hash(
            balance in any::<u64>(),
            other in any::<u64>(),
            dest in "[2-9A-Z]{1,12}",
        ) {
            prop_assume!(balance != other);
            let a = send(balance);
            let b = send(other);
            prop_assert_eq!(Canonicalizer::hash(&a).unwrap(), Canonicalizer::hash(&a.clone()).unwrap());
            prop_assert_ne!(Canonicalizer::hash(&a).unwrap(), Canonicalizer::hash(&b).unwrap());

            let mut moved = a.clone();
            if let TxBody::Send { destination, .. } = &mut moved.body {
                *destination = Address::new(format!("X{dest}"));
            }
            prop_assert_ne!(Canonicalizer::hash(&a).unwrap(), Canonicalizer::hash(&moved).unwrap());
        }
    }
}
