//! Property tests over generated value trees.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::rc::Rc;

use msgpack_stream::{DecodedValue, Error, Float, Integer, Mode, Operation, Unpacker, Value};
use proptest::collection::vec;
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<u64>().prop_map(|u| Value::Integer(Integer::Unsigned(u))),
        any::<i64>().prop_map(|i| Value::Integer(Integer::Signed(i))),
        any::<f32>().prop_map(|f| Value::Float(Float::F32(f))),
        any::<f64>().prop_map(|f| Value::Float(Float::F64(f))),
        vec(any::<u8>(), 0..40).prop_map(Value::Raw),
        "[a-z]{0,40}".prop_map(|s| Value::from(s.as_str())),
        (any::<i8>(), vec(any::<u8>(), 0..20))
            .prop_map(|(type_tag, payload)| Value::Extension { type_tag, payload }),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..8).prop_map(Value::Array),
            vec((inner.clone(), inner), 0..6).prop_map(Value::Map),
        ]
    })
}

fn token_count(value: &Value) -> u64 {
    match value {
        Value::Array(items) => 1 + items.iter().map(token_count).sum::<u64>(),
        Value::Map(pairs) => {
            1 + pairs
                .iter()
                .map(|(k, v)| token_count(k) + token_count(v))
                .sum::<u64>()
        }
        _ => 1,
    }
}

fn tokens_of<R: Read>(mut unpacker: Unpacker<R>) -> Vec<DecodedValue> {
    let tokens = unpacker.items().unwrap().collect::<Result<_, _>>();
    tokens.unwrap()
}

struct Trickle(VecDeque<u8>);

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match (self.0.pop_front(), buf.first_mut()) {
            (Some(b), Some(slot)) => {
                *slot = b;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[derive(Clone, Default)]
struct Growing(Rc<RefCell<VecDeque<u8>>>);

impl Read for Growing {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut queue = self.0.borrow_mut();
        let n = buf.len().min(queue.len());
        for (slot, b) in buf.iter_mut().zip(queue.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in tree()) {
        let bytes = value.encode().unwrap();
        prop_assert_eq!(Value::decode(&bytes).unwrap(), value);
    }

    #[test]
    fn skip_consumes_exactly_one_value(value in tree()) {
        let mut bytes = value.encode().unwrap();
        let len = bytes.len() as u64;
        bytes.push(0x07);
        let mut unpacker = Unpacker::from_slice(&bytes);
        let summary = unpacker.skip().unwrap().unwrap();
        prop_assert_eq!(summary.bytes, len);
        prop_assert_eq!(summary.items, token_count(&value));
        prop_assert!(unpacker.read().unwrap());
        prop_assert_eq!(unpacker.data().and_then(DecodedValue::as_i64), Some(7));
    }

    #[test]
    fn enumeration_yields_one_token_per_node(value in tree()) {
        let bytes = value.encode().unwrap();
        let tokens = tokens_of(Unpacker::from_slice(&bytes));
        prop_assert_eq!(tokens.len() as u64, token_count(&value));
        prop_assert_eq!(&tokens[0], &value.head());
    }

    #[test]
    fn chunking_does_not_change_tokens(value in tree()) {
        let bytes = value.encode().unwrap();
        let whole = tokens_of(Unpacker::from_slice(&bytes));
        let trickled = tokens_of(Unpacker::new(Trickle(bytes.iter().copied().collect())));
        prop_assert_eq!(whole, trickled);
    }

    #[test]
    fn every_proper_prefix_is_insufficient(value in tree(), cut in any::<prop::sample::Index>()) {
        let bytes = value.encode().unwrap();
        let at = cut.index(bytes.len());
        let result = Value::decode(&bytes[..at]);
        if at == 0 {
            prop_assert!(matches!(result, Err(Error::UnexpectedEndOfStream)));
        } else {
            let insufficient = matches!(result, Err(Error::InsufficientData { .. }));
            prop_assert!(insufficient);
        }
    }

    #[test]
    fn suspended_reads_resume_after_more_input(
        value in tree(),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = value.encode().unwrap();
        let at = cut.index(bytes.len());
        let stream = Growing::default();
        stream.0.borrow_mut().extend(&bytes[..at]);
        let mut unpacker = Unpacker::new(stream.clone());

        let mut tokens = Vec::new();
        while unpacker.read().unwrap() {
            tokens.extend(unpacker.data().cloned());
        }
        if at > 0 {
            prop_assert_eq!(unpacker.mode(), Mode::Suspended(Operation::Read));
        }
        stream.0.borrow_mut().extend(&bytes[at..]);
        while unpacker.read().unwrap() {
            tokens.extend(unpacker.data().cloned());
        }
        prop_assert_eq!(unpacker.mode(), Mode::Ready);
        prop_assert_eq!(tokens, tokens_of(Unpacker::from_slice(&bytes)));
    }

    #[test]
    fn suspended_skip_resumes_after_more_input(
        value in tree(),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = value.encode().unwrap();
        let at = cut.index(bytes.len());
        let stream = Growing::default();
        stream.0.borrow_mut().extend(&bytes[..at]);
        let mut unpacker = Unpacker::new(stream.clone());

        let first = unpacker.skip().unwrap();
        prop_assert!(first.is_none());
        if at > 0 {
            prop_assert_eq!(unpacker.mode(), Mode::Suspended(Operation::Skip));
        }
        stream.0.borrow_mut().extend(&bytes[at..]);
        let summary = unpacker.skip().unwrap().unwrap();
        prop_assert_eq!(summary.bytes, bytes.len() as u64);
        prop_assert_eq!(summary.items, token_count(&value));
        prop_assert_eq!(unpacker.skip().unwrap(), None);
    }
}
