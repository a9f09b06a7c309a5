//! Property-based tests for the core parse, query and render guarantees.

use nvf::{from_str, to_string, Document, ErrorCode, Item};
use proptest::prelude::*;

/// A generated value, rendered to NVF by hand so the parser is tested
/// independently of the renderer.
#[derive(Clone, Debug)]
enum Gen {
    Int(i64),
    Float(f64),
    Str(Vec<u8>),
    Blob(Vec<u8>),
    Array(Vec<Gen>),
    Map(Vec<(String, Gen)>),
}

fn escape(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'"');
    for &b in bytes {
        match b {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\r' => out.extend_from_slice(b"\\r"),
            other => out.push(other),
        }
    }
    out.push(b'"');
}

fn write_gen(value: &Gen, out: &mut Vec<u8>) {
    match value {
        Gen::Int(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Gen::Float(n) => out.extend_from_slice(format!("{n:?}").as_bytes()),
        Gen::Str(s) => escape(s, out),
        Gen::Blob(b) => {
            out.extend_from_slice(b"bx");
            for byte in b {
                out.extend_from_slice(format!("{byte:02X}").as_bytes());
            }
        }
        Gen::Array(items) => {
            out.push(b'[');
            for item in items {
                out.push(b' ');
                write_gen(item, out);
            }
            out.extend_from_slice(b" ]");
        }
        Gen::Map(entries) => {
            out.push(b'{');
            write_entries(entries, out);
            out.extend_from_slice(b" }");
        }
    }
}

fn write_entries(entries: &[(String, Gen)], out: &mut Vec<u8>) {
    for (name, value) in entries {
        out.push(b' ');
        out.extend_from_slice(name.as_bytes());
        out.push(b' ');
        write_gen(value, out);
    }
}

/// Adjacent quoted strings in an array read back as one joined string.
fn joined(items: &[Gen]) -> Vec<Gen> {
    let mut out: Vec<Gen> = Vec::with_capacity(items.len());
    for item in items {
        match (out.last_mut(), item) {
            (Some(Gen::Str(prev)), Gen::Str(next)) => prev.extend_from_slice(next),
            _ => out.push(item.clone()),
        }
    }
    out
}

fn check(item: Item<'_>, expected: &Gen) {
    match (item, expected) {
        (Item::Int(a), Gen::Int(b)) => assert_eq!(a, *b),
        (Item::Float(a), Gen::Float(b)) => assert_eq!(a, *b),
        (Item::String(a), Gen::Str(b)) => assert_eq!(a, &b[..]),
        (Item::Blob(a), Gen::Blob(b)) => assert_eq!(a, &b[..]),
        (Item::Array(a), Gen::Array(b)) => {
            let b = joined(b);
            assert_eq!(a.len(), b.len());
            for (i, g) in b.iter().enumerate() {
                check(a.get(i), g);
            }
            assert_eq!(a.get(b.len()), Item::None);
        }
        (Item::Map(a), Gen::Map(b)) => {
            assert_eq!(a.len(), b.len());
            for (name, g) in b {
                check(a.get(name), g);
            }
        }
        (item, expected) => panic!("{item:?} does not match {expected:?}"),
    }
}

fn scalar() -> impl Strategy<Value = Gen> {
    prop_oneof![
        any::<i64>().prop_map(Gen::Int),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Gen::Float),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Gen::Str),
        prop::collection::vec(any::<u8>(), 1..16).prop_map(Gen::Blob),
    ]
}

fn unique_entries(
    value: impl Strategy<Value = Gen>,
) -> impl Strategy<Value = Vec<(String, Gen)>> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,6}", value, 0..6)
        .prop_map(|m| m.into_iter().collect())
}

/// Maps may hold anything; arrays hold scalars and arrays only.
fn tree() -> impl Strategy<Value = Gen> {
    scalar().prop_recursive(4, 48, 6, |inner| {
        let array_item = inner.clone().prop_filter("no maps in arrays", |g| {
            !matches!(g, Gen::Map(_))
        });
        prop_oneof![
            prop::collection::vec(array_item, 0..6).prop_map(Gen::Array),
            unique_entries(inner).prop_map(Gen::Map),
        ]
    })
}

proptest! {
    #[test]
    fn prop_integers_are_exact(n in any::<i64>()) {
        let doc = from_str(&format!("n {n}")).unwrap();
        prop_assert_eq!(doc.get_int(&["n"]).unwrap(), n);
    }

    #[test]
    fn prop_hex_integers_are_exact(n in 0i64..=i64::MAX) {
        let doc = from_str(&format!("n 0x{n:x} m -0x{n:X}")).unwrap();
        prop_assert_eq!(doc.get_int(&["n"]).unwrap(), n);
        prop_assert_eq!(doc.get_int(&["m"]).unwrap(), -n);
    }

    #[test]
    fn prop_blob_hex_round_trip(bytes in prop::collection::vec(any::<u8>(), 1..64)) {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let doc = from_str(&format!("b bx{hex}")).unwrap();
        let blob = doc.get_blob(&["b"]).unwrap();
        prop_assert_eq!(blob.as_bytes(), &bytes[..]);

        let text = to_string(&doc).unwrap();
        prop_assert_eq!(text, format!("b bx{hex}\n"));
    }

    #[test]
    fn prop_odd_blob_pads_low_nibble(bytes in prop::collection::vec(any::<u8>(), 1..16)) {
        let mut hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        hex.pop();
        let doc = from_str(&format!("b bx{hex}")).unwrap();
        let blob = doc.get_blob(&["b"]).unwrap();
        let last = bytes.len() - 1;
        prop_assert_eq!(&blob[..last], &bytes[..last]);
        prop_assert_eq!(blob[last], bytes[last] & 0xf0);
    }

    #[test]
    fn prop_buffer_overflow_reports_exact_length(
        s in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let mut text = b"s ".to_vec();
        escape(&s, &mut text);
        let mut doc = Document::new();
        doc.parse(&text).unwrap();

        let mut small = vec![0u8; s.len() - 1];
        let err = doc.get_str_into(&["s"], &mut small).unwrap_err();
        prop_assert_eq!(err.code(), ErrorCode::BufferOverflow);
        prop_assert_eq!(err.required_len(), Some(s.len()));

        let mut exact = vec![0u8; s.len()];
        prop_assert_eq!(doc.get_str_into(&["s"], &mut exact).unwrap(), s.len());
        prop_assert_eq!(exact, s);
    }

    #[test]
    fn prop_array_access_past_end_is_none(len in 0usize..10, extra in 0usize..10) {
        let items: Vec<String> = (0..len).map(|i| i.to_string()).collect();
        let doc = from_str(&format!("a [{}]", items.join(" "))).unwrap();
        let array = doc.get_array(&["a"]).unwrap();
        prop_assert_eq!(array.get(len + extra), Item::None);
    }

    #[test]
    fn prop_parse_matches_generated_tree(entries in unique_entries(tree())) {
        let mut text = Vec::new();
        write_entries(&entries, &mut text);
        let mut doc = Document::new();
        doc.parse(&text).unwrap();
        check(Item::Map(doc.root().unwrap()), &Gen::Map(entries));
    }

    #[test]
    fn prop_render_then_parse_round_trip(entries in unique_entries(tree())) {
        let mut text = Vec::new();
        write_entries(&entries, &mut text);
        let mut doc = Document::new();
        doc.parse(&text).unwrap();

        let rendered = nvf::render(&doc, &nvf::RenderOptions::default()).unwrap();
        let mut again = Document::new();
        again.parse(rendered.as_bytes()).unwrap();
        check(Item::Map(again.root().unwrap()), &Gen::Map(entries));
    }
}
