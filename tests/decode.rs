// tests/decode.rs
use bookfeed::book::{Side, Symbol};
use bookfeed::engine::Event;
use bookfeed::parser::{decode_message, encode, DecodeError, Frame, FrameReader, Wire};

fn sym(raw: &[u8; 3]) -> Symbol {
    Symbol::new(*raw)
}

const TAIL_NONE: Wire = Wire { update_tail: 0 };
const TAIL_FOUR: Wire = Wire { update_tail: 4 };

#[test]
fn add_layout_is_pinned_byte_for_byte() {
    // built by hand so the encoder cannot mask a layout drift
    let mut body = vec![b'A'];
    body.extend_from_slice(b"VOD");
    body.extend_from_slice(&42u64.to_le_bytes());
    body.push(b'B');
    body.extend_from_slice(&[0, 0, 0]);
    body.extend_from_slice(&1234u64.to_le_bytes());
    body.extend_from_slice(&(-15i32).to_le_bytes());

    let ev = decode_message(&body, TAIL_NONE).unwrap();
    assert_eq!(
        ev,
        Event::Add {
            symbol: sym(b"VOD"),
            order_id: 42,
            side: Side::Buy,
            size: 1234,
            price: -15,
        }
    );
    assert_eq!(encode::add(sym(b"VOD"), 42, Side::Buy, 1234, -15), body);
}

#[test]
fn delete_and_execute_decode() {
    let ev = decode_message(&encode::delete(sym(b"BP "), 7, Side::Sell), TAIL_NONE).unwrap();
    assert_eq!(
        ev,
        Event::Delete {
            symbol: sym(b"BP "),
            order_id: 7,
            side: Side::Sell,
        }
    );

    let ev = decode_message(&encode::execute(sym(b"BP "), 7, Side::Sell, 99), TAIL_NONE).unwrap();
    assert_eq!(
        ev,
        Event::Execute {
            symbol: sym(b"BP "),
            order_id: 7,
            side: Side::Sell,
            traded: 99,
        }
    );
}

#[test]
fn update_tail_dialects_yield_the_same_event() {
    let padded = encode::update(sym(b"VOD"), 3, Side::Buy, 50, 1005, 4);
    let bare = encode::update(sym(b"VOD"), 3, Side::Buy, 50, 1005, 0);

    let want = Event::Update {
        symbol: sym(b"VOD"),
        order_id: 3,
        side: Side::Buy,
        size: 50,
        price: 1005,
    };

    assert_eq!(decode_message(&padded, TAIL_FOUR).unwrap(), want);
    assert_eq!(decode_message(&bare, TAIL_NONE).unwrap(), want);
    // trailing padding a dialect does not expect is simply left unconsumed
    assert_eq!(decode_message(&padded, TAIL_NONE).unwrap(), want);
}

#[test]
fn update_tail_missing_from_body_is_truncation() {
    let bare = encode::update(sym(b"VOD"), 3, Side::Buy, 50, 1005, 0);
    let err = decode_message(&bare, TAIL_FOUR).unwrap_err();
    assert_eq!(err, DecodeError::Truncated { missing: 4 });
}

#[test]
fn unknown_tag_and_side_are_rejected() {
    let body = encode::add(sym(b"VOD"), 1, Side::Buy, 10, 100);

    let mut bad_tag = body.clone();
    bad_tag[0] = b'X';
    assert_eq!(
        decode_message(&bad_tag, TAIL_NONE).unwrap_err(),
        DecodeError::UnknownTag { tag: b'X' }
    );

    let mut bad_side = body;
    bad_side[12] = b'Q'; // side byte follows tag, symbol and order id
    assert_eq!(
        decode_message(&bad_side, TAIL_NONE).unwrap_err(),
        DecodeError::UnknownSide { side: b'Q' }
    );
}

#[test]
fn short_body_is_truncation() {
    let body = encode::add(sym(b"VOD"), 1, Side::Buy, 10, 100);
    let err = decode_message(&body[..body.len() - 1], TAIL_NONE).unwrap_err();
    assert_eq!(err, DecodeError::Truncated { missing: 1 });
}

#[test]
fn frames_round_the_stream_with_seq_intact() {
    let mut stream = Vec::new();
    stream.extend(encode::frame(10, &encode::add(sym(b"AAA"), 1, Side::Buy, 5, 100)));
    stream.extend(encode::frame(11, &encode::delete(sym(b"AAA"), 1, Side::Buy)));

    let mut frames = FrameReader::new(&stream[..], TAIL_NONE);

    assert_eq!(
        frames.next_frame().unwrap(),
        Some(Frame {
            seq: 10,
            event: Event::Add {
                symbol: sym(b"AAA"),
                order_id: 1,
                side: Side::Buy,
                size: 5,
                price: 100,
            },
        })
    );
    assert_eq!(
        frames.next_frame().unwrap(),
        Some(Frame {
            seq: 11,
            event: Event::Delete {
                symbol: sym(b"AAA"),
                order_id: 1,
                side: Side::Buy,
            },
        })
    );
    assert_eq!(frames.next_frame().unwrap(), None);
    assert_eq!(frames.bytes_read(), stream.len() as u64);
}

#[test]
fn envelope_absorbs_reserved_bytes_beyond_the_fields() {
    let mut body = encode::delete(sym(b"AAA"), 1, Side::Buy);
    body.extend_from_slice(&[0xde, 0xad]); // declared but unspecified trailing bytes

    let stream = encode::frame(1, &body);
    let mut frames = FrameReader::new(&stream[..], TAIL_NONE);

    let frame = frames.next_frame().unwrap().unwrap();
    assert_eq!(frame.seq, 1);
    assert_eq!(frames.next_frame().unwrap(), None);
}

#[test]
fn eof_inside_a_header_is_an_error() {
    let mut stream = encode::frame(1, &encode::delete(sym(b"AAA"), 1, Side::Buy));
    stream.extend_from_slice(&[1, 2, 3]); // three stray bytes of a next header

    let mut frames = FrameReader::new(&stream[..], TAIL_NONE);
    assert!(frames.next_frame().unwrap().is_some());
    assert!(frames.next_frame().is_err());
}

#[test]
fn eof_inside_a_declared_body_is_an_error() {
    let full = encode::frame(1, &encode::add(sym(b"AAA"), 1, Side::Buy, 5, 100));
    let cut = &full[..full.len() - 3];

    let mut frames = FrameReader::new(cut, TAIL_NONE);
    let err = frames.next_frame().unwrap_err();
    assert!(format!("{err:#}").contains("frame 1"));
}

#[test]
fn empty_input_is_a_clean_end() {
    let mut frames = FrameReader::new(&[][..], TAIL_NONE);
    assert_eq!(frames.next_frame().unwrap(), None);
    assert_eq!(frames.bytes_read(), 0);
}

#[test]
fn truncated_body_error_names_the_frame() {
    // frame declares a full add but carries only the tag
    let stream = encode::frame(77, &[b'A']);
    let mut frames = FrameReader::new(&stream[..], TAIL_NONE);

    let err = frames.next_frame().unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("frame 77"), "unexpected chain: {chain}");
    assert!(err.downcast_ref::<DecodeError>().is_some());
}
