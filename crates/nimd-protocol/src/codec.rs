//! Encoding, decoding, and stream framing for the nimd wire format.
//!
//! A frame looks like this:
//!
//! ```text
//! 0|17|PLAY|1|1 3 5 7 9|
//! │ │  └──────────────── content: KEYWORD|field|field|...|
//! │ └─────────────────── content length in bytes, always two digits
//! └───────────────────── protocol version, always 0
//! ```
//!
//! [`encode`] and [`decode`] work on one complete frame. TCP doesn't
//! preserve write boundaries, so [`FrameBuffer`] sits in front of the
//! decoder and cuts the incoming byte stream back into frames using the
//! length field.

use crate::types::parse_digits;
use crate::{Board, FailCode, Message, MoveRequest, OverReason, PILES, PlayerName, PlayerNum, ProtocolError};

/// The only protocol version this server speaks.
pub const PROTOCOL_VERSION: &str = "0";

/// Largest content length the two-digit header can express.
pub const MAX_CONTENT_LEN: usize = 99;

/// Longest version field [`FrameBuffer`] will wait on before deciding
/// the input is garbage.
const MAX_VERSION_DIGITS: usize = 8;

// ---------------------------------------------------------------------------
// encode
// ---------------------------------------------------------------------------

/// Renders a message as `0|NN|KEYWORD|field|...|`.
///
/// # Errors
/// Returns [`ProtocolError::ContentTooLong`] if the content would need
/// more than two digits of length.
pub fn encode(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let mut content = String::from(msg.keyword());
    for field in msg.fields() {
        content.push('|');
        content.push_str(&field);
    }
    content.push('|');

    if content.len() > MAX_CONTENT_LEN {
        return Err(ProtocolError::ContentTooLong(content.len()));
    }
    Ok(format!("{PROTOCOL_VERSION}|{:02}|{content}", content.len()).into_bytes())
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// Parses one complete frame into a [`Message`].
///
/// The header must carry version `0` and a two-digit length equal to the
/// content's byte length. Every keyword's arity and field syntax is then
/// checked. Nothing is returned but the message or the error.
pub fn decode(data: &[u8]) -> Result<Message, ProtocolError> {
    let (keyword, fields) = split_frame(data)?;
    match keyword {
        "OPEN" => {
            let [name] = expect_fields::<1>(keyword, &fields)?;
            Ok(Message::Open {
                name: PlayerName::new(name)?,
            })
        }
        "WAIT" => {
            let [] = expect_fields::<0>(keyword, &fields)?;
            Ok(Message::Wait)
        }
        "NAME" => {
            let [player, opponent] = expect_fields::<2>(keyword, &fields)?;
            Ok(Message::Name {
                player: player.parse()?,
                opponent: PlayerName::new(opponent)?,
            })
        }
        "PLAY" => {
            let [player, board] = expect_fields::<2>(keyword, &fields)?;
            Ok(Message::Play {
                player: player.parse::<PlayerNum>()?,
                board: board.parse::<Board>()?,
            })
        }
        "MOVE" => {
            let request = move_fields(&fields)?;
            if request.pile as usize >= PILES {
                return Err(ProtocolError::invalid(format!(
                    "pile {} is outside 0..{PILES}",
                    request.pile
                )));
            }
            if request.stones == 0 {
                return Err(ProtocolError::invalid("stone count must be positive"));
            }
            Ok(Message::Move(request))
        }
        "OVER" => {
            let [winner, board, reason] = expect_fields::<3>(keyword, &fields)?;
            Ok(Message::Over {
                winner: winner.parse()?,
                board: board.parse()?,
                reason: reason.parse::<OverReason>()?,
            })
        }
        "FAIL" => {
            let [field] = expect_fields::<1>(keyword, &fields)?;
            Ok(Message::Fail(FailCode::other(field)?))
        }
        other => Err(ProtocolError::invalid(format!("unknown keyword {other:?}"))),
    }
}

/// Parses a frame that must be a `MOVE`, checking syntax only.
///
/// Both fields must be plain digit strings, but their ranges are left to
/// the caller: the match engine answers an out-of-range pile or quantity
/// with its own failure codes instead of treating it as malformed.
pub fn decode_move(data: &[u8]) -> Result<MoveRequest, ProtocolError> {
    let (keyword, fields) = split_frame(data)?;
    if keyword != "MOVE" {
        return Err(ProtocolError::invalid(format!("expected MOVE, got {keyword:?}")));
    }
    move_fields(&fields)
}

fn move_fields(fields: &[&str]) -> Result<MoveRequest, ProtocolError> {
    let [pile, stones] = expect_fields::<2>("MOVE", fields)?;
    let digits = |field: &str, what: &str| {
        parse_digits(field).ok_or_else(|| {
            ProtocolError::invalid(format!("MOVE {what} {field:?} is not a plain number"))
        })
    };
    Ok(MoveRequest {
        pile: digits(pile, "pile")?,
        stones: digits(stones, "stones")?,
    })
}

/// Checks the header and splits the content into keyword and fields.
fn split_frame(data: &[u8]) -> Result<(&str, Vec<&str>), ProtocolError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ProtocolError::invalid("frame is not valid UTF-8"))?;

    let mut parts = text.splitn(3, '|');
    let version = parts.next().unwrap_or_default();
    let length = parts
        .next()
        .ok_or_else(|| ProtocolError::invalid("frame has no length field"))?;
    let content = parts
        .next()
        .ok_or_else(|| ProtocolError::invalid("frame has no content"))?;

    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::invalid(format!(
            "unsupported protocol version {version:?}"
        )));
    }
    if length.len() != 2 {
        return Err(ProtocolError::invalid(format!(
            "length field {length:?} is not two digits"
        )));
    }
    let declared = parse_digits(length).ok_or_else(|| {
        ProtocolError::invalid(format!("length field {length:?} is not two digits"))
    })?;
    if declared as usize != content.len() {
        return Err(ProtocolError::invalid(format!(
            "length field says {declared} but content is {} bytes",
            content.len()
        )));
    }

    // Exactly one trailing pipe terminates the content. Anything before
    // it, including empty fields, is significant.
    let body = content
        .strip_suffix('|')
        .ok_or_else(|| ProtocolError::invalid("content does not end with '|'"))?;
    let mut fields: Vec<&str> = body.split('|').collect();
    let keyword = fields.remove(0);
    Ok((keyword, fields))
}

fn expect_fields<'a, const N: usize>(
    keyword: &str,
    fields: &[&'a str],
) -> Result<[&'a str; N], ProtocolError> {
    <[&str; N]>::try_from(fields).map_err(|_| {
        ProtocolError::invalid(format!(
            "{keyword} takes {N} field(s), got {}",
            fields.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// FrameBuffer
// ---------------------------------------------------------------------------

/// What the bytes at the front of a [`FrameBuffer`] amount to.
#[derive(Debug, PartialEq, Eq)]
enum Header {
    /// Could still become a valid header; wait for more bytes.
    Incomplete,
    /// Can never become a valid header.
    Malformed,
    /// A complete header of `len` bytes announcing `content` bytes.
    Complete { len: usize, content: usize },
}

/// Reassembles frames from a byte stream.
///
/// Feed it whatever a socket read returned with [`extend`](Self::extend)
/// and pull complete frames out with [`next_frame`](Self::next_frame).
/// Line breaks between frames are skipped, so a client that terminates
/// each message with a newline still works.
///
/// When the front of the buffer cannot possibly be a header, everything
/// buffered so far is handed out as a single frame. [`decode`] then
/// rejects it, and the reader never stalls waiting for a header that a
/// confused client will never send. A header whose length promises more
/// than ever arrives is the caller's to resolve with [`flush`](Self::flush).
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns `true` if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Removes and returns everything buffered, complete or not.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    /// Removes and returns the next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let skip = self
            .buf
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.buf.drain(..skip);

        if self.buf.is_empty() {
            return None;
        }

        match parse_header(&self.buf) {
            Header::Incomplete => None,
            Header::Malformed => Some(std::mem::take(&mut self.buf)),
            Header::Complete { len, content } => {
                let total = len + content;
                if self.buf.len() < total {
                    return None;
                }
                Some(self.buf.drain(..total).collect())
            }
        }
    }
}

/// Recognizes `<digits>|<digit><digit>|` at the front of `buf`.
fn parse_header(buf: &[u8]) -> Header {
    let version = buf.iter().take_while(|b| b.is_ascii_digit()).count();
    if version > MAX_VERSION_DIGITS {
        return Header::Malformed;
    }
    if version == buf.len() {
        return Header::Incomplete;
    }
    if version == 0 || buf[version] != b'|' {
        return Header::Malformed;
    }

    let rest = &buf[version + 1..];
    for (i, &b) in rest.iter().take(3).enumerate() {
        let ok = if i < 2 { b.is_ascii_digit() } else { b == b'|' };
        if !ok {
            return Header::Malformed;
        }
    }
    if rest.len() < 3 {
        return Header::Incomplete;
    }

    let content = usize::from(rest[0] - b'0') * 10 + usize::from(rest[1] - b'0');
    Header::Complete {
        len: version + 4,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s).unwrap()
    }

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    fn decode_str(s: &str) -> Result<Message, ProtocolError> {
        decode(s.as_bytes())
    }

    // =====================================================================
    // encode()
    // =====================================================================

    #[test]
    fn test_encode_matches_wire_examples() {
        let cases = [
            (Message::Wait, "0|05|WAIT|"),
            (Message::Open { name: name("Alice") }, "0|11|OPEN|Alice|"),
            (
                Message::Name {
                    player: PlayerNum::One,
                    opponent: name("Bob"),
                },
                "0|11|NAME|1|Bob|",
            ),
            (
                Message::Play {
                    player: PlayerNum::One,
                    board: Board::INITIAL,
                },
                "0|17|PLAY|1|1 3 5 7 9|",
            ),
            (
                Message::Move(MoveRequest { pile: 4, stones: 9 }),
                "0|09|MOVE|4|9|",
            ),
            (
                Message::Over {
                    winner: PlayerNum::Two,
                    board: board("0 0 0 0 0"),
                    reason: OverReason::Normal,
                },
                "0|18|OVER|2|0 0 0 0 0||",
            ),
            (
                Message::Over {
                    winner: PlayerNum::One,
                    board: board("1 3 5 7 0"),
                    reason: OverReason::Forfeit,
                },
                "0|25|OVER|1|1 3 5 7 0|Forfeit|",
            ),
            (Message::Fail(FailCode::Impatient), "0|18|FAIL|31 Impatient|"),
        ];
        for (msg, wire) in cases {
            let encoded = encode(&msg).unwrap();
            assert_eq!(String::from_utf8(encoded).unwrap(), wire, "{msg:?}");
        }
    }

    #[test]
    fn test_encode_rejects_oversized_content() {
        let long = FailCode::other("9".repeat(100)).unwrap();
        let err = encode(&Message::Fail(long)).unwrap_err();
        assert!(matches!(err, ProtocolError::ContentTooLong(106)));
    }

    #[test]
    fn test_encode_longest_name_fits() {
        let msg = Message::Name {
            player: PlayerNum::Two,
            opponent: name(&"x".repeat(72)),
        };
        assert!(encode(&msg).is_ok());
    }

    // =====================================================================
    // decode()
    // =====================================================================

    #[test]
    fn test_round_trip_every_keyword() {
        let messages = [
            Message::Open { name: name("Alice") },
            Message::Wait,
            Message::Name {
                player: PlayerNum::Two,
                opponent: name("Alice"),
            },
            Message::Play {
                player: PlayerNum::Two,
                board: board("1 3 5 7 0"),
            },
            Message::Move(MoveRequest { pile: 0, stones: 1 }),
            Message::Over {
                winner: PlayerNum::One,
                board: board("0 0 0 0 0"),
                reason: OverReason::Normal,
            },
            Message::Over {
                winner: PlayerNum::Two,
                board: board("0 1 0 0 0"),
                reason: OverReason::Forfeit,
            },
            Message::Fail(FailCode::AlreadyPlaying),
            Message::Fail(FailCode::other("40 Something Else").unwrap()),
        ];
        for msg in messages {
            let bytes = encode(&msg).unwrap();
            assert_eq!(decode(&bytes).unwrap(), msg);
        }
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        assert!(decode_str("1|05|WAIT|").is_err(), "version");
        assert!(decode_str("0|5|WAIT|").is_err(), "one-digit length");
        assert!(decode_str("0|06|WAIT|").is_err(), "length mismatch");
        assert!(decode_str("0|0x|WAIT|").is_err(), "non-digit length");
        assert!(decode_str("0|05").is_err(), "no content");
        assert!(decode_str("").is_err(), "empty");
        assert!(decode(&[b'0', b'|', b'0', b'1', b'|', 0xff]).is_err(), "utf-8");
    }

    #[test]
    fn test_decode_requires_trailing_pipe() {
        assert!(decode_str("0|04|WAIT").is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_keyword() {
        assert!(decode_str("0|05|JUMP|").is_err());
    }

    #[test]
    fn test_decode_checks_arity() {
        assert!(decode_str("0|07|WAIT|x|").is_err());
        assert!(decode_str("0|05|OPEN|").is_err());
        assert!(decode_str("0|12|OPEN|Al|ice|").is_err());
        assert!(decode_str("0|09|NAME|1|x|").is_ok());
        assert!(decode_str("0|07|NAME|1|").is_err());
        assert!(decode_str("0|17|OVER|1|0 0 0 0 0|").is_err());
    }

    #[test]
    fn test_decode_open_name_rules() {
        let ok = format!("OPEN|{}|", "a".repeat(72));
        assert!(decode_str(&format!("0|{}|{ok}", ok.len())).is_ok());

        // 73 bytes pushes the content to 79, still under 100.
        let long = format!("OPEN|{}|", "a".repeat(73));
        let err = decode_str(&format!("0|{}|{long}", long.len())).unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_decode_play_board_rules() {
        assert!(decode_str("0|17|PLAY|1|1 3 5 7 9|").is_ok());
        assert!(decode_str("0|18|PLAY|1|1 3 5 7 10|").is_err());
        assert!(decode_str("0|17|PLAY|3|1 3 5 7 9|").is_err());
        assert!(decode_str("0|15|PLAY|1|1 3 5 7|").is_err());
    }

    #[test]
    fn test_decode_move_ranges() {
        assert!(decode_str("0|09|MOVE|4|9|").is_ok());
        assert!(decode_str("0|09|MOVE|5|1|").is_err(), "pile 5");
        assert!(decode_str("0|09|MOVE|0|0|").is_err(), "zero stones");
        assert!(decode_str("0|10|MOVE|-1|1|").is_err(), "sign");
        assert!(decode_str("0|10|MOVE| 1|1|").is_err(), "space");
        assert!(decode_str("0|08|MOVE||1|").is_err(), "empty pile");
    }

    #[test]
    fn test_decode_over_reason() {
        assert!(decode_str("0|18|OVER|1|0 0 0 0 0||").is_ok());
        assert!(decode_str("0|22|OVER|1|0 0 0 0 0|Quit|").is_err());
    }

    #[test]
    fn test_decode_fail_needs_field() {
        assert!(decode_str("0|06|FAIL||").is_err());
        assert_eq!(
            decode_str("0|16|FAIL|10 Invalid|").unwrap(),
            Message::Fail(FailCode::Invalid)
        );
    }

    // =====================================================================
    // decode_move()
    // =====================================================================

    #[test]
    fn test_decode_move_leaves_ranges_to_caller() {
        assert_eq!(
            decode_move(b"0|09|MOVE|7|0|").unwrap(),
            MoveRequest { pile: 7, stones: 0 }
        );
    }

    #[test]
    fn test_decode_move_still_checks_syntax() {
        assert!(decode_move(b"0|11|OPEN|Alice|").is_err(), "wrong keyword");
        assert!(decode_move(b"0|09|MOVE|a|1|").is_err(), "not digits");
        assert!(decode_move(b"0|07|MOVE|1|").is_err(), "arity");
        assert!(decode_move(b"0|19|MOVE|1|99999999999|").is_err(), "overflow");
    }

    // =====================================================================
    // FrameBuffer
    // =====================================================================

    #[test]
    fn test_frame_buffer_splits_coalesced_frames() {
        let mut frames = FrameBuffer::new();
        frames.extend(b"0|05|WAIT|0|11|NAME|1|Bob|");
        assert_eq!(frames.next_frame().unwrap(), b"0|05|WAIT|");
        assert_eq!(frames.next_frame().unwrap(), b"0|11|NAME|1|Bob|");
        assert_eq!(frames.next_frame(), None);
        assert!(frames.is_empty());
    }

    #[test]
    fn test_frame_buffer_waits_for_split_frame() {
        let mut frames = FrameBuffer::new();
        frames.extend(b"0|1");
        assert_eq!(frames.next_frame(), None);
        frames.extend(b"1|OPEN|");
        assert_eq!(frames.next_frame(), None);
        frames.extend(b"Alice|");
        assert_eq!(frames.next_frame().unwrap(), b"0|11|OPEN|Alice|");
    }

    #[test]
    fn test_frame_buffer_flush_hands_out_partial_frame() {
        let mut frames = FrameBuffer::new();
        frames.extend(b"0|20|OPEN|Alice|");
        assert_eq!(frames.next_frame(), None);

        let frame = frames.flush();
        assert_eq!(frame, b"0|20|OPEN|Alice|");
        assert!(decode(&frame).is_err());
        assert!(frames.is_empty());
    }

    #[test]
    fn test_frame_buffer_skips_line_breaks() {
        let mut frames = FrameBuffer::new();
        frames.extend(b"0|09|MOVE|1|2|\r\n0|09|MOVE|2|1|\n");
        assert_eq!(frames.next_frame().unwrap(), b"0|09|MOVE|1|2|");
        assert_eq!(frames.next_frame().unwrap(), b"0|09|MOVE|2|1|");
        assert_eq!(frames.next_frame(), None);
    }

    #[test]
    fn test_frame_buffer_flushes_garbage_whole() {
        let mut frames = FrameBuffer::new();
        frames.extend(b"hello there");
        let frame = frames.next_frame().unwrap();
        assert_eq!(frame, b"hello there");
        assert!(decode(&frame).is_err());
        assert!(frames.is_empty());
    }

    #[test]
    fn test_frame_buffer_flushes_bad_length_field() {
        let mut frames = FrameBuffer::new();
        frames.extend(b"0|x5|WAIT|");
        assert_eq!(frames.next_frame().unwrap(), b"0|x5|WAIT|");
    }

    #[test]
    fn test_parse_header_states() {
        assert_eq!(parse_header(b"0"), Header::Incomplete);
        assert_eq!(parse_header(b"0|0"), Header::Incomplete);
        assert_eq!(parse_header(b"0|05"), Header::Incomplete);
        assert_eq!(
            parse_header(b"0|05|"),
            Header::Complete { len: 5, content: 5 }
        );
        assert_eq!(parse_header(b"|05|"), Header::Malformed);
        assert_eq!(parse_header(b"0|5|"), Header::Malformed);
        assert_eq!(parse_header(b"0|055"), Header::Malformed);
        assert_eq!(parse_header(b"123456789|"), Header::Malformed);
    }
}
