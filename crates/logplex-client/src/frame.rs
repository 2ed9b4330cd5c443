// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logplex framing.
//!
//! Each record is an octet-counted syslog message:
//!
//! ```text
//! <len> <134>1 <timestamp> <host> <token> <proc_id> - - <log>
//! ```
//!
//! `<len>` counts the bytes following the first space. Frames are written
//! back to back with no separator. The payload bytes are not cleaned of
//! anything syslog would disallow: the length prefix keeps the stream
//! self-delimiting, and a client only ever speaks for one token.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Priority and version that open every frame (facility local0, severity info).
pub const SYSLOG_PRI_VERSION: &str = "<134>1";

/// Append one frame to `out` and return the number of bytes written.
pub fn write_frame<Tz: TimeZone>(
    out: &mut Vec<u8>,
    when: &DateTime<Tz>,
    host: &str,
    token: &str,
    proc_id: &str,
    log: &[u8],
) -> usize {
    let ts = when
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let syslog_prefix = format!("{SYSLOG_PRI_VERSION} {ts} {host} {token} {proc_id} - - ");
    let msg_len = syslog_prefix.len() + log.len();
    let header = format!("{msg_len} {syslog_prefix}");

    let before = out.len();
    out.reserve(header.len() + log.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(log);
    out.len() - before
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    /// Split a concatenated frame stream back into message bodies.
    pub(crate) fn split_frames(mut stream: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while !stream.is_empty() {
            let space = stream
                .iter()
                .position(|b| *b == b' ')
                .expect("frame without length prefix");
            let len: usize = std::str::from_utf8(&stream[..space])
                .unwrap()
                .parse()
                .unwrap();
            let body_start = space + 1;
            frames.push(stream[body_start..body_start + len].to_vec());
            stream = &stream[body_start + len..];
        }
        frames
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 5, 7, 12, 30, 1).unwrap()
    }

    #[test]
    fn test_write_frame_layout() {
        let mut out = Vec::new();
        let written = write_frame(&mut out, &fixed_time(), "H", "t.123", "P", b"hello");

        let body = "<134>1 2013-05-07T12:30:01Z H t.123 P - - hello";
        let expected = format!("{} {}", body.len(), body);
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(written, expected.len());
    }

    #[test]
    fn test_write_frame_converts_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2013, 5, 7, 14, 30, 1).unwrap();

        let mut out = Vec::new();
        write_frame(&mut out, &local, "H", "t", "P", b"x");

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(" 2013-05-07T12:30:01Z "), "{text}");
    }

    #[test]
    fn test_write_frame_appends() {
        let mut out = Vec::new();
        write_frame(&mut out, &fixed_time(), "H", "t", "P", b"one");
        write_frame(&mut out, &fixed_time(), "H", "t", "P", b"two");

        let frames = split_frames(&out);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with(b"- - one"));
        assert!(frames[1].ends_with(b"- - two"));
    }

    proptest! {
        #[test]
        fn frame_lengths_sum_to_buffer_length(
            logs in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..300), 0..20),
            host in "[a-z0-9.]{1,20}",
        ) {
            let mut out = Vec::new();
            let mut total = 0;
            for log in &logs {
                total += write_frame(&mut out, &fixed_time(), &host, "token", "web.1", log);
            }
            prop_assert_eq!(total, out.len());

            let frames = split_frames(&out);
            prop_assert_eq!(frames.len(), logs.len());
            for (frame, log) in frames.iter().zip(&logs) {
                prop_assert!(frame.ends_with(log));
            }
        }
    }
}
