// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn whole_line_in_one_chunk() {
    let mut assembler = LineAssembler::new();
    let lines = assembler.push(b"$F,9999,\"00:00:00\",\"13:00:00\",\"00:00:00\",\"Green\"\r\n");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("$F,9999"));
    assert_eq!(assembler.pending(), 0);
}

#[test]
fn partial_record_buffers_until_delimiter() {
    let mut assembler = LineAssembler::new();
    assert!(assembler.push(b"$G,3,\"12").is_empty());
    assert!(assembler.pending() > 0);

    let lines = assembler.push(b"34BE\",14,\"01:12:47.872\"\r\n");
    assert_eq!(lines, ["$G,3,\"1234BE\",14,\"01:12:47.872\""]);
    assert_eq!(assembler.pending(), 0);
}

#[test]
fn multiple_lines_in_one_chunk() {
    let mut assembler = LineAssembler::new();
    let lines = assembler.push(b"$I\r\n$F,45,,,,Green\r\n$J,\"42\",\"00:01:0");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "$I");
    assert_eq!(lines[1], "$F,45,,,,Green");
    assert!(assembler.pending() > 0);
}

#[test]
fn bare_newline_still_frames() {
    let mut assembler = LineAssembler::new();
    let lines = assembler.push(b"$I\n");
    assert_eq!(lines, ["$I"]);
}
