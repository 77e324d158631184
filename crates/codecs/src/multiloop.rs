// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiloop binary frame codec.
//!
//! Frames are length-prefixed: a u16 LE payload length, then a u32 LE
//! message number and a u8 message kind, then the kind-specific body.
//! Strings are u16-LE-length-prefixed UTF-8. Unsupported kinds decode to
//! [`MultiloopBody::Unsupported`] so the pipeline can count and drop them
//! without treating the frame as malformed.

use crate::CodecError;
use byteorder::{LittleEndian, WriteBytesExt};
use nom::bytes::complete::take;
use nom::combinator::{all_consuming, map, map_res};
use nom::multi::length_data;
use nom::number::complete::{le_f32, le_u16, le_u32, le_u8};
use nom::sequence::tuple;
use nom::IResult;

const KIND_ANNOUNCEMENT: u8 = 0x01;
const KIND_COMPLETED_LAP: u8 = 0x02;
const KIND_COMPLETED_SECTION: u8 = 0x03;
const KIND_LINE_CROSSING: u8 = 0x04;
const KIND_FLAG_INFORMATION: u8 = 0x05;
const KIND_RUN_INFORMATION: u8 = 0x06;

#[derive(Debug, Clone, PartialEq)]
pub struct MultiloopMessage {
    pub message_number: u32,
    pub body: MultiloopBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MultiloopBody {
    Announcement(Announcement),
    CompletedLap(CompletedLap),
    CompletedSection(CompletedSection),
    LineCrossing(LineCrossing),
    FlagInformation(FlagInformation),
    RunInformation(RunInformation),
    /// A kind this backend does not consume; counted and dropped upstream.
    Unsupported { kind: u8 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Announcement {
    pub timestamp: String,
    pub priority: u8,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedLap {
    pub number: String,
    pub start_position: u16,
    pub laps_led: u16,
    pub last_lap_pitted: u16,
    pub pit_stop_count: u16,
    pub current_status: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedSection {
    pub number: String,
    pub section_id: String,
    pub elapsed_time_ms: u32,
    pub last_section_time_ms: u32,
    pub last_lap: u16,
}

/// Which loop line a car crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingStatus {
    Track,
    Pit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineCrossing {
    pub number: String,
    pub crossing: CrossingStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagInformation {
    pub green_time_ms: u32,
    pub green_laps: u16,
    pub yellow_time_ms: u32,
    pub yellow_laps: u16,
    pub number_of_yellows: u16,
    pub red_time_ms: u32,
    pub average_race_speed: f32,
    pub lead_changes: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    Race,
    Practice,
    Qualifying,
    SingleCarQualifying,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunInformation {
    pub run_name: String,
    pub run_type: RunType,
}

impl RunType {
    pub fn is_practice_qualifying(&self) -> bool {
        !matches!(self, RunType::Race)
    }
}

/// Parse one complete frame. Trailing bytes after the declared length are
/// left for the caller (frames may be concatenated in a single push).
pub fn parse_frame(input: &[u8]) -> Result<MultiloopMessage, CodecError> {
    match frame(input) {
        Ok((_, message)) => Ok(message),
        Err(_) => Err(CodecError::InvalidFrame { len: input.len() }),
    }
}

fn frame(input: &[u8]) -> IResult<&[u8], MultiloopMessage> {
    let (input, payload) = length_data(le_u16)(input)?;
    let (_, message) = all_consuming(message)(payload)?;
    Ok((input, message))
}

fn message(input: &[u8]) -> IResult<&[u8], MultiloopMessage> {
    let (input, message_number) = le_u32(input)?;
    let (input, kind) = le_u8(input)?;
    let (input, body) = body(kind, input)?;
    Ok((
        input,
        MultiloopMessage {
            message_number,
            body,
        },
    ))
}

fn body(kind: u8, input: &[u8]) -> IResult<&[u8], MultiloopBody> {
    match kind {
        KIND_ANNOUNCEMENT => map(announcement, MultiloopBody::Announcement)(input),
        KIND_COMPLETED_LAP => map(completed_lap, MultiloopBody::CompletedLap)(input),
        KIND_COMPLETED_SECTION => map(completed_section, MultiloopBody::CompletedSection)(input),
        KIND_LINE_CROSSING => map(line_crossing, MultiloopBody::LineCrossing)(input),
        KIND_FLAG_INFORMATION => map(flag_information, MultiloopBody::FlagInformation)(input),
        KIND_RUN_INFORMATION => map(run_information, MultiloopBody::RunInformation)(input),
        _ => {
            // Skip the body entirely; only the kind matters for counting
            let (input, _) = take(input.len())(input)?;
            Ok((input, MultiloopBody::Unsupported { kind }))
        }
    }
}

fn announcement(input: &[u8]) -> IResult<&[u8], Announcement> {
    map(
        tuple((mstring, le_u8, mstring)),
        |(timestamp, priority, text)| Announcement {
            timestamp,
            priority,
            text,
        },
    )(input)
}

fn completed_lap(input: &[u8]) -> IResult<&[u8], CompletedLap> {
    map(
        tuple((mstring, le_u16, le_u16, le_u16, le_u16, mstring)),
        |(number, start_position, laps_led, last_lap_pitted, pit_stop_count, current_status)| {
            CompletedLap {
                number,
                start_position,
                laps_led,
                last_lap_pitted,
                pit_stop_count,
                current_status,
            }
        },
    )(input)
}

fn completed_section(input: &[u8]) -> IResult<&[u8], CompletedSection> {
    map(
        tuple((mstring, mstring, le_u32, le_u32, le_u16)),
        |(number, section_id, elapsed_time_ms, last_section_time_ms, last_lap)| CompletedSection {
            number,
            section_id,
            elapsed_time_ms,
            last_section_time_ms,
            last_lap,
        },
    )(input)
}

fn line_crossing(input: &[u8]) -> IResult<&[u8], LineCrossing> {
    map_res(tuple((mstring, le_u8)), |(number, status)| {
        let crossing = match status {
            0 => CrossingStatus::Track,
            1 => CrossingStatus::Pit,
            other => return Err(CodecError::InvalidFrame { len: other as usize }),
        };
        Ok::<_, CodecError>(LineCrossing { number, crossing })
    })(input)
}

fn flag_information(input: &[u8]) -> IResult<&[u8], FlagInformation> {
    map(
        tuple((le_u32, le_u16, le_u32, le_u16, le_u16, le_u32, le_f32, le_u16)),
        |(
            green_time_ms,
            green_laps,
            yellow_time_ms,
            yellow_laps,
            number_of_yellows,
            red_time_ms,
            average_race_speed,
            lead_changes,
        )| FlagInformation {
            green_time_ms,
            green_laps,
            yellow_time_ms,
            yellow_laps,
            number_of_yellows,
            red_time_ms,
            average_race_speed,
            lead_changes,
        },
    )(input)
}

fn run_information(input: &[u8]) -> IResult<&[u8], RunInformation> {
    map_res(tuple((mstring, le_u8)), |(run_name, kind)| {
        let run_type = match kind {
            0 => RunType::Race,
            1 => RunType::Practice,
            2 => RunType::Qualifying,
            3 => RunType::SingleCarQualifying,
            other => return Err(CodecError::InvalidFrame { len: other as usize }),
        };
        Ok::<_, CodecError>(RunInformation { run_name, run_type })
    })(input)
}

/// A u16-LE-length-prefixed UTF-8 string.
fn mstring(input: &[u8]) -> IResult<&[u8], String> {
    map_res(length_data(le_u16), |bytes: &[u8]| {
        std::str::from_utf8(bytes).map(str::to_string)
    })(input)
}

// ── Frame encoding ──────────────────────────────────────────────────────────
//
// Relays are the production encoders; this side is used by simulation
// tooling and tests.

/// Encode a message into a length-prefixed frame.
pub fn encode_frame(message: &MultiloopMessage) -> Vec<u8> {
    let mut payload = Vec::new();
    // Vec<u8> writes cannot fail
    let _ = payload.write_u32::<LittleEndian>(message.message_number);
    match &message.body {
        MultiloopBody::Announcement(a) => {
            let _ = payload.write_u8(KIND_ANNOUNCEMENT);
            write_mstring(&mut payload, &a.timestamp);
            let _ = payload.write_u8(a.priority);
            write_mstring(&mut payload, &a.text);
        }
        MultiloopBody::CompletedLap(l) => {
            let _ = payload.write_u8(KIND_COMPLETED_LAP);
            write_mstring(&mut payload, &l.number);
            let _ = payload.write_u16::<LittleEndian>(l.start_position);
            let _ = payload.write_u16::<LittleEndian>(l.laps_led);
            let _ = payload.write_u16::<LittleEndian>(l.last_lap_pitted);
            let _ = payload.write_u16::<LittleEndian>(l.pit_stop_count);
            write_mstring(&mut payload, &l.current_status);
        }
        MultiloopBody::CompletedSection(s) => {
            let _ = payload.write_u8(KIND_COMPLETED_SECTION);
            write_mstring(&mut payload, &s.number);
            write_mstring(&mut payload, &s.section_id);
            let _ = payload.write_u32::<LittleEndian>(s.elapsed_time_ms);
            let _ = payload.write_u32::<LittleEndian>(s.last_section_time_ms);
            let _ = payload.write_u16::<LittleEndian>(s.last_lap);
        }
        MultiloopBody::LineCrossing(c) => {
            let _ = payload.write_u8(KIND_LINE_CROSSING);
            write_mstring(&mut payload, &c.number);
            let _ = payload.write_u8(match c.crossing {
                CrossingStatus::Track => 0,
                CrossingStatus::Pit => 1,
            });
        }
        MultiloopBody::FlagInformation(f) => {
            let _ = payload.write_u8(KIND_FLAG_INFORMATION);
            let _ = payload.write_u32::<LittleEndian>(f.green_time_ms);
            let _ = payload.write_u16::<LittleEndian>(f.green_laps);
            let _ = payload.write_u32::<LittleEndian>(f.yellow_time_ms);
            let _ = payload.write_u16::<LittleEndian>(f.yellow_laps);
            let _ = payload.write_u16::<LittleEndian>(f.number_of_yellows);
            let _ = payload.write_u32::<LittleEndian>(f.red_time_ms);
            let _ = payload.write_f32::<LittleEndian>(f.average_race_speed);
            let _ = payload.write_u16::<LittleEndian>(f.lead_changes);
        }
        MultiloopBody::RunInformation(r) => {
            let _ = payload.write_u8(KIND_RUN_INFORMATION);
            write_mstring(&mut payload, &r.run_name);
            let _ = payload.write_u8(match r.run_type {
                RunType::Race => 0,
                RunType::Practice => 1,
                RunType::Qualifying => 2,
                RunType::SingleCarQualifying => 3,
            });
        }
        MultiloopBody::Unsupported { kind } => {
            let _ = payload.write_u8(*kind);
        }
    }

    let mut frame = Vec::with_capacity(payload.len() + 2);
    let _ = frame.write_u16::<LittleEndian>(payload.len() as u16);
    frame.extend_from_slice(&payload);
    frame
}

fn write_mstring(out: &mut Vec<u8>, s: &str) {
    let _ = out.write_u16::<LittleEndian>(s.len() as u16);
    out.extend_from_slice(s.as_bytes());
}

#[cfg(test)]
#[path = "multiloop_tests.rs"]
mod tests;
