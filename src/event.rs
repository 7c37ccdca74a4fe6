//! Input events and the per-voice control signals they generate.
//!
//! Events carry a time in samples relative to the host callback that
//! enqueued them; [`crate::adapter::BlockAdapter`] rebases those times
//! onto the internal block timeline. Within a block, events take effect
//! at their exact sample offset.

use crate::block::BlockArray;
use crate::FRAMES_PER_BLOCK;

/// Row indices of a voice's control output.
pub const GATE_ROW: usize = 0;
pub const PITCH_ROW: usize = 1;
pub const VEL_ROW: usize = 2;

const VOICE_ROWS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    NoteUpdate,
    Controller,
    SustainPedal,
}

/// A timed input event. `source_idx` identifies the note source (for
/// MIDI, the key number); `time` is in samples, host-callback-relative
/// at enqueue time.
#[derive(Clone, Copy, Debug)]
pub struct Event {
    pub kind: EventKind,
    pub channel: i32,
    pub source_idx: i32,
    pub time: i32,
    pub value1: f32,
    pub value2: f32,
}

impl Event {
    pub fn note_on(key: i32, pitch: f32, velocity: f32, time: i32) -> Self {
        Self {
            kind: EventKind::NoteOn,
            channel: 1,
            source_idx: key,
            time,
            value1: pitch,
            value2: velocity,
        }
    }

    pub fn note_off(key: i32, pitch: f32, time: i32) -> Self {
        Self {
            kind: EventKind::NoteOff,
            channel: 1,
            source_idx: key,
            time,
            value1: pitch,
            value2: 0.0,
        }
    }
}

/// One voice's held state and control-rate output rows.
#[derive(Clone, Debug)]
pub struct Voice {
    /// Control signals for the current block, one row per
    /// `GATE_ROW` / `PITCH_ROW` / `VEL_ROW`.
    pub outputs: BlockArray<VOICE_ROWS>,
    key: i32,
    gate: f32,
    pitch: f32,
    velocity: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            outputs: BlockArray::default(),
            key: -1,
            gate: 0.0,
            pitch: 0.0,
            velocity: 0.0,
        }
    }
}

impl Voice {
    /// Fill the output rows with the held state for a new block.
    fn begin_block(&mut self) {
        self.write_from(0);
    }

    /// Write the held state into the output rows from `offset` onward.
    fn write_from(&mut self, offset: usize) {
        for t in offset..FRAMES_PER_BLOCK {
            self.outputs.row_mut(GATE_ROW)[t] = self.gate;
            self.outputs.row_mut(PITCH_ROW)[t] = self.pitch;
            self.outputs.row_mut(VEL_ROW)[t] = self.velocity;
        }
    }

    pub fn is_held(&self) -> bool {
        self.gate > 0.0
    }

    pub fn key(&self) -> i32 {
        self.key
    }
}

/// Allocates note events onto a fixed set of voices and renders their
/// gate / pitch / velocity rows, sample-accurately within each block.
#[derive(Clone, Debug, Default)]
pub struct Voices {
    voices: Vec<Voice>,
    next_voice: usize,
}

impl Voices {
    pub fn new(polyphony: usize) -> Self {
        Self {
            voices: vec![Voice::default(); polyphony],
            next_voice: 0,
        }
    }

    pub fn resize(&mut self, polyphony: usize) {
        self.voices = vec![Voice::default(); polyphony];
        self.next_voice = 0;
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voice(&self, i: usize) -> &Voice {
        &self.voices[i]
    }

    /// Render one block of control signals, applying the events whose
    /// times fall in `[start_offset, start_offset + FRAMES_PER_BLOCK)`.
    /// Events must be ordered by time; equal times keep their order.
    pub fn process_events(&mut self, events: &[Event], start_offset: i32) {
        for v in self.voices.iter_mut() {
            v.begin_block();
        }
        let window_end = start_offset + FRAMES_PER_BLOCK as i32;
        for e in events.iter() {
            if e.time < start_offset || e.time >= window_end {
                continue;
            }
            let offset = (e.time - start_offset) as usize;
            match e.kind {
                EventKind::NoteOn => self.note_on(e, offset),
                EventKind::NoteOff => self.note_off(e, offset),
                // controller routing lives outside the kernel
                _ => {}
            }
        }
    }

    fn note_on(&mut self, e: &Event, offset: usize) {
        let idx = self.find_for_note_on(e.source_idx);
        let v = &mut self.voices[idx];
        v.key = e.source_idx;
        v.gate = e.value2;
        v.pitch = e.value1;
        v.velocity = e.value2;
        v.write_from(offset);
    }

    fn note_off(&mut self, e: &Event, offset: usize) {
        for v in self.voices.iter_mut() {
            if v.key == e.source_idx && v.is_held() {
                v.gate = 0.0;
                v.write_from(offset);
                return;
            }
        }
    }

    fn find_for_note_on(&mut self, key: i32) -> usize {
        // retrigger a held voice playing the same key
        if let Some(i) = self
            .voices
            .iter()
            .position(|v| v.key == key && v.is_held())
        {
            return i;
        }
        // otherwise take a free voice
        if let Some(i) = self.voices.iter().position(|v| !v.is_held()) {
            return i;
        }
        // all voices busy: steal round-robin
        let i = self.next_voice;
        self.next_voice = (self.next_voice + 1) % self.voices.len();
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_is_sample_accurate() {
        let mut voices = Voices::new(2);
        voices.process_events(&[Event::note_on(60, 60.0, 0.8, 5)], 0);
        let v = voices.voice(0);
        assert_eq!(v.outputs.row(GATE_ROW)[4], 0.0);
        assert_eq!(v.outputs.row(GATE_ROW)[5], 0.8);
        assert_eq!(v.outputs.row(PITCH_ROW)[63], 60.0);
    }

    #[test]
    fn note_off_releases_matching_key() {
        let mut voices = Voices::new(2);
        voices.process_events(&[Event::note_on(60, 60.0, 0.8, 0)], 0);
        voices.process_events(&[Event::note_off(61, 61.0, 0)], 64);
        assert!(voices.voice(0).is_held());
        voices.process_events(&[Event::note_off(60, 60.0, 130)], 128);
        let v = voices.voice(0);
        assert_eq!(v.outputs.row(GATE_ROW)[1], 0.8);
        assert_eq!(v.outputs.row(GATE_ROW)[2], 0.0);
        assert!(!v.is_held());
    }

    #[test]
    fn two_notes_use_two_voices() {
        let mut voices = Voices::new(4);
        voices.process_events(
            &[
                Event::note_on(60, 60.0, 0.8, 0),
                Event::note_on(64, 64.0, 0.7, 0),
            ],
            0,
        );
        let keys: Vec<i32> = (0..4).map(|i| voices.voice(i).key()).collect();
        assert!(keys.contains(&60));
        assert!(keys.contains(&64));
    }

    #[test]
    fn events_outside_window_are_ignored() {
        let mut voices = Voices::new(1);
        voices.process_events(&[Event::note_on(60, 60.0, 0.8, 70)], 0);
        assert!(!voices.voice(0).is_held());
        voices.process_events(&[Event::note_on(60, 60.0, 0.8, 70)], 64);
        assert!(voices.voice(0).is_held());
    }
}
