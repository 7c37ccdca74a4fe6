//! The audio processing context handed to process functions.

use crate::block::Block;
use crate::event::{Event, Voice, Voices};

/// Per-channel input and output blocks, the input event queue, and the
/// voice control signals, bundled for a per-block process function.
///
/// Events added with [`AudioContext::add_input_event`] are stamped
/// relative to the adapter's accumulation window (see
/// [`AudioContext::set_input_event_time_offset`]) and dispatched by
/// [`AudioContext::process_vector`] when the internal timeline reaches
/// them. The adapter clears the queue only after a processing pass has
/// consumed it, so events survive callbacks in which no internal block
/// runs.
pub struct AudioContext {
    pub inputs: Vec<Block>,
    pub outputs: Vec<Block>,
    sample_rate: f32,
    events: Vec<Event>,
    event_time_offset: i32,
    voices: Voices,
}

impl AudioContext {
    pub fn new(n_inputs: usize, n_outputs: usize, sample_rate: f32) -> Self {
        Self {
            inputs: vec![Block::default(); n_inputs],
            outputs: vec![Block::default(); n_outputs],
            sample_rate,
            events: Vec::with_capacity(128),
            event_time_offset: 0,
            voices: Voices::default(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn n_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Set the number of note voices generated from input events.
    pub fn set_input_polyphony(&mut self, polyphony: usize) {
        self.voices.resize(polyphony);
    }

    /// Read access to a voice's control rows.
    pub fn input_voice(&self, i: usize) -> &Voice {
        self.voices.voice(i)
    }

    /// Queue an event. Its host-relative time is rebased by the current
    /// event time offset so it lands at the right spot in the
    /// accumulation window.
    pub fn add_input_event(&mut self, mut e: Event) {
        e.time += self.event_time_offset;
        self.events.push(e);
    }

    pub fn clear_input_events(&mut self) {
        self.events.clear();
    }

    pub fn set_input_event_time_offset(&mut self, offset: i32) {
        self.event_time_offset = offset;
    }

    /// Generate this block's voice control signals, dispatching events
    /// whose times fall in `[start_offset, start_offset + block)`.
    pub fn process_vector(&mut self, start_offset: i32) {
        // equal times keep enqueue order
        self.events.sort_by_key(|e| e.time);
        self.voices.process_events(&self.events, start_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::GATE_ROW;

    #[test]
    fn event_time_offset_rebases_events() {
        let mut ctx = AudioContext::new(0, 2, 48000.0);
        ctx.set_input_polyphony(2);
        ctx.set_input_event_time_offset(32);
        ctx.add_input_event(Event::note_on(60, 60.0, 0.9, 5));
        // time 5 + offset 32 = 37: not in the first block window [0, 64)? it is.
        ctx.process_vector(0);
        let v = ctx.input_voice(0);
        assert_eq!(v.outputs.row(GATE_ROW)[36], 0.0);
        assert_eq!(v.outputs.row(GATE_ROW)[37], 0.9);
    }

    #[test]
    fn events_persist_until_cleared() {
        let mut ctx = AudioContext::new(0, 1, 48000.0);
        ctx.set_input_polyphony(1);
        ctx.add_input_event(Event::note_on(60, 60.0, 0.9, 100));
        ctx.process_vector(0);
        assert!(!ctx.input_voice(0).is_held());
        ctx.process_vector(64);
        assert!(ctx.input_voice(0).is_held());
        ctx.clear_input_events();
        ctx.process_vector(128);
        assert!(ctx.input_voice(0).is_held());
    }
}
