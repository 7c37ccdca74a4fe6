//! Bridge between host buffer sizes and the fixed internal block size.

use crate::block::Block;
use crate::context::AudioContext;
use crate::ring::RingBuffer;
use crate::FRAMES_PER_BLOCK;

/// Serves an audio callback of arbitrary frame count from the
/// fixed-size DSP loop, buffering inputs and outputs in sample rings
/// and preserving sample-accurate event timing across callbacks.
///
/// Each callback writes the host input, then runs the process function
/// one block at a time until enough output has accumulated. When the
/// host buffer is smaller than a block, some callbacks run no block at
/// all; queued events are cleared only after a pass has consumed them,
/// and `samples_accumulated` rebases the times of events arriving in
/// the next callback.
pub struct BlockAdapter {
    input_rings: Vec<RingBuffer>,
    output_rings: Vec<RingBuffer>,
    max_frames: usize,
    samples_accumulated: i32,
}

impl BlockAdapter {
    /// Allocate rings for the given channel counts and the largest host
    /// buffer that will be passed to [`BlockAdapter::process`].
    pub fn new(inputs: usize, outputs: usize, max_frames: usize) -> Self {
        let capacity = max_frames + FRAMES_PER_BLOCK;
        log::debug!("block adapter: {inputs} in, {outputs} out, max {max_frames} frames");
        Self {
            input_rings: (0..inputs).map(|_| RingBuffer::with_capacity(capacity)).collect(),
            output_rings: (0..outputs)
                .map(|_| RingBuffer::with_capacity(capacity))
                .collect(),
            max_frames,
            samples_accumulated: 0,
        }
    }

    /// Samples buffered since the last processing pass.
    pub fn samples_accumulated(&self) -> i32 {
        self.samples_accumulated
    }

    /// Serve one host callback of `n_frames` frames. Absent input
    /// channels may be `None`; every declared output channel must be
    /// present and at least `n_frames` long.
    pub fn process<S>(
        &mut self,
        inputs: &[Option<&[f32]>],
        outputs: &mut [&mut [f32]],
        n_frames: usize,
        context: &mut AudioContext,
        mut process_fn: impl FnMut(&mut AudioContext, &mut S),
        state: &mut S,
    ) {
        if self.output_rings.is_empty() || outputs.is_empty() {
            return;
        }
        if n_frames > self.max_frames {
            return;
        }

        for (ring, input) in self.input_rings.iter_mut().zip(inputs) {
            if let Some(src) = input {
                ring.write(&src[..n_frames]);
            }
        }

        self.samples_accumulated += n_frames as i32;

        // run block-size processing until we can serve n_frames of output
        let mut did_process = false;
        let mut start_offset: i32 = 0;
        while self.output_rings[0].read_available() < n_frames {
            for (c, ring) in self.input_rings.iter_mut().enumerate() {
                context.inputs[c] = ring.read_block();
            }

            // generate event and controller signals for this block
            context.process_vector(start_offset);
            start_offset += FRAMES_PER_BLOCK as i32;

            process_fn(context, state);

            for (c, ring) in self.output_rings.iter_mut().enumerate() {
                ring.write_block(&context.outputs[c]);
            }

            did_process = true;
        }

        for (ring, dst) in self.output_rings.iter_mut().zip(outputs.iter_mut()) {
            ring.read(&mut dst[..n_frames]);
        }

        // only clear events after a processing pass has consumed them;
        // when the loop doesn't run, events must survive to the next call
        if did_process {
            context.clear_input_events();
            self.samples_accumulated = (self.samples_accumulated - start_offset).max(0);
        }

        // events added in the next callback land at the correct position
        // in the accumulation window
        context.set_input_event_time_offset(self.samples_accumulated);
    }
}

/// Write a block into a host output slice (for hosts that bypass the
/// adapter when their buffer size already matches the block size).
pub fn store_block(block: &Block, dst: &mut [f32]) {
    dst[..FRAMES_PER_BLOCK].copy_from_slice(block.frames());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_callback(
        adapter: &mut BlockAdapter,
        ctx: &mut AudioContext,
        input: &[f32],
        out_len: usize,
    ) -> Vec<f32> {
        let mut out = vec![0.0f32; out_len];
        let mut outputs = [out.as_mut_slice()];
        adapter.process(
            &[Some(input)],
            &mut outputs,
            input.len(),
            ctx,
            |ctx, _| {
                ctx.outputs[0] = ctx.inputs[0] * 2.0;
            },
            &mut (),
        );
        out
    }

    #[test]
    fn passes_audio_through_process_fn() {
        let mut adapter = BlockAdapter::new(1, 1, 256);
        let mut ctx = AudioContext::new(1, 1, 48000.0);
        let input: Vec<f32> = (0..128).map(|i| i as f32).collect();
        let out = run_callback(&mut adapter, &mut ctx, &input, 128);
        for i in 0..128 {
            assert_eq!(out[i], input[i] * 2.0);
        }
    }

    #[test]
    fn generator_output_is_contiguous_across_odd_buffer_sizes() {
        let mut adapter = BlockAdapter::new(0, 1, 256);
        let mut ctx = AudioContext::new(0, 1, 48000.0);
        let mut counter = 0u32;
        let mut produced = Vec::new();
        for _ in 0..20 {
            let mut out = vec![0.0f32; 24];
            let mut outputs = [out.as_mut_slice()];
            adapter.process(
                &[],
                &mut outputs,
                24,
                &mut ctx,
                |ctx, counter: &mut u32| {
                    let mut b = Block::default();
                    for t in 0..FRAMES_PER_BLOCK {
                        b.frames_mut()[t] = *counter as f32;
                        *counter += 1;
                    }
                    ctx.outputs[0] = b;
                },
                &mut counter,
            );
            produced.extend(out);
        }
        for (i, y) in produced.iter().enumerate() {
            assert_eq!(*y, i as f32);
        }
    }

    #[test]
    fn oversize_callback_is_rejected() {
        let mut adapter = BlockAdapter::new(1, 1, 64);
        let mut ctx = AudioContext::new(1, 1, 48000.0);
        let input = vec![1.0f32; 128];
        let out = run_callback(&mut adapter, &mut ctx, &input, 128);
        assert!(out.iter().all(|x| *x == 0.0));
    }
}
