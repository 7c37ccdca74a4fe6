//! Published signals: block transport from the audio thread to readers
//! on other threads.
//!
//! The audio side stores blocks with a non-blocking `try_send`; a full
//! channel drops the block rather than waiting. Readers poll with
//! [`SignalReader::get`] or drain with [`SignalReader::update`].

use crate::block::Block;
use crate::FRAMES_PER_BLOCK;
use thingbuf::mpsc::{channel, Receiver, Sender};

/// One published block of samples.
#[derive(Clone)]
pub struct SignalBuffer {
    pub data: [f32; FRAMES_PER_BLOCK],
}

impl Default for SignalBuffer {
    fn default() -> Self {
        Self {
            data: [0.0; FRAMES_PER_BLOCK],
        }
    }
}

/// Audio-thread side of a published signal.
pub struct SignalWriter {
    sender: Sender<SignalBuffer>,
    /// Store every Nth block. 1 publishes everything.
    downsample: usize,
    counter: usize,
}

impl SignalWriter {
    /// Store one block. Returns false when the block was dropped,
    /// either by downsampling or because the reader is behind.
    pub fn store(&mut self, block: &Block) -> bool {
        self.counter += 1;
        if self.counter < self.downsample {
            return false;
        }
        self.counter = 0;
        let buffer = SignalBuffer {
            data: *block.frames(),
        };
        self.sender.try_send(buffer).is_ok()
    }
}

/// Reader side of a published signal.
pub struct SignalReader {
    name: String,
    receiver: Receiver<SignalBuffer>,
    latest: Block,
}

impl SignalReader {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The next published block, if one is waiting.
    pub fn get(&mut self) -> Option<Block> {
        if let Ok(buffer) = self.receiver.try_recv() {
            self.latest = Block::from(buffer.data);
            Some(self.latest)
        } else {
            None
        }
    }

    /// Drain the channel, keeping the most recent block.
    pub fn update(&mut self) {
        while self.get().is_some() {}
    }

    /// The most recently received block.
    pub fn latest(&self) -> &Block {
        &self.latest
    }
}

/// Create a published signal with room for `capacity` blocks in flight,
/// storing every `downsample`th block. Returns the (reader, writer)
/// pair; the writer moves to the audio thread.
pub fn publish_signal(name: &str, capacity: usize, downsample: usize) -> (SignalReader, SignalWriter) {
    log::debug!("publishing signal {name:?}, capacity {capacity} blocks");
    let (sender, receiver) = channel(capacity.max(1));
    (
        SignalReader {
            name: name.to_string(),
            receiver,
            latest: Block::default(),
        },
        SignalWriter {
            sender,
            downsample: downsample.max(1),
            counter: 0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_round_trip() {
        let (mut reader, mut writer) = publish_signal("test", 8, 1);
        let b = crate::block::range_open(0.0, 1.0);
        assert!(writer.store(&b));
        assert_eq!(reader.get(), Some(b));
        assert_eq!(reader.get(), None);
    }

    #[test]
    fn downsample_skips_blocks() {
        let (mut reader, mut writer) = publish_signal("test", 16, 4);
        let mut stored = 0;
        for _ in 0..8 {
            if writer.store(&Block::splat(1.0)) {
                stored += 1;
            }
        }
        assert_eq!(stored, 2);
        reader.update();
        assert_eq!(reader.latest(), &Block::splat(1.0));
    }

    #[test]
    fn full_channel_drops_blocks() {
        let (_reader, mut writer) = publish_signal("test", 2, 1);
        let mut stored = 0;
        for _ in 0..10 {
            if writer.store(&Block::splat(0.0)) {
                stored += 1;
            }
        }
        assert!(stored <= 3);
    }
}
