use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::decoder::Decoder;
use crate::pipeline::PipelineState;
use crate::source::Source;
use crate::transform::{InputMode, Transform};

/// Why the producer loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProducerExit {
    /// A regular file, block device or stdin reached its end.
    Exhausted,
    OpenFailed,
    /// The source is a directory or otherwise unusable.
    Unreadable,
    Shutdown,
}

/// Reads the input stream and feeds every channel's ring buffer.
pub struct Producer {
    source: Source,
    decoder: Decoder,
    input: InputMode,
    state: Arc<PipelineState>,
}

impl Producer {
    pub fn new(source: Source, decoder: Decoder, input: InputMode, state: Arc<PipelineState>) -> Self {
        Self {
            source,
            decoder,
            input,
            state,
        }
    }

    pub fn spawn(self) -> io::Result<JoinHandle<ProducerExit>> {
        thread::Builder::new()
            .name("trend-producer".to_string())
            .spawn(move || self.run())
    }

    pub fn run(self) -> ProducerExit {
        let mut transforms: Vec<Transform> = self
            .state
            .channels()
            .iter()
            .map(|_| Transform::new(self.input))
            .collect();

        loop {
            if self.state.is_shutdown() {
                return ProducerExit::Shutdown;
            }

            let opened = match self.source.open() {
                Ok(opened) => opened,
                Err(err) => {
                    warn!("cannot open {}: {err}", self.source);
                    return ProducerExit::OpenFailed;
                }
            };
            if !opened.kind.readable() {
                warn!("{} is not a readable stream", self.source);
                return ProducerExit::Unreadable;
            }
            info!("reading {} ({:?})", self.source, opened.kind);

            let mut reader = BufReader::new(opened.reader);
            let ticks = self.pump(&mut reader, &mut transforms);
            debug!("end of stream on {} after {ticks} ticks", self.source);

            if self.state.is_shutdown() {
                return ProducerExit::Shutdown;
            }
            if !opened.kind.reopens() {
                info!("{} exhausted, producer exiting", self.source);
                return ProducerExit::Exhausted;
            }
        }
    }

    /// Read ticks until the stream ends. Returns the number of full ticks.
    fn pump<R: BufRead>(&self, reader: &mut R, transforms: &mut [Transform]) -> u64 {
        if self.input.needs_seed() {
            for transform in transforms.iter_mut() {
                match self.next_value(reader) {
                    Some(value) => transform.seed(value),
                    None => return 0,
                }
            }
        }

        let mut record = vec![0.0; transforms.len()];
        let mut ticks = 0;
        while !self.state.is_shutdown() {
            // Decode the full record first so a truncated one pushes nothing.
            for (slot, transform) in record.iter_mut().zip(transforms.iter_mut()) {
                match self.next_value(reader) {
                    Some(value) => *slot = transform.apply(value),
                    None => return ticks,
                }
            }
            for (ring, value) in self.state.channels().iter().zip(&record) {
                ring.push(*value);
            }
            self.state.mark_damaged();
            ticks += 1;
        }
        ticks
    }

    fn next_value<R: BufRead>(&self, reader: &mut R) -> Option<f64> {
        match self.decoder.read_next(reader) {
            Ok(value) => value,
            Err(err) => {
                warn!("read error on {}: {err}", self.source);
                None
            }
        }
    }
}
