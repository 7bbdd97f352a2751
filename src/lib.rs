pub mod codec;
pub mod filter;
pub mod header;
pub mod preamble;
pub mod sink;
pub mod trace;
pub mod writer;

pub use codec::{decode_samples, encode_samples, Endianness, PayloadKind};
pub use filter::{Butterworth, CausalFilter, FilterError, FilterPhase};
pub use header::{TraceHeader, HEADER_BYTES};
pub use preamble::StreamPreamble;
pub use sink::{SinkClass, TraceSink};
pub use trace::{TraceRecord, MAX_SAMPLES_PER_TRACE};
pub use writer::{DestId, LengthMode, StreamRegistry, StreamState, WriteError};
