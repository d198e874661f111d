//! 청크 분할, 장치 프로토콜, 전송 스케줄링

pub mod chunker;
pub mod estimate;
pub mod protocol;
pub mod scheduler;
pub mod transport;

pub use chunker::{split_into_chunks, Chunk};
pub use scheduler::{
    AbortHandle, Pacer, Progress, Scheduler, SendCallbacks, SendError, SessionOutcome,
    ThreadPacer, TransmissionSession,
};
pub use transport::{Transport, TransportError, WriterTransport};
