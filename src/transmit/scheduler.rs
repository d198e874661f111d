//! 청크 전송 스케줄러
//!
//! 처리된 문서를 청크로 나누어 순서대로 전송합니다. 이전 청크와 모드가 다르면
//! 한/영 전환 명령을 먼저 보내고 잠시 기다립니다. 청크 사이에는 장치가 입력을
//! 마칠 시간을 줍니다. 장치 속도가 설정과 다르면 첫 청크 전에 속도 변경 명령을
//! 보냅니다. 한 번에 하나의 세션만 진행되며, 중단 요청은 청크 사이에서 확인합니다.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::config::TypingConfig;
use crate::core::segmenter::{process_text_with_limit, LanguageMode, ProcessedDocument};
use crate::transmit::chunker::{split_into_chunks, Chunk};
use crate::transmit::estimate::{estimate_time, TimeEstimate};
use crate::transmit::protocol::{
    check_payload_size, log_notification, speed_command, ProtocolError, TypingPayload,
    SWITCH_LAYOUT_COMMAND, TEST_COMMAND,
};
use crate::transmit::transport::{Transport, TransportError};

/// 진행 상황 스냅샷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    /// 전체 글자 수 (키 입력 기준)
    pub total: usize,
    /// 장치로 보낸 글자 수
    pub sent: usize,
    /// 입력 완료로 간주한 글자 수
    pub typed: usize,
    /// typed / total (%, 반올림)
    pub percentage: u8,
    /// MTU를 넘어 전송 계층에서 쪼개질 수 있는 페이로드 수
    pub oversized: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        let mut progress = Self {
            total,
            ..Self::default()
        };
        progress.recompute();
        progress
    }

    fn recompute(&mut self) {
        self.percentage = if self.total == 0 {
            100
        } else {
            ((self.typed as f64 / self.total as f64) * 100.0).round() as u8
        };
    }
}

/// 세션 종료 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 모든 청크 전송 완료
    Completed(Progress),
    /// 중단 요청으로 종료 (이미 보낸 청크는 그대로)
    Aborted(Progress),
}

/// 전송 에러
#[derive(Debug)]
pub enum SendError {
    /// 다른 세션이 진행 중
    Busy,
    /// 페이로드 인코딩 실패
    Encode(String),
    /// 장치로 보낼 수 없는 설정 값
    Protocol(ProtocolError),
    /// 전송 계층 실패
    Transport {
        chunk_index: usize,
        source: TransportError,
    },
    /// 청크와 무관한 제어 명령 전송 실패
    Command {
        command: String,
        source: TransportError,
    },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Busy => write!(f, "이미 전송 중입니다"),
            SendError::Encode(s) => write!(f, "페이로드 인코딩 실패: {}", s),
            SendError::Protocol(e) => write!(f, "{}", e),
            SendError::Transport {
                chunk_index,
                source,
            } => write!(f, "청크 {} 전송 실패: {}", chunk_index, source),
            SendError::Command { command, source } => {
                write!(f, "명령 {} 전송 실패: {}", command, source)
            }
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SendError::Transport { source, .. } | SendError::Command { source, .. } => Some(source),
            SendError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

/// 대기 방식 (테스트에서는 실제로 잠들지 않도록 교체)
pub trait Pacer {
    fn pause(&self, duration: Duration);
}

/// `thread::sleep`으로 대기
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// 진행/완료/에러 콜백
#[derive(Default)]
pub struct SendCallbacks<'a> {
    on_progress: Option<Box<dyn FnMut(&Progress) + 'a>>,
    on_complete: Option<Box<dyn FnMut(&Progress) + 'a>>,
    on_error: Option<Box<dyn FnMut(&SendError) + 'a>>,
}

impl<'a> SendCallbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Progress) + 'a,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Progress) + 'a,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&SendError) + 'a,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    fn progress(&mut self, progress: &Progress) {
        if let Some(callback) = self.on_progress.as_mut() {
            callback(progress);
        }
    }

    fn complete(&mut self, progress: &Progress) {
        if let Some(callback) = self.on_complete.as_mut() {
            callback(progress);
        }
    }

    fn error(&mut self, error: &SendError) {
        if let Some(callback) = self.on_error.as_mut() {
            callback(error);
        }
    }
}

/// 세션 상태 (`AtomicU8` 값)
const IDLE: u8 = 0;
const SENDING: u8 = 1;
const CANCELLING: u8 = 2;

/// 다른 스레드에서 진행 중인 세션을 중단시키는 핸들
#[derive(Debug, Clone)]
pub struct AbortHandle {
    state: Arc<AtomicU8>,
}

impl AbortHandle {
    /// 중단 요청 (진행 중인 세션이 없으면 false)
    /// 현재 청크 전송이 끝난 뒤 다음 청크로 넘어가기 전에 반영됨
    ///
    /// 요청은 진행 중인 세션의 상태에만 기록되므로, 세션이 끝난 뒤 시작되는
    /// 새 세션으로 넘어가지 않습니다.
    pub fn abort(&self) -> bool {
        match self
            .state
            .compare_exchange(SENDING, CANCELLING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                log::info!("텍스트 전송 중단 요청");
                true
            }
            Err(CANCELLING) => true,
            Err(_) => false,
        }
    }

    pub fn is_sending(&self) -> bool {
        self.state.load(Ordering::Acquire) != IDLE
    }
}

/// 세션이 끝나면 (정상/중단/에러/패닉) 상태를 IDLE로 되돌림
struct ActiveGuard<'a> {
    state: &'a AtomicU8,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.state.store(IDLE, Ordering::Release);
    }
}

/// 한 번의 전송 세션 상태
#[derive(Debug)]
pub struct TransmissionSession {
    queue: VecDeque<Chunk>,
    progress: Progress,
    /// 마지막으로 보낸 청크 기준 장치 모드
    device_mode: Option<LanguageMode>,
}

impl TransmissionSession {
    fn new(chunks: Vec<Chunk>, initial_device_mode: Option<LanguageMode>) -> Self {
        let total = chunks.iter().map(Chunk::len).sum();
        Self {
            queue: chunks.into(),
            progress: Progress::new(total),
            device_mode: initial_device_mode,
        }
    }

    /// 이 청크 전에 전환 명령이 필요한지
    /// 장치 모드를 모르면 (첫 청크, 초기 모드 미설정) 이미 맞춰져 있다고 가정
    fn needs_switch(&self, mode: LanguageMode) -> bool {
        self.device_mode.is_some_and(|current| current != mode)
    }

    fn record_sent(&mut self, count: usize) {
        self.progress.sent += count;
        self.progress.recompute();
    }

    fn record_typed(&mut self, count: usize) {
        self.progress.typed += count;
        self.progress.recompute();
    }
}

/// 청크 전송 스케줄러
pub struct Scheduler<P: Pacer = ThreadPacer> {
    config: TypingConfig,
    pacer: P,
    state: Arc<AtomicU8>,
    /// 장치에 설정된 속도 (0이면 모름)
    device_speed: AtomicU32,
}

impl Scheduler<ThreadPacer> {
    pub fn new(config: TypingConfig) -> Self {
        Self::with_pacer(config, ThreadPacer)
    }
}

impl<P: Pacer> Scheduler<P> {
    pub fn with_pacer(config: TypingConfig, pacer: P) -> Self {
        Self {
            device_speed: AtomicU32::new(config.device_speed_cps.unwrap_or(0)),
            config,
            pacer,
            state: Arc::new(AtomicU8::new(IDLE)),
        }
    }

    pub fn config(&self) -> &TypingConfig {
        &self.config
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// 세션 진행 중 여부
    pub fn is_sending(&self) -> bool {
        self.state.load(Ordering::Acquire) != IDLE
    }

    /// 마지막으로 확인된 장치 타이핑 속도
    pub fn device_speed(&self) -> Option<u32> {
        match self.device_speed.load(Ordering::Acquire) {
            0 => None,
            cps => Some(cps),
        }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// 진행 중인 세션 중단 요청
    pub fn abort(&self) -> bool {
        self.abort_handle().abort()
    }

    /// 문서 전송 예상 소요 시간
    /// 청크 수는 실제 전송과 같은 분할(모드 경계 포함)로 셈
    pub fn estimate(&self, doc: &ProcessedDocument) -> TimeEstimate {
        let chunk_count = split_into_chunks(doc, self.config.chunk_size).len();
        estimate_time(
            doc.char_count(),
            chunk_count,
            self.config.chunk_delay_ms,
            self.config.speed_cps,
        )
    }

    /// 연결 테스트 명령 전송 (세션 진행 중이면 거부)
    pub fn test_connection(&self, transport: &mut dyn Transport) -> Result<(), SendError> {
        let _guard = self.begin()?;
        log::info!("연결 테스트 명령 전송");
        send_control(transport, TEST_COMMAND.to_string())
    }

    /// 세션 시작: IDLE일 때만 SENDING으로 전환
    fn begin(&self) -> Result<ActiveGuard<'_>, SendError> {
        if self
            .state
            .compare_exchange(IDLE, SENDING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("이미 전송 중입니다, 새 요청을 거부합니다");
            return Err(SendError::Busy);
        }
        Ok(ActiveGuard { state: &self.state })
    }

    /// 텍스트를 처리한 뒤 전송
    pub fn process_and_send(
        &self,
        text: &str,
        transport: &mut dyn Transport,
        callbacks: SendCallbacks<'_>,
    ) -> Result<SessionOutcome, SendError> {
        let doc = process_text_with_limit(text, self.config.max_input_chars);
        self.send_document(&doc, transport, callbacks)
    }

    /// 처리된 문서 전송
    pub fn send_document(
        &self,
        doc: &ProcessedDocument,
        transport: &mut dyn Transport,
        mut callbacks: SendCallbacks<'_>,
    ) -> Result<SessionOutcome, SendError> {
        let _guard = self.begin()?;

        let chunks = split_into_chunks(doc, self.config.chunk_size);
        log::info!("텍스트를 {}개 청크로 분할", chunks.len());
        let mut session = TransmissionSession::new(chunks, self.config.initial_device_mode);

        match self.run(&mut session, transport, &mut callbacks) {
            Ok(outcome) => {
                if let SessionOutcome::Completed(progress) = &outcome {
                    callbacks.complete(progress);
                }
                Ok(outcome)
            }
            Err(e) => {
                log::error!("{}", e);
                callbacks.error(&e);
                Err(e)
            }
        }
    }

    fn run(
        &self,
        session: &mut TransmissionSession,
        transport: &mut dyn Transport,
        callbacks: &mut SendCallbacks<'_>,
    ) -> Result<SessionOutcome, SendError> {
        if !session.queue.is_empty() {
            self.sync_speed(transport)?;
        }

        while let Some(chunk) = session.queue.pop_front() {
            if self.state.load(Ordering::Acquire) == CANCELLING {
                log::info!("텍스트 전송이 중단되었습니다 (남은 청크 {}개)", session.queue.len() + 1);
                session.queue.clear();
                return Ok(SessionOutcome::Aborted(session.progress));
            }

            self.dispatch(session, &chunk, transport)?;
            let count = chunk.len();
            session.record_sent(count);
            callbacks.progress(&session.progress);

            while let Some(message) = transport.poll_notification() {
                log_notification(&message);
            }

            if !session.queue.is_empty() {
                self.pacer.pause(self.config.chunk_delay());
            }
            session.record_typed(count);
            callbacks.progress(&session.progress);
        }

        Ok(SessionOutcome::Completed(session.progress))
    }

    /// 청크 하나 전송 (필요하면 전환 명령 먼저)
    fn dispatch(
        &self,
        session: &mut TransmissionSession,
        chunk: &Chunk,
        transport: &mut dyn Transport,
    ) -> Result<(), SendError> {
        let transport_error = |source: TransportError| SendError::Transport {
            chunk_index: chunk.index,
            source,
        };

        if session.needs_switch(chunk.mode) {
            log::info!("자판 전환: {} (청크 {})", chunk.mode, chunk.index);
            transport
                .send_command(SWITCH_LAYOUT_COMMAND)
                .map_err(transport_error)?;
            self.pacer.pause(self.config.switch_settle());
        }
        session.device_mode = Some(chunk.mode);

        let payload =
            TypingPayload::for_chunk(chunk, self.config.typing_params(), session.progress.total);
        let encoded = payload
            .encode()
            .map_err(|e| SendError::Encode(e.to_string()))?;
        if !check_payload_size(&encoded, self.config.max_payload_bytes) {
            session.progress.oversized += 1;
        }

        log::debug!(
            "청크 {} 전송: {} ({}자)",
            chunk.index,
            chunk.mode,
            chunk.len()
        );
        transport
            .send_payload(&encoded, self.config.typing_params())
            .map_err(transport_error)
    }

    /// 장치 속도가 설정과 다르면 속도 변경 명령 전송
    fn sync_speed(&self, transport: &mut dyn Transport) -> Result<(), SendError> {
        let target = self.config.speed_cps;
        if self.device_speed() == Some(target) {
            return Ok(());
        }
        let command = speed_command(target).map_err(SendError::Protocol)?;
        log::info!("장치 타이핑 속도 변경: {} CPS", target);
        send_control(transport, command)?;
        self.device_speed.store(target, Ordering::Release);
        Ok(())
    }
}

fn send_control(transport: &mut dyn Transport, command: String) -> Result<(), SendError> {
    match transport.send_command(&command) {
        Ok(()) => Ok(()),
        Err(source) => Err(SendError::Command { command, source }),
    }
}
