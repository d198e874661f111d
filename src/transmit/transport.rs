//! 전송 계층 경계
//!
//! 실제 무선 연결(검색, 연결, 특성 쓰기)은 이 크레이트 밖에 있습니다.
//! 스케줄러는 `Transport` 트레이트만 알고, 바이너리는 표준 출력에 한 줄씩
//! 쓰는 `WriterTransport`를 사용합니다.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::transmit::protocol::TypingParams;

/// 전송 실패
#[derive(Debug)]
pub enum TransportError {
    /// 입출력 실패
    Io(io::Error),
    /// 연결 끊김
    Disconnected,
    /// 장치 또는 어댑터가 거부
    Rejected(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "전송 입출력 오류: {}", e),
            TransportError::Disconnected => write!(f, "장치와 연결되어 있지 않습니다"),
            TransportError::Rejected(s) => write!(f, "전송 거부: {}", s),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        TransportError::Io(e)
    }
}

/// 장치로 데이터를 보내는 어댑터
pub trait Transport {
    /// 인코딩된 텍스트 페이로드 전송
    fn send_payload(&mut self, encoded: &str, params: TypingParams)
        -> Result<(), TransportError>;

    /// 명령 문자열 전송
    fn send_command(&mut self, command: &str) -> Result<(), TransportError>;

    /// 이미 도착한 장치 알림 하나 (없으면 None)
    /// 전송 루프에서 호출되므로 기다리지 않고 바로 반환해야 함
    fn poll_notification(&mut self) -> Option<String> {
        None
    }
}

/// `io::Write` 위에 한 줄에 하나씩 쓰는 어댑터
///
/// 알림 입력이 주어지면 별도 스레드가 줄 단위로 읽어 채널로 넘기고,
/// `poll_notification`은 이미 도착한 줄만 꺼냅니다. 입력이 조용해도
/// 전송 루프는 멈추지 않습니다.
pub struct WriterTransport<W: Write> {
    writer: W,
    notifications: Option<Receiver<String>>,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            notifications: None,
        }
    }

    /// 장치 알림을 읽을 입력 연결
    ///
    /// 읽기 스레드는 입력이 끝나거나(EOF) 오류가 나거나 이 전송 계층이
    /// 사라지면 종료됩니다.
    pub fn with_notifications(mut self, reader: Box<dyn BufRead + Send>) -> Self {
        self.notifications = Some(spawn_line_reader(reader));
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// 입력을 줄 단위로 읽어 채널로 보내는 스레드 시작
fn spawn_line_reader(mut reader: Box<dyn BufRead + Send>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(line.trim_end().to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::warn!("장치 알림 읽기 실패: {}", e);
                break;
            }
        }
    });
    rx
}

impl<W: Write> Transport for WriterTransport<W> {
    fn send_payload(
        &mut self,
        encoded: &str,
        _params: TypingParams,
    ) -> Result<(), TransportError> {
        self.write_line(encoded)
    }

    fn send_command(&mut self, command: &str) -> Result<(), TransportError> {
        self.write_line(command)
    }

    fn poll_notification(&mut self) -> Option<String> {
        let rx = self.notifications.as_ref()?;
        match rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.notifications = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};
    use std::sync::mpsc::Sender;
    use std::time::{Duration, Instant};

    /// 데이터가 올 때까지 막히는 입력 (송신 측이 살아 있는 동안 아무것도 주지 않음)
    struct SilentReader(Receiver<Vec<u8>>);

    impl Read for SilentReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.recv() {
                Ok(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Err(_) => Ok(0),
            }
        }
    }

    fn silent_reader() -> (Sender<Vec<u8>>, Box<dyn BufRead + Send>) {
        let (tx, rx) = mpsc::channel();
        (tx, Box::new(BufReader::new(SilentReader(rx))))
    }

    /// 읽기 스레드가 줄을 넘길 때까지 잠시 기다리며 꺼냄
    fn wait_notification<W: Write>(transport: &mut WriterTransport<W>) -> Option<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(line) = transport.poll_notification() {
                return Some(line);
            }
            if transport.notifications.is_none() {
                return None;
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    const PARAMS: TypingParams = TypingParams {
        speed_cps: 6,
        interval_ms: 100,
    };

    #[test]
    fn test_writer_transport_writes_lines() {
        let mut transport = WriterTransport::new(Vec::new());
        transport.send_command("GHTYPE_SPE:haneng").unwrap();
        transport.send_payload(r#"{"text":"rk"}"#, PARAMS).unwrap();
        let written = String::from_utf8(transport.into_inner()).unwrap();
        assert_eq!(written, "GHTYPE_SPE:haneng\n{\"text\":\"rk\"}\n");
    }

    #[test]
    fn test_poll_notification() {
        let reader = Cursor::new(b"OK:5\nSPD:6\n".to_vec());
        let mut transport = WriterTransport::new(Vec::new()).with_notifications(Box::new(reader));
        assert_eq!(wait_notification(&mut transport), Some("OK:5".to_string()));
        assert_eq!(wait_notification(&mut transport), Some("SPD:6".to_string()));
        assert_eq!(wait_notification(&mut transport), None);
        assert!(transport.notifications.is_none());
    }

    #[test]
    fn test_silent_notification_input_does_not_block() {
        let (feed, reader) = silent_reader();
        let mut transport = WriterTransport::new(Vec::new()).with_notifications(reader);

        let started = Instant::now();
        assert_eq!(transport.poll_notification(), None);
        assert_eq!(transport.poll_notification(), None);
        assert!(started.elapsed() < Duration::from_millis(500));

        // 나중에 도착한 알림은 그대로 전달
        feed.send(b"OK:3\n".to_vec()).unwrap();
        assert_eq!(wait_notification(&mut transport), Some("OK:3".to_string()));
    }

    #[test]
    fn test_no_notifications_by_default() {
        let mut transport = WriterTransport::new(Vec::new());
        assert_eq!(transport.poll_notification(), None);
    }

    #[test]
    fn test_error_display() {
        let e = TransportError::Rejected("busy".into());
        assert_eq!(e.to_string(), "전송 거부: busy");
        let e: TransportError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(e, TransportError::Io(_)));
    }
}
