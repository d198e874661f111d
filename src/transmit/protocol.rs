//! 장치 전송 프로토콜
//!
//! 텍스트 청크는 JSON 페이로드로, 제어는 `GHTYPE_` 접두사가 붙은 명령
//! 문자열로 보냅니다. 장치는 `OK:<글자수>`, `SPD:<속도>` 형태로 알립니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::segmenter::LanguageMode;
use crate::transmit::chunker::Chunk;

/// 한/영 전환 명령
pub const SWITCH_LAYOUT_COMMAND: &str = "GHTYPE_SPE:haneng";
/// 연결 테스트 명령
pub const TEST_COMMAND: &str = "GHTYPE_TEST";
/// 설정 명령 접두사
pub const CONFIG_COMMAND_PREFIX: &str = "GHTYPE_CFG:";

/// 장치 MTU 기본값 (바이트)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 247;

/// 허용 타이핑 속도 범위 (CPS)
pub const MIN_SPEED_CPS: u32 = 1;
pub const MAX_SPEED_CPS: u32 = 50;

/// 프로토콜 에러
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 허용 범위를 벗어난 속도
    SpeedOutOfRange(u32),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::SpeedOutOfRange(cps) => write!(
                f,
                "타이핑 속도는 {}~{} CPS 범위여야 합니다: {}",
                MIN_SPEED_CPS, MAX_SPEED_CPS, cps
            ),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// 장치가 입력할 때 사용하는 속도 파라미터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingParams {
    pub speed_cps: u32,
    pub interval_ms: u64,
}

/// 청크 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub index: usize,
    /// 세션 전체 문자 수
    pub total: usize,
    pub mode: LanguageMode,
}

/// 청크 하나를 담은 JSON 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPayload {
    pub text: String,
    pub speed_cps: u32,
    pub interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_info: Option<ChunkInfo>,
}

impl TypingPayload {
    /// 청크로부터 페이로드 생성
    pub fn for_chunk(chunk: &Chunk, params: TypingParams, total: usize) -> Self {
        Self {
            text: chunk.text.clone(),
            speed_cps: params.speed_cps,
            interval_ms: params.interval_ms,
            chunk_info: Some(ChunkInfo {
                index: chunk.index,
                total,
                mode: chunk.mode,
            }),
        }
    }

    /// JSON 문자열로 인코딩
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// 인코딩된 페이로드가 MTU를 넘는지 확인하고, 넘으면 경고 로그
/// 실제 분할은 전송 계층의 몫
pub fn check_payload_size(encoded: &str, max_bytes: usize) -> bool {
    let fits = encoded.len() <= max_bytes;
    if !fits {
        log::warn!(
            "페이로드가 MTU를 초과합니다 ({} > {} bytes), 분할될 수 있습니다",
            encoded.len(),
            max_bytes
        );
    }
    fits
}

/// 타이핑 속도 변경 명령 생성
pub fn speed_command(cps: u32) -> Result<String, ProtocolError> {
    if !(MIN_SPEED_CPS..=MAX_SPEED_CPS).contains(&cps) {
        return Err(ProtocolError::SpeedOutOfRange(cps));
    }
    let body = serde_json::json!({ "mode": "typing", "speed_cps": cps });
    Ok(format!("{}{}", CONFIG_COMMAND_PREFIX, body))
}

/// 장치 알림
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// 입력 완료 (글자 수)
    Typed(u64),
    /// 속도 변경 완료 (CPS)
    SpeedUpdated(u32),
}

/// 해석할 수 없는 장치 알림
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckError {
    /// 알 수 없는 형식
    UnknownFormat(String),
    /// 숫자 부분 해석 실패
    InvalidNumber(String),
}

impl fmt::Display for AckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckError::UnknownFormat(s) => write!(f, "알 수 없는 장치 알림: {}", s),
            AckError::InvalidNumber(s) => write!(f, "장치 알림의 숫자 오류: {}", s),
        }
    }
}

impl std::error::Error for AckError {}

impl Acknowledgement {
    /// `OK:<n>` 또는 `SPD:<n>` 해석
    pub fn parse(message: &str) -> Result<Self, AckError> {
        let message = message.trim();
        if let Some(count) = message.strip_prefix("OK:") {
            count
                .trim()
                .parse()
                .map(Acknowledgement::Typed)
                .map_err(|_| AckError::InvalidNumber(message.to_string()))
        } else if let Some(speed) = message.strip_prefix("SPD:") {
            speed
                .trim()
                .parse()
                .map(Acknowledgement::SpeedUpdated)
                .map_err(|_| AckError::InvalidNumber(message.to_string()))
        } else {
            Err(AckError::UnknownFormat(message.to_string()))
        }
    }
}

/// 장치 알림을 로그로만 남김 (전송 흐름에는 영향 없음)
pub fn log_notification(message: &str) {
    match Acknowledgement::parse(message) {
        Ok(Acknowledgement::Typed(count)) => log::info!("장치 입력 완료: {}자", count),
        Ok(Acknowledgement::SpeedUpdated(cps)) => log::info!("장치 속도 변경: {} CPS", cps),
        Err(e) => log::warn!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            index: 2,
            mode: LanguageMode::Korean,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_payload_json_shape() {
        let params = TypingParams {
            speed_cps: 6,
            interval_ms: 100,
        };
        let payload = TypingPayload::for_chunk(&chunk("dkssud"), params, 42);
        let json = payload.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["text"], "dkssud");
        assert_eq!(value["speed_cps"], 6);
        assert_eq!(value["interval_ms"], 100);
        assert_eq!(value["chunk_info"]["index"], 2);
        assert_eq!(value["chunk_info"]["total"], 42);
        assert_eq!(value["chunk_info"]["mode"], "korean");
    }

    #[test]
    fn test_payload_without_chunk_info() {
        let json = r#"{"text":"abc","speed_cps":10,"interval_ms":50}"#;
        let payload: TypingPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.chunk_info, None);
        assert_eq!(payload.encode().unwrap(), json);
    }

    #[test]
    fn test_check_payload_size() {
        assert!(check_payload_size("abc", 3));
        assert!(!check_payload_size("abcd", 3));
        let long = "a".repeat(300);
        assert!(!check_payload_size(&long, DEFAULT_MAX_PAYLOAD_BYTES));
    }

    #[test]
    fn test_speed_command() {
        assert_eq!(
            speed_command(8).unwrap(),
            r#"GHTYPE_CFG:{"mode":"typing","speed_cps":8}"#
        );
        assert!(speed_command(1).is_ok());
        assert!(speed_command(50).is_ok());
        assert_eq!(speed_command(0), Err(ProtocolError::SpeedOutOfRange(0)));
        assert_eq!(speed_command(51), Err(ProtocolError::SpeedOutOfRange(51)));
    }

    #[test]
    fn test_parse_acknowledgement() {
        assert_eq!(Acknowledgement::parse("OK:12"), Ok(Acknowledgement::Typed(12)));
        assert_eq!(
            Acknowledgement::parse("SPD:6\n"),
            Ok(Acknowledgement::SpeedUpdated(6))
        );
        assert!(matches!(
            Acknowledgement::parse("OK:abc"),
            Err(AckError::InvalidNumber(_))
        ));
        assert!(matches!(
            Acknowledgement::parse("HELLO"),
            Err(AckError::UnknownFormat(_))
        ));
        assert!(matches!(
            Acknowledgement::parse(""),
            Err(AckError::UnknownFormat(_))
        ));
    }
}
