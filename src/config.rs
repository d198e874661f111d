//! 설정 파일 로드/저장 (JSON)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::segmenter::{LanguageMode, DEFAULT_MAX_INPUT_CHARS};
use crate::transmit::protocol::{
    TypingParams, DEFAULT_MAX_PAYLOAD_BYTES, MAX_SPEED_CPS, MIN_SPEED_CPS,
};

/// 전송 설정
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TypingConfig {
    /// 청크당 최대 글자 수
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// 청크 간 대기 시간 (ms)
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
    /// 장치 타이핑 속도 (CPS)
    #[serde(default = "default_speed_cps")]
    pub speed_cps: u32,
    /// 장치에 현재 설정된 타이핑 속도 (CPS)
    /// speed_cps와 다르거나 null이면 세션 시작 시 속도 변경 명령을 보냄
    #[serde(default = "default_device_speed_cps")]
    pub device_speed_cps: Option<u32>,
    /// 장치 키 입력 간격 (ms)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// 한/영 전환 명령 후 대기 시간 (ms)
    #[serde(default = "default_switch_settle_ms")]
    pub switch_settle_ms: u64,
    /// 연결 시점의 장치 자판 모드
    /// None이면 첫 청크의 모드에 이미 맞춰져 있다고 가정
    #[serde(default)]
    pub initial_device_mode: Option<LanguageMode>,
    /// 장치 MTU (bytes)
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// 입력 최대 글자 수 (초과분은 잘라냄)
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_chunk_size() -> usize {
    100
}

fn default_chunk_delay_ms() -> u64 {
    500
}

fn default_speed_cps() -> u32 {
    6
}

fn default_device_speed_cps() -> Option<u32> {
    Some(default_speed_cps())
}

fn default_interval_ms() -> u64 {
    100
}

fn default_switch_settle_ms() -> u64 {
    200
}

fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

fn default_max_input_chars() -> usize {
    DEFAULT_MAX_INPUT_CHARS
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            speed_cps: default_speed_cps(),
            device_speed_cps: default_device_speed_cps(),
            interval_ms: default_interval_ms(),
            switch_settle_ms: default_switch_settle_ms(),
            initial_device_mode: None,
            max_payload_bytes: default_max_payload_bytes(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl TypingConfig {
    pub fn typing_params(&self) -> TypingParams {
        TypingParams {
            speed_cps: self.speed_cps,
            interval_ms: self.interval_ms,
        }
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn switch_settle(&self) -> Duration {
        Duration::from_millis(self.switch_settle_ms)
    }

    /// 값 범위 검사
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size는 1 이상이어야 합니다".into()));
        }
        if !(MIN_SPEED_CPS..=MAX_SPEED_CPS).contains(&self.speed_cps) {
            return Err(ConfigError::Invalid(format!(
                "speed_cps는 {}~{} 범위여야 합니다: {}",
                MIN_SPEED_CPS, MAX_SPEED_CPS, self.speed_cps
            )));
        }
        if self.max_input_chars == 0 {
            return Err(ConfigError::Invalid(
                "max_input_chars는 1 이상이어야 합니다".into(),
            ));
        }
        Ok(())
    }
}

/// 설정 로드/저장 에러
#[derive(Debug)]
pub enum ConfigError {
    /// 파일 읽기/쓰기 실패
    Io(io::Error),
    /// JSON 파싱 실패
    Parse(serde_json::Error),
    /// 값 범위 오류
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "설정 파일 입출력 오류: {}", e),
            ConfigError::Parse(e) => write!(f, "설정 파싱 오류: {}", e),
            ConfigError::Invalid(s) => write!(f, "잘못된 설정: {}", s),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// 설정 파일 경로: ~/.config/hantype/config.json
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .filter(|p| p.is_absolute() && p.is_dir())
        .unwrap_or_else(|| PathBuf::from("/var/tmp"));
    home.join(".config").join("hantype").join("config.json")
}

/// 지정한 경로에서 설정 로드 및 검사
pub fn load_config_from(path: &Path) -> Result<TypingConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: TypingConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// 설정 파일 로드 (파일 없거나 잘못되면 기본값)
pub fn load_config() -> TypingConfig {
    let path = config_path();
    match load_config_from(&path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => TypingConfig::default(),
        Err(e) => {
            log::warn!("{}: {}, 기본 설정을 사용합니다", path.display(), e);
            TypingConfig::default()
        }
    }
}

/// 설정 파일 저장
pub fn save_config_to(path: &Path, config: &TypingConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// 기본 경로에 설정 저장
pub fn save_config(config: &TypingConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}
