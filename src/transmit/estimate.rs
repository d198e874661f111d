//! 전송 예상 소요 시간

/// 예상 소요 시간 (초, 반올림)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEstimate {
    pub chunk_count: usize,
    /// 장치 입력 시간
    pub typing_secs: u64,
    /// 청크 간 대기 시간 합
    pub delay_secs: u64,
    pub total_secs: u64,
}

impl TimeEstimate {
    /// "1시간 2분 3초" 형식
    pub fn formatted(&self) -> String {
        format_duration(self.total_secs)
    }
}

/// 글자 수, 청크 수, 전송 설정으로 소요 시간 추정
/// 청크 간 대기는 마지막 청크 뒤에는 없음
pub fn estimate_time(
    total_chars: usize,
    chunk_count: usize,
    chunk_delay_ms: u64,
    speed_cps: u32,
) -> TimeEstimate {
    let typing = total_chars as f64 / f64::from(speed_cps.max(1));
    let delay = chunk_count.saturating_sub(1) as f64 * chunk_delay_ms as f64 / 1000.0;
    TimeEstimate {
        chunk_count,
        typing_secs: typing.round() as u64,
        delay_secs: delay.round() as u64,
        total_secs: (typing + delay).round() as u64,
    }
}

/// 초를 시/분/초 문자열로 변환
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}시간 {}분 {}초", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}분 {}초", minutes, seconds)
    } else {
        format!("{}초", seconds)
    }
}
