//! 한영 혼합 텍스트 모드 분할
//!
//! 입력 문자를 한글/영문/중립으로 분류하고, 같은 모드의 연속 구간(run)을
//! 만든 뒤 모드가 바뀌는 지점마다 자판 전환 마커를 넣습니다.
//! 한글 구간은 두벌식 키 시퀀스로 변환되고, 영문 구간은 그대로 유지됩니다.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::keymap::transliterate_into;
use crate::core::unicode::is_hangul_syllable;

/// 평문으로 렌더링할 때 사용하는 자판 전환 마커
pub const TOGGLE_MARKER: &str = "⌨TOGGLE⌨";

/// 입력 길이 기본 상한 (문자 수)
pub const DEFAULT_MAX_INPUT_CHARS: usize = 100_000;

/// 장치 자판 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    Korean,
    Latin,
}

impl LanguageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageMode::Korean => "korean",
            LanguageMode::Latin => "latin",
        }
    }
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 문자 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// 완성형 한글 음절
    Korean,
    /// ASCII 영문자
    Latin,
    /// 공백, 숫자, 문장부호, 이모지 등 - 현재 모드를 따름
    Neutral,
}

impl CharClass {
    /// 현재 모드를 고려한 실제 모드
    /// 모드가 정해지지 않았으면 중립 문자는 영문으로 취급
    pub fn resolve(self, current: Option<LanguageMode>) -> LanguageMode {
        match self {
            CharClass::Korean => LanguageMode::Korean,
            CharClass::Latin => LanguageMode::Latin,
            CharClass::Neutral => current.unwrap_or(LanguageMode::Latin),
        }
    }
}

/// 문자 하나를 분류
///
/// 공백과 문장부호는 어느 자판에서도 같은 키로 입력되므로 모드를 바꾸지 않습니다.
pub fn classify(c: char) -> CharClass {
    if is_hangul_syllable(c) {
        CharClass::Korean
    } else if c.is_ascii_alphabetic() {
        CharClass::Latin
    } else {
        CharClass::Neutral
    }
}

/// 처리된 문서의 구성 요소
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// 한 모드의 구간 (한글 구간은 이미 키 시퀀스로 변환됨)
    Text { mode: LanguageMode, text: String },
    /// 자판 전환 마커
    Toggle,
}

/// 모드 분할과 변환이 끝난 문서
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedDocument {
    segments: Vec<Segment>,
}

impl ProcessedDocument {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 전환 마커 개수
    pub fn toggle_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Toggle))
            .count()
    }

    pub fn has_toggle(&self) -> bool {
        self.toggle_count() > 0
    }

    /// 텍스트 구간만 순서대로 (모드, 내용)
    pub fn runs(&self) -> impl Iterator<Item = (LanguageMode, &str)> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Text { mode, text } => Some((*mode, text.as_str())),
            Segment::Toggle => None,
        })
    }

    /// 마커를 제외한 전체 문자 수
    pub fn char_count(&self) -> usize {
        self.runs().map(|(_, text)| text.chars().count()).sum()
    }

    /// 마커를 제외한 내용
    pub fn content(&self) -> String {
        self.runs().map(|(_, text)| text).collect()
    }

    /// 마커를 평문 문자열로 넣어 렌더링
    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text { text, .. } => out.push_str(text),
                Segment::Toggle => out.push_str(TOGGLE_MARKER),
            }
        }
        out
    }
}

/// 모드 분할 상태 기계
///
/// 문자를 하나씩 받아 현재 구간에 쌓고, 모드가 바뀌면 구간을 내보낸 뒤
/// 전환 마커를 추가합니다. 첫 문자는 마커 없이 초기 모드만 정합니다.
#[derive(Debug, Default)]
pub struct Segmenter {
    /// 현재 모드 (None = 아직 문자 없음)
    mode: Option<LanguageMode>,
    /// 현재 구간의 원문
    buffer: String,
    segments: Vec<Segment>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 모드
    pub fn mode(&self) -> Option<LanguageMode> {
        self.mode
    }

    /// 문자 하나 입력
    pub fn feed(&mut self, c: char) {
        let char_mode = classify(c).resolve(self.mode);
        match self.mode {
            Some(current) if current != char_mode => {
                self.flush();
                self.segments.push(Segment::Toggle);
                self.mode = Some(char_mode);
            }
            Some(_) => {}
            None => self.mode = Some(char_mode),
        }
        self.buffer.push(c);
    }

    /// 쌓인 구간을 변환하여 내보냄
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let Some(mode) = self.mode else {
            return;
        };
        let text = match mode {
            LanguageMode::Korean => {
                let mut keys = String::with_capacity(self.buffer.len() * 2);
                transliterate_into(&self.buffer, &mut keys);
                self.buffer.clear();
                keys
            }
            LanguageMode::Latin => std::mem::take(&mut self.buffer),
        };
        self.segments.push(Segment::Text { mode, text });
    }

    /// 분할 종료 및 결과 반환 (끝에는 마커를 붙이지 않음)
    pub fn finish(mut self) -> ProcessedDocument {
        self.flush();
        ProcessedDocument {
            segments: self.segments,
        }
    }
}

/// 입력 길이를 상한 이내로 자름 (문자 단위)
pub fn sanitize_input(input: &str, max_chars: usize) -> Cow<'_, str> {
    match input.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            log::warn!(
                "입력이 너무 깁니다: {}자 초과, 앞부분만 처리합니다",
                max_chars
            );
            Cow::Borrowed(&input[..byte_index])
        }
        None => Cow::Borrowed(input),
    }
}

/// 텍스트를 모드별로 분할하고 한글 구간을 키 시퀀스로 변환
pub fn process_text_with_limit(input: &str, max_chars: usize) -> ProcessedDocument {
    let input = sanitize_input(input, max_chars);
    let mut segmenter = Segmenter::new();
    for c in input.chars() {
        segmenter.feed(c);
    }
    segmenter.finish()
}

/// 기본 길이 상한으로 텍스트 처리
///
/// # Examples
/// ```
/// use hantype::process_text;
/// let doc = process_text("Hello 안녕하세요 World!");
/// assert_eq!(doc.render(), "Hello ⌨TOGGLE⌨dkssudgktpdy ⌨TOGGLE⌨World!");
/// ```
pub fn process_text(input: &str) -> ProcessedDocument {
    process_text_with_limit(input, DEFAULT_MAX_INPUT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 인접 구간 사이의 모드 변화 횟수
    fn mode_changes(doc: &ProcessedDocument) -> usize {
        let modes: Vec<LanguageMode> = doc.runs().map(|(mode, _)| mode).collect();
        modes.windows(2).filter(|w| w[0] != w[1]).count()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify('가'), CharClass::Korean);
        assert_eq!(classify('a'), CharClass::Latin);
        assert_eq!(classify('Z'), CharClass::Latin);
        assert_eq!(classify('1'), CharClass::Neutral);
        assert_eq!(classify(' '), CharClass::Neutral);
        assert_eq!(classify('!'), CharClass::Neutral);
        assert_eq!(classify('\n'), CharClass::Neutral);
        assert_eq!(classify('ㄱ'), CharClass::Neutral);
        assert_eq!(classify('é'), CharClass::Neutral);
        assert_eq!(classify('。'), CharClass::Neutral);
        assert_eq!(classify('😀'), CharClass::Neutral);
    }

    #[test]
    fn test_neutral_resolution() {
        assert_eq!(CharClass::Neutral.resolve(None), LanguageMode::Latin);
        assert_eq!(
            CharClass::Neutral.resolve(Some(LanguageMode::Korean)),
            LanguageMode::Korean
        );
        assert_eq!(
            CharClass::Latin.resolve(Some(LanguageMode::Korean)),
            LanguageMode::Latin
        );
    }

    #[test]
    fn test_mixed_text() {
        let doc = process_text("Hello 안녕하세요 World!");
        assert_eq!(doc.render(), "Hello ⌨TOGGLE⌨dkssudgktpdy ⌨TOGGLE⌨World!");
        assert_eq!(doc.toggle_count(), 2);
    }

    #[test]
    fn test_korean_first() {
        let doc = process_text("대한민국 Korea 화이팅!");
        assert_eq!(
            doc.render(),
            "eogksalsrnr ⌨TOGGLE⌨Korea ⌨TOGGLE⌨ghkdlxld!"
        );
        let modes: Vec<LanguageMode> = doc.runs().map(|(m, _)| m).collect();
        assert_eq!(
            modes,
            vec![LanguageMode::Korean, LanguageMode::Latin, LanguageMode::Korean]
        );
    }

    #[test]
    fn test_single_mode() {
        let doc = process_text("English only text");
        assert_eq!(doc.render(), "English only text");
        assert_eq!(doc.toggle_count(), 0);

        let doc = process_text("한글만있는텍스트");
        assert_eq!(doc.render(), "gksrmfaksdlTsmsxprtmxm");
        assert_eq!(doc.toggle_count(), 0);
    }

    #[test]
    fn test_empty_input() {
        let doc = process_text("");
        assert!(doc.is_empty());
        assert_eq!(doc.render(), "");
    }

    #[test]
    fn test_neutral_inherits_current_mode() {
        // 전각 마침표는 한글 구간에 흡수됨
        let doc = process_text("안녕。hi");
        let runs: Vec<(LanguageMode, &str)> = doc.runs().collect();
        assert_eq!(
            runs,
            vec![(LanguageMode::Korean, "dkssud。"), (LanguageMode::Latin, "hi")]
        );

        // 모드가 정해지기 전의 중립 문자는 영문
        let doc = process_text("😀가");
        assert_eq!(doc.render(), "😀⌨TOGGLE⌨rk");
    }

    #[test]
    fn test_marker_count_matches_mode_changes() {
        let inputs = [
            "",
            "a",
            "가",
            "a가b나c",
            "가나 다라 abc 마바",
            "😀😀😀",
            "맑은 sky 넓은 sea",
            "Test 되 vs 돼 example",
        ];
        for input in inputs {
            let doc = process_text(input);
            assert_eq!(doc.toggle_count(), mode_changes(&doc), "{}", input);
        }
    }

    #[test]
    fn test_reprocessing_is_identity() {
        let first = process_text("맑은 sky 넓은 sea").render();
        assert_eq!(first, "akfrdms ⌨TOGGLE⌨sky ⌨TOGGLE⌨sjfqdms ⌨TOGGLE⌨sea");
        let second = process_text(&first);
        assert_eq!(second.render(), first);
        assert_eq!(second.toggle_count(), 0);
    }

    #[test]
    fn test_sanitize_input_truncates_by_chars() {
        assert_eq!(sanitize_input("가나다라", 2), "가나");
        assert_eq!(sanitize_input("abc", 3), "abc");
        assert_eq!(sanitize_input("abc", 10), "abc");

        let doc = process_text_with_limit("abc가나다", 4);
        assert_eq!(doc.render(), "abc⌨TOGGLE⌨rk");
    }

    #[test]
    fn test_totality_over_code_points() {
        let input: String = (0..0x11_0000u32)
            .step_by(97)
            .filter_map(char::from_u32)
            .collect();
        let doc = process_text(&input);
        assert_eq!(doc.toggle_count(), mode_changes(&doc));
    }
}
