//! 유니코드 한글 음절 분해/조합 유틸리티

/// 한글 음절 시작 코드포인트 (가)
pub const HANGUL_SYLLABLE_BASE: u32 = 0xAC00;
/// 한글 음절 마지막 코드포인트 (힣)
pub const HANGUL_SYLLABLE_LAST: u32 = 0xD7A3;

/// 초성 개수
pub const CHOSEONG_COUNT: u32 = 19;
/// 중성 개수
pub const JUNGSEONG_COUNT: u32 = 21;
/// 종성 개수 (종성 없음 포함)
pub const JONGSEONG_COUNT: u32 = 28;

/// 완성형 음절 개수 (19 × 21 × 28)
pub const SYLLABLE_COUNT: u32 = CHOSEONG_COUNT * JUNGSEONG_COUNT * JONGSEONG_COUNT;

/// 한글 음절을 분해한 초성/중성/종성 인덱스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JamoTriple {
    /// 초성 인덱스 (0~18)
    pub initial: u32,
    /// 중성 인덱스 (0~20)
    pub medial: u32,
    /// 종성 인덱스 (0~27, 0 = 종성 없음)
    pub final_: u32,
}

impl JamoTriple {
    /// 종성이 있는지 확인
    pub fn has_final(&self) -> bool {
        self.final_ != 0
    }

    /// 음절 인덱스 (코드포인트 - 0xAC00)로 되돌림
    pub fn syllable_index(&self) -> u32 {
        (self.initial * JUNGSEONG_COUNT + self.medial) * JONGSEONG_COUNT + self.final_
    }
}

/// 완성형 한글 음절(가-힣)인지 확인
pub fn is_hangul_syllable(c: char) -> bool {
    (HANGUL_SYLLABLE_BASE..=HANGUL_SYLLABLE_LAST).contains(&(c as u32))
}

/// 완성형 한글을 초성/중성/종성 인덱스로 분해
/// 음절 범위 밖의 문자는 None
pub fn decompose_syllable(c: char) -> Option<JamoTriple> {
    if !is_hangul_syllable(c) {
        return None;
    }
    let offset = c as u32 - HANGUL_SYLLABLE_BASE;
    Some(JamoTriple {
        initial: offset / (JUNGSEONG_COUNT * JONGSEONG_COUNT),
        medial: (offset % (JUNGSEONG_COUNT * JONGSEONG_COUNT)) / JONGSEONG_COUNT,
        final_: offset % JONGSEONG_COUNT,
    })
}

/// 초성/중성/종성 인덱스로 완성된 한글 음절 생성
pub fn compose_syllable(triple: JamoTriple) -> Option<char> {
    if triple.initial >= CHOSEONG_COUNT
        || triple.medial >= JUNGSEONG_COUNT
        || triple.final_ >= JONGSEONG_COUNT
    {
        return None;
    }
    char::from_u32(HANGUL_SYLLABLE_BASE + triple.syllable_index())
}
