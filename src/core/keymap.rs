//! 한글 → 두벌식 키 입력 변환
//!
//! 완성형 한글 음절을 US QWERTY 자판에서 눌러야 할 키 시퀀스로 바꿉니다.
//! 복합 모음(ㅘ 등)과 겹받침(ㄳ, ㄺ 등)은 두 개의 키로 입력됩니다.

use crate::core::unicode::{decompose_syllable, JamoTriple};

/// 초성 인덱스 → 키
/// ㄱ(0) ㄲ(1) ㄴ(2) ㄷ(3) ㄸ(4) ㄹ(5) ㅁ(6) ㅂ(7) ㅃ(8) ㅅ(9)
/// ㅆ(10) ㅇ(11) ㅈ(12) ㅉ(13) ㅊ(14) ㅋ(15) ㅌ(16) ㅍ(17) ㅎ(18)
#[rustfmt::skip]
pub const INITIAL_KEYS: [&str; 19] = [
    "r", "R", "s", "e", "E", "f", "a", "q", "Q", "t",
    "T", "d", "w", "W", "c", "z", "x", "v", "g",
];

/// 중성 인덱스 → 키
/// ㅏ(0) ㅐ(1) ㅑ(2) ㅒ(3) ㅓ(4) ㅔ(5) ㅕ(6) ㅖ(7) ㅗ(8) ㅘ(9)
/// ㅙ(10) ㅚ(11) ㅛ(12) ㅜ(13) ㅝ(14) ㅞ(15) ㅟ(16) ㅠ(17) ㅡ(18) ㅢ(19) ㅣ(20)
#[rustfmt::skip]
pub const MEDIAL_KEYS: [&str; 21] = [
    "k", "o", "i", "O", "j", "p", "u", "P", "h", "hk",
    "ho", "hl", "y", "n", "nj", "np", "nl", "b", "m", "ml", "l",
];

/// 종성 인덱스 → 키 (0 = 종성 없음)
/// 없음(0) ㄱ(1) ㄲ(2) ㄳ(3) ㄴ(4) ㄵ(5) ㄶ(6) ㄷ(7) ㄹ(8) ㄺ(9)
/// ㄻ(10) ㄼ(11) ㄽ(12) ㄾ(13) ㄿ(14) ㅀ(15) ㅁ(16) ㅂ(17) ㅄ(18) ㅅ(19)
/// ㅆ(20) ㅇ(21) ㅈ(22) ㅊ(23) ㅋ(24) ㅌ(25) ㅍ(26) ㅎ(27)
#[rustfmt::skip]
pub const FINAL_KEYS: [&str; 28] = [
    "", "r", "R", "rt", "s", "sw", "sg", "e", "f", "fr",
    "fa", "fq", "ft", "fx", "fv", "fg", "a", "q", "qt", "t",
    "T", "d", "w", "c", "z", "x", "v", "g",
];

/// 분해된 음절의 키 시퀀스를 버퍼에 추가
/// 테이블 범위를 벗어난 인덱스는 아무것도 추가하지 않음
fn push_syllable_keys(triple: JamoTriple, out: &mut String) {
    let keys = (
        INITIAL_KEYS.get(triple.initial as usize),
        MEDIAL_KEYS.get(triple.medial as usize),
        FINAL_KEYS.get(triple.final_ as usize),
    );
    match keys {
        (Some(initial), Some(medial), Some(final_)) => {
            out.push_str(initial);
            out.push_str(medial);
            if triple.has_final() {
                out.push_str(final_);
            }
        }
        _ => log::debug!("자모 인덱스 범위 초과: {:?}", triple),
    }
}

/// 한 글자의 키 시퀀스 (한글 음절이 아니면 None)
pub fn syllable_to_keys(c: char) -> Option<String> {
    let triple = decompose_syllable(c)?;
    let mut keys = String::with_capacity(5);
    push_syllable_keys(triple, &mut keys);
    Some(keys)
}

/// 한글 문자열을 두벌식 키 시퀀스로 변환
/// 한글 음절이 아닌 문자는 그대로 유지
///
/// # Examples
/// ```
/// use hantype::transliterate;
/// assert_eq!(transliterate("안녕"), "dkssud");
/// assert_eq!(transliterate("한글!"), "gksrmf!");
/// ```
pub fn transliterate(input: &str) -> String {
    // 음절 하나는 최대 5키 (ㅘ + ㄺ 등)
    let mut result = String::with_capacity(input.len() * 2);
    transliterate_into(input, &mut result);
    result
}

/// 변환 결과를 기존 버퍼에 이어붙임
pub fn transliterate_into(input: &str, out: &mut String) {
    for c in input.chars() {
        match decompose_syllable(c) {
            Some(triple) => push_syllable_keys(triple, out),
            None => out.push(c),
        }
    }
}
