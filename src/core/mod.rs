//! 한글 분해, 키 변환, 모드 분할

pub mod keymap;
pub mod segmenter;
pub mod unicode;
