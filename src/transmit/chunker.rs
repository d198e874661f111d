//! 처리된 문서를 전송 단위(청크)로 분할

use crate::core::segmenter::{LanguageMode, ProcessedDocument};

/// 전송 단위
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0부터 시작하는 순번
    pub index: usize,
    /// 이 청크를 입력할 때 장치가 있어야 하는 모드
    pub mode: LanguageMode,
    /// 전송할 키 시퀀스
    pub text: String,
}

impl Chunk {
    /// 문자 수
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// 문서를 최대 `chunk_size`자의 청크로 분할
///
/// 청크는 모드 경계를 넘지 않습니다. 모드가 바뀌면 크기와 관계없이 끊고,
/// 같은 모드 안에서는 `chunk_size`자마다 끊습니다. 전환 마커는 청크 내용에
/// 포함되지 않습니다.
pub fn split_into_chunks(doc: &ProcessedDocument, chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut current_mode: Option<LanguageMode> = None;

    for (mode, text) in doc.runs() {
        for c in text.chars() {
            let mode_changed = current_mode.is_some_and(|m| m != mode);
            if (mode_changed || current_len >= chunk_size) && current_len > 0 {
                if let Some(prev) = current_mode {
                    chunks.push(Chunk {
                        index: chunks.len(),
                        mode: prev,
                        text: std::mem::take(&mut current),
                    });
                }
                current_len = 0;
            }
            current_mode = Some(mode);
            current.push(c);
            current_len += 1;
        }
    }

    if let (Some(mode), false) = (current_mode, current.is_empty()) {
        chunks.push(Chunk {
            index: chunks.len(),
            mode,
            text: current,
        });
    }

    chunks
}
