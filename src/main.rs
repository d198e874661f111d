//! hantype - 한영 혼합 텍스트를 키 입력 장치용 명령 스트림으로 변환
//!
//! 인자로 받은 텍스트(없으면 표준 입력)를 처리하여, 장치로 보낼 명령과
//! JSON 페이로드를 표준 출력에 한 줄씩 씁니다. 진행 상황은 표준 에러로 출력합니다.
//! `--test`만 주면 연결 테스트 명령 한 줄을 씁니다.

use std::io::{self, Read};
use std::process::ExitCode;

use hantype::config::{load_config, save_config, TypingConfig};
use hantype::transmit::{Scheduler, SendCallbacks, SessionOutcome, WriterTransport};

fn read_input(args: &[String]) -> io::Result<String> {
    if !args.is_empty() {
        return Ok(args.join(" "));
    }
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

fn main() -> ExitCode {
    // 로깅 초기화 (error/warn만 출력)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config();
    let scheduler = Scheduler::new(config);

    if args.len() == 1 && args[0] == "--test" {
        let mut transport = WriterTransport::new(io::stdout().lock());
        return match scheduler.test_connection(&mut transport) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let text = match read_input(&args) {
        Ok(text) => text,
        Err(e) => {
            log::error!("입력 읽기 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let doc = hantype::core::segmenter::process_text_with_limit(
        &text,
        scheduler.config().max_input_chars,
    );
    let estimate = scheduler.estimate(&doc);
    eprintln!(
        "{}자, {}개 청크, 예상 소요 시간 {}",
        doc.char_count(),
        estimate.chunk_count,
        estimate.formatted()
    );

    let mut transport = WriterTransport::new(io::stdout().lock());
    let callbacks = SendCallbacks::new()
        .on_progress(|p| eprintln!("진행: {}/{} ({}%)", p.typed, p.total, p.percentage))
        .on_error(|e| eprintln!("전송 실패: {}", e));

    let result = scheduler.send_document(&doc, &mut transport, callbacks);
    remember_device_speed(&scheduler);

    match result {
        Ok(SessionOutcome::Completed(p)) => {
            eprintln!("완료: {}자", p.typed);
            if p.oversized > 0 {
                eprintln!("MTU 초과 페이로드 {}개", p.oversized);
            }
            ExitCode::SUCCESS
        }
        Ok(SessionOutcome::Aborted(p)) => {
            eprintln!("중단됨: {}/{}자", p.typed, p.total);
            ExitCode::FAILURE
        }
        Err(_) => ExitCode::FAILURE,
    }
}

/// 장치 속도가 바뀌었으면 다음 실행을 위해 설정에 기록
fn remember_device_speed(scheduler: &Scheduler) {
    let device_speed = scheduler.device_speed();
    if device_speed == scheduler.config().device_speed_cps {
        return;
    }
    let config = TypingConfig {
        device_speed_cps: device_speed,
        ..scheduler.config().clone()
    };
    if let Err(e) = save_config(&config) {
        log::warn!("장치 속도 저장 실패: {}", e);
    }
}
