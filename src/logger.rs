use std::time::Instant;

use log::{info, log, warn, Level};
use reqwest::{Method, StatusCode};

/// 요청 타이머
/// 백엔드 호출의 메서드, 경로, 상태 코드, 소요 시간을 로깅합니다.
/// 토큰 값은 절대 로깅하지 않습니다.
pub struct RequestTimer {
    start_time: Instant,
    method: Method,
    path: String,
}

impl RequestTimer {
    pub fn start(method: &Method, path: &str, query: &[(String, String)]) -> Self {
        // 요청 정보 로깅
        info!("Request started: {} {}", method, path);
        if !query.is_empty() {
            let keys = query
                .iter()
                .map(|(k, _)| k.as_str())
                .collect::<Vec<_>>()
                .join(",");
            info!("Query parameters: {}", keys);
        }

        Self {
            start_time: Instant::now(),
            method: method.clone(),
            path: path.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    pub fn finish(self, status: StatusCode) {
        // 응답 정보 로깅 (상태 코드 분류에 따라 레벨 결정)
        log!(
            level_for(status),
            "Request completed: {} {} - Status: {} ({}ms)",
            self.method,
            self.path,
            status.as_u16(),
            self.elapsed_ms()
        );
    }

    pub fn fail(self, reason: &str) {
        warn!(
            "Request failed: {} {} - {} ({}ms)",
            self.method,
            self.path,
            reason,
            self.elapsed_ms()
        );
    }
}

/// 5xx는 error, 4xx는 warn, 나머지는 info
fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Info
    }
}
