//! 配置提供者
//!
//! 键值配置来自环境变量中的 JSON (可分片: CAMOU_CONFIG_1, CAMOU_CONFIG_2, ...)，
//! 进程内只解析一次。类型错误只记录诊断并回退默认值，从不中断调用方。

use std::sync::OnceLock;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

/// 分片配置环境变量前缀
const CONFIG_CHUNK_PREFIX: &str = "CAMOU_CONFIG_";
/// 单变量配置 (无分片时回退)
const CONFIG_ENV: &str = "CAMOU_CONFIG";

pub const KEY_MAX_TIME: &str = "humanize:maxTime";
pub const KEY_MIN_TIME: &str = "humanize:minTime";

/// 默认最大点数 (1.5s)
pub const DEFAULT_MAX_POINTS: i32 = 150;
/// 默认最小点数
pub const DEFAULT_MIN_POINTS: i32 = 0;
/// 时长配置上限 (秒)，超出视为非法
pub const MAX_TIME_SECONDS: f64 = 60.0;

/// 按字符串键读取可选类型值
///
/// 只需实现 `value`，类型化读取由默认方法完成。
pub trait ConfigProvider {
    fn value(&self, key: &str) -> Option<&Value>;

    fn get_f64(&self, key: &str) -> Option<f64> {
        let v = self.value(key)?;
        let parsed = v.as_f64();
        if parsed.is_none() {
            warn!("⚠️ 配置项 '{key}' 不是数值: {v}");
        }
        parsed
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        let v = self.value(key)?;
        let parsed = v.as_i64();
        if parsed.is_none() {
            warn!("⚠️ 配置项 '{key}' 不是整数: {v}");
        }
        parsed
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        let v = self.value(key)?;
        let parsed = v.as_bool();
        if parsed.is_none() {
            warn!("⚠️ 配置项 '{key}' 不是布尔值: {v}");
        }
        parsed
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        let v = self.value(key)?;
        let parsed = v.as_str();
        if parsed.is_none() {
            warn!("⚠️ 配置项 '{key}' 不是字符串: {v}");
        }
        parsed
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProvider for &T {
    fn value(&self, key: &str) -> Option<&Value> {
        (**self).value(key)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProvider for std::sync::Arc<T> {
    fn value(&self, key: &str) -> Option<&Value> {
        (**self).value(key)
    }
}

// ================================================================
// MaskConfig: JSON 键值存储
// ================================================================

/// JSON 对象形式的配置
#[derive(Debug, Clone, Default)]
pub struct MaskConfig {
    data: Map<String, Value>,
}

impl MaskConfig {
    /// 空配置 (全部走默认值)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从 JSON 值构造; 非对象视为空配置
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(data) => Self { data },
            other => {
                error!("❌ 配置必须是 JSON 对象, 实际: {other}");
                Self::empty()
            }
        }
    }

    /// 解析 JSON 字符串; 空串或非法 JSON 视为空配置
    pub fn parse(json: &str) -> Self {
        if json.trim().is_empty() {
            return Self::empty();
        }
        match serde_json::from_str::<Value>(json) {
            Ok(v) => Self::from_value(v),
            Err(e) => {
                error!("❌ {CONFIG_ENV} 中的 JSON 非法: {e}");
                Self::empty()
            }
        }
    }

    /// 通过变量查找函数加载
    ///
    /// 先按序拼接 CAMOU_CONFIG_1..N 分片，遇到第一个缺失即停止;
    /// 没有任何分片时回退到 CAMOU_CONFIG。
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut json = String::new();
        let mut index = 1;
        while let Some(chunk) = lookup(&format!("{CONFIG_CHUNK_PREFIX}{index}")) {
            json.push_str(&chunk);
            index += 1;
        }
        if index > 1 {
            debug!("📦 已拼接 {} 个配置分片", index - 1);
        } else if let Some(whole) = lookup(CONFIG_ENV) {
            json = whole;
        }
        Self::parse(&json)
    }

    /// 从进程环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 进程级单例，首次访问时从环境变量加载
    pub fn global() -> &'static MaskConfig {
        static GLOBAL: OnceLock<MaskConfig> = OnceLock::new();
        GLOBAL.get_or_init(Self::from_env)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ConfigProvider for MaskConfig {
    fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

// ================================================================
// 时长参数
// ================================================================

/// 运动时长预算，已换算为点数 (秒 × 100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TimingParams {
    pub min_points: i32,
    pub max_points: i32,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

impl TimingParams {
    /// 读取 humanize:maxTime / humanize:minTime，缺失或类型错误时回退默认值
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        let max_points = config
            .get_f64(KEY_MAX_TIME)
            .and_then(|s| seconds_to_points(KEY_MAX_TIME, s))
            .unwrap_or(DEFAULT_MAX_POINTS);
        let min_points = config
            .get_f64(KEY_MIN_TIME)
            .and_then(|s| seconds_to_points(KEY_MIN_TIME, s))
            .unwrap_or(DEFAULT_MIN_POINTS);
        Self {
            min_points,
            max_points,
        }
    }
}

/// 秒 → 点数; 负数或超过 MAX_TIME_SECONDS 视为非法
fn seconds_to_points(key: &str, seconds: f64) -> Option<i32> {
    if !(0.0..=MAX_TIME_SECONDS).contains(&seconds) {
        warn!("⚠️ 配置项 '{key}' 超出范围 [0, {MAX_TIME_SECONDS}]: {seconds}, 使用默认值");
        return None;
    }
    Some((seconds * 100.0) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_defaults_when_absent() {
        let timing = TimingParams::from_config(&MaskConfig::empty());
        assert_eq!(timing, TimingParams { min_points: 0, max_points: 150 });
    }

    #[test]
    fn test_seconds_scaled_to_points() {
        let cfg = MaskConfig::from_value(json!({
            "humanize:maxTime": 1.0,
            "humanize:minTime": 0.25,
        }));
        let timing = TimingParams::from_config(&cfg);
        assert_eq!(timing.max_points, 100);
        assert_eq!(timing.min_points, 25);
    }

    #[test]
    fn test_integer_accepted_as_double() {
        let cfg = MaskConfig::from_value(json!({ "humanize:maxTime": 2 }));
        assert_eq!(TimingParams::from_config(&cfg).max_points, 200);
    }

    #[test]
    fn test_wrong_type_logs_and_uses_default() {
        let buf = CaptureWriter::default();
        let make = {
            let buf = buf.clone();
            move || buf.clone()
        };
        let subscriber = tracing_subscriber::fmt()
            .with_writer(make)
            .with_ansi(false)
            .finish();

        let cfg = MaskConfig::from_value(json!({ "humanize:maxTime": "fast" }));
        let timing = tracing::subscriber::with_default(subscriber, || {
            TimingParams::from_config(&cfg)
        });

        assert_eq!(timing.max_points, DEFAULT_MAX_POINTS);
        let logged = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("humanize:maxTime"), "log: {logged}");
    }

    #[test]
    fn test_out_of_range_seconds_use_defaults() {
        let cfg = MaskConfig::from_value(json!({
            "humanize:maxTime": 1.0e12,
            "humanize:minTime": -1.0,
        }));
        assert_eq!(TimingParams::from_config(&cfg), TimingParams::default());

        let edge = MaskConfig::from_value(json!({
            "humanize:maxTime": MAX_TIME_SECONDS,
            "humanize:minTime": 0,
        }));
        let timing = TimingParams::from_config(&edge);
        assert_eq!(timing.max_points, 6000);
        assert_eq!(timing.min_points, 0);
    }

    #[test]
    fn test_typed_getters() {
        let cfg = MaskConfig::from_value(json!({
            "humanize": true,
            "name": "x",
            "count": 3,
        }));
        assert_eq!(cfg.get_bool("humanize"), Some(true));
        assert_eq!(cfg.get_str("name"), Some("x"));
        assert_eq!(cfg.get_i64("count"), Some(3));
        assert_eq!(cfg.get_bool("name"), None);
        assert_eq!(cfg.get_f64("missing"), None);
    }

    #[test]
    fn test_chunked_env_concatenated() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CAMOU_CONFIG_1", r#"{"humanize:max"#),
            ("CAMOU_CONFIG_2", r#"Time": 0.5}"#),
            ("CAMOU_CONFIG", r#"{"humanize:maxTime": 9.0}"#),
        ]);
        let cfg = MaskConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.get_f64(KEY_MAX_TIME), Some(0.5));
    }

    #[test]
    fn test_single_env_fallback() {
        let cfg = MaskConfig::from_lookup(|k| {
            (k == "CAMOU_CONFIG").then(|| r#"{"humanize:minTime": 1}"#.to_string())
        });
        assert_eq!(cfg.get_f64(KEY_MIN_TIME), Some(1.0));
    }

    #[test]
    fn test_invalid_json_is_empty() {
        assert!(MaskConfig::parse("{not json").is_empty());
        assert!(MaskConfig::parse("[1, 2]").is_empty());
        assert!(MaskConfig::from_lookup(|_| None).is_empty());
    }
}
