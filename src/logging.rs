//! Structured JSON-line logging.
//!
//! One JSON object per line on stdout: `ts`, `module`, then event fields.
//! `LOG_LEVEL` filters; the pure engine types never log, only the binaries
//! and the session driver do.

use chrono::Utc;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("debug") => Level::Debug,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }
}

pub fn ts_now() -> String {
    Utc::now().to_rfc3339()
}

fn emit(level: Level, module: &str, fields: Value) {
    if level < Level::from_env() {
        return;
    }
    let mut out = Map::new();
    out.insert("ts".to_string(), Value::String(ts_now()));
    out.insert("module".to_string(), Value::String(module.to_string()));
    if let Value::Object(map) = fields {
        out.extend(map);
    }
    println!("{}", Value::Object(out));
}

pub fn json_log(module: &str, fields: Value) {
    emit(Level::Info, module, fields);
}

pub fn json_warn(module: &str, fields: Value) {
    emit(Level::Warn, module, fields);
}

pub fn obj(fields: &[(&str, Value)]) -> Value {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key.to_string(), value.clone());
    }
    Value::Object(map)
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
