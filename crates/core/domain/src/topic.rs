//! 采集 topic 解析。
//!
//! topic 固定为 5 段：`{ns}/{ns2}/{device_id}/{data_type}/{encoding}`。

/// 按位置拆分后的 topic。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic<'a> {
    pub namespace: &'a str,
    pub sub_namespace: &'a str,
    pub device_id: &'a str,
    pub data_type: &'a str,
    pub encoding: &'a str,
}

impl<'a> Topic<'a> {
    /// 段数必须恰好为 5，否则返回 None。
    pub fn parse(topic: &'a str) -> Option<Self> {
        let parts: Vec<&str> = topic.split('/').collect();
        let [namespace, sub_namespace, device_id, data_type, encoding] = parts[..] else {
            return None;
        };
        Some(Self {
            namespace,
            sub_namespace,
            device_id,
            data_type,
            encoding,
        })
    }
}
