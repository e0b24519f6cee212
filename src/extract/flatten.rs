use crate::extract::{Data, ScrapedData};
use serde::Serialize;
use serde_json::Value;

/// Output names of the bookkeeping fields; user keys with these names are
/// dropped
pub const RESERVED_KEYS: [&str; 5] = [
    "_page_number",
    "_page_url",
    "_group_id",
    "_group_index",
    "_element_index",
];

/// A flattened output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "_page_number")]
    pub page_number: u32,
    #[serde(rename = "_page_url")]
    pub page_url: String,
    #[serde(rename = "_group_id")]
    pub group_id: usize,
    #[serde(rename = "_group_index")]
    pub group_index: usize,
    #[serde(rename = "_element_index")]
    pub element_index: usize,
    #[serde(flatten)]
    pub data: Data,
}

impl Record {
    fn start(item: &ScrapedData) -> Self {
        Self {
            page_number: item.page_number,
            page_url: item.page_url.clone(),
            group_id: item.group_id,
            group_index: item.group_index,
            element_index: item.element_index,
            data: Data::new(),
        }
    }

    fn is_row_of(&self, item: &ScrapedData) -> bool {
        self.page_number == item.page_number
            && self.page_url == item.page_url
            && self.group_index == item.group_index
            && self.group_id == item.group_id
            && self.element_index == item.element_index
    }

    /// Merges user fields; later values overwrite earlier ones
    fn merge(&mut self, data: Data) {
        for (key, value) in data {
            if RESERVED_KEYS.contains(&key.as_str()) {
                tracing::warn!("Dropping field '{}': the name is reserved", key);
                continue;
            }
            self.data.insert(key, value);
        }
    }

    /// All fields as one map, bookkeeping first
    pub fn to_map(&self) -> Data {
        let mut map = Data::new();
        map.insert("_page_number".into(), Value::from(self.page_number));
        map.insert("_page_url".into(), Value::from(self.page_url.clone()));
        map.insert("_group_id".into(), Value::from(self.group_id));
        map.insert("_group_index".into(), Value::from(self.group_index));
        map.insert("_element_index".into(), Value::from(self.element_index));
        for (key, value) in &self.data {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Folds handler results into output rows
///
/// Items are stably sorted by `(page_number, group_index, group_id,
/// element_index)` and merged in one linear pass over runs that share
/// `(page_number, page_url, group_index, group_id, element_index)`. The
/// first item of a run supplies the bookkeeping fields; user fields are
/// last-write-wins in arrival order.
pub fn flatten(mut items: Vec<ScrapedData>) -> Vec<Record> {
    items.sort_by_key(|item| {
        (
            item.page_number,
            item.group_index,
            item.group_id,
            item.element_index,
        )
    });

    let mut records: Vec<Record> = Vec::new();
    for item in items {
        match records.last_mut() {
            Some(record) if record.is_row_of(&item) => record.merge(item.data),
            _ => {
                let mut record = Record::start(&item);
                record.merge(item.data);
                records.push(record);
            }
        }
    }

    records
}
