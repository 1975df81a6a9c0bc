use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// The four printable fields of a badge, in stacking order (top to bottom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardField {
    ChineseName,
    EnglishName,
    ChineseCompany,
    EnglishCompany,
}

impl CardField {
    pub const ALL: [CardField; 4] = [
        CardField::ChineseName,
        CardField::EnglishName,
        CardField::ChineseCompany,
        CardField::EnglishCompany,
    ];
}

fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Spreadsheet and browser clients send empty cells as `null` and numeric
/// cells as numbers. Scalars keep their text; anything else is empty.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let id = lenient_text(d)?;
    Ok(if id.trim().is_empty() { new_record_id() } else { id })
}

/// One row of the roster: a single attendee's badge text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    #[serde(default = "new_record_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub chinese_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub english_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub chinese_company: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub english_company: String,
}

impl CardRecord {
    /// A blank record with a fresh id (manual add).
    pub fn blank() -> Self {
        Self {
            id: new_record_id(),
            chinese_name: String::new(),
            english_name: String::new(),
            chinese_company: String::new(),
            english_company: String::new(),
        }
    }

    /// Decodes one submitted record. A value that is not an object at all
    /// becomes a blank record, so it still occupies its page.
    pub fn from_json_lenient(value: Value) -> Self {
        if !value.is_object() {
            warn!("Record payload is not an object; rendering a blank card");
            return Self::blank();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Record payload could not be decoded ({e}); rendering a blank card");
            Self::blank()
        })
    }

    pub fn field(&self, field: CardField) -> &str {
        match field {
            CardField::ChineseName => &self.chinese_name,
            CardField::EnglishName => &self.english_name,
            CardField::ChineseCompany => &self.chinese_company,
            CardField::EnglishCompany => &self.english_company,
        }
    }

    pub fn set_field(&mut self, field: CardField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CardField::ChineseName => self.chinese_name = value,
            CardField::EnglishName => self.english_name = value,
            CardField::ChineseCompany => self.chinese_company = value,
            CardField::EnglishCompany => self.english_company = value,
        }
    }

    pub fn is_blank(&self) -> bool {
        CardField::ALL
            .iter()
            .all(|f| self.field(*f).trim().is_empty())
    }
}

/// Ordered list of records. Order is page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    records: Vec<CardRecord>,
}

impl Roster {
    pub fn new(records: Vec<CardRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CardRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: CardRecord) {
        self.records.push(record);
    }

    /// Edits one field in place. Returns false when no record has `id`.
    pub fn update_field(&mut self, id: &str, field: CardField, value: impl Into<String>) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.set_field(field, value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<CardRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    /// Moves the record at `from` so that it ends up at index `to`.
    /// Out-of-range indices leave the roster untouched and return false.
    pub fn move_record(&mut self, from: usize, to: usize) -> bool {
        if from >= self.records.len() || to >= self.records.len() {
            return false;
        }
        let record = self.records.remove(from);
        self.records.insert(to, record);
        true
    }
}
