//! Spreadsheet header names accepted for each card field.

use crate::models::record::CardField;

const CHINESE_NAME: &[&str] = &["中文名", "Name", "姓名", "中文姓名"];
const ENGLISH_NAME: &[&str] = &["英文名", "English Name", "英文姓名", "Pinyin"];
const CHINESE_COMPANY: &[&str] = &["中文单位", "单位", "公司", "Company"];
const ENGLISH_COMPANY: &[&str] = &["英文单位", "English Company", "Organization"];

pub fn aliases(field: CardField) -> &'static [&'static str] {
    match field {
        CardField::ChineseName => CHINESE_NAME,
        CardField::EnglishName => ENGLISH_NAME,
        CardField::ChineseCompany => CHINESE_COMPANY,
        CardField::EnglishCompany => ENGLISH_COMPANY,
    }
}

/// Header written on export.
pub fn canonical_header(field: CardField) -> &'static str {
    aliases(field)[0]
}

/// Field a header maps to. Surrounding whitespace and ASCII case are ignored.
pub fn field_for_header(header: &str) -> Option<CardField> {
    let header = header.trim();
    CardField::ALL.into_iter().find(|&field| {
        aliases(field)
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(header))
    })
}
